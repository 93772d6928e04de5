//! LOGIN command handler.
//!
//! Credentials arrive as two astrings (atoms or quoted strings). The
//! handler checks them against the configured accounts.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Split the arguments of a command into astrings, unquoting and
/// unescaping quoted strings.
fn parse_astrings(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = args.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut s = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            s.push(escaped);
                        }
                    }
                    '"' => break,
                    other => s.push(other),
                }
            }
            out.push(s);
        } else {
            let mut s = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                s.push(c);
                chars.next();
            }
            out.push(s);
        }
    }

    out
}

/// Handle the LOGIN command. `line` is the full command line.
///
/// Returns whether the client authenticated.
pub async fn handle_login<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    line: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> bool {
    // "<tag> LOGIN <user> <pass>"
    let args = line.splitn(3, ' ').nth(2).unwrap_or_default();
    let creds = parse_astrings(args);

    let ok = creds.len() == 2 && mailbox.authenticate(&creds[0], &creds[1]);
    let resp = if ok {
        format!("{tag} OK LOGIN completed\r\n")
    } else {
        format!("{tag} NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
    };
    let _ = write_line(stream, &resp).await;
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(tag: &str, line: &str) -> (String, bool) {
        let mailbox = MailboxBuilder::new().user("testuser", "test pass").build();
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);

        let ok = handle_login(tag, line, &mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        (String::from_utf8(buf).unwrap(), ok)
    }

    #[tokio::test]
    async fn accepts_known_credentials() {
        let (output, ok) = run("A0001", "A0001 LOGIN \"testuser\" \"test pass\"").await;
        assert!(ok);
        assert_eq!(output, "A0001 OK LOGIN completed\r\n");
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let (output, ok) = run("A0001", "A0001 LOGIN testuser wrong").await;
        assert!(!ok);
        assert!(output.starts_with("A0001 NO [AUTHENTICATIONFAILED]"));
    }

    #[test]
    fn unescapes_quoted_strings() {
        assert_eq!(
            parse_astrings(r#""a\"b" plain "c\\d""#),
            vec!["a\"b", "plain", "c\\d"]
        );
    }
}
