//! Housekeeping commands: CAPABILITY, NOOP, LOGOUT.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Folder;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle CAPABILITY. STARTTLS is only offered before the upgrade.
pub async fn handle_capability<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    offer_starttls: bool,
    stream: &mut BufReader<S>,
) {
    let caps = if offer_starttls {
        "* CAPABILITY IMAP4rev1 STARTTLS\r\n"
    } else {
        "* CAPABILITY IMAP4rev1\r\n"
    };
    let _ = write_line(stream, caps).await;
    let _ = write_line(stream, &format!("{tag} OK CAPABILITY completed\r\n")).await;
}

/// Handle NOOP, reporting the message count of the open folder.
pub async fn handle_noop<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    open: Option<&Folder>,
    stream: &mut BufReader<S>,
) {
    if let Some(folder) = open {
        let _ = write_line(stream, &format!("* {} EXISTS\r\n", folder.messages)).await;
    }
    let _ = write_line(stream, &format!("{tag} OK NOOP completed\r\n")).await;
}

/// Handle LOGOUT: untagged BYE, then the tagged OK.
pub async fn handle_logout<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    stream: &mut BufReader<S>,
) {
    let _ = write_line(stream, "* BYE Logging out\r\n").await;
    let _ = write_line(stream, &format!("{tag} OK LOGOUT completed\r\n")).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, BufReader, DuplexStream};

    async fn output(client: DuplexStream) -> String {
        let mut buf = Vec::new();
        BufReader::new(client).read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn capability_offers_starttls_before_upgrade() {
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);
        handle_capability("A1", true, &mut stream).await;
        drop(stream);

        let out = output(client).await;
        assert!(out.contains("STARTTLS"));
        assert!(out.contains("A1 OK CAPABILITY completed"));
    }

    #[tokio::test]
    async fn capability_hides_starttls_after_upgrade() {
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);
        handle_capability("A1", false, &mut stream).await;
        drop(stream);

        assert!(!output(client).await.contains("STARTTLS"));
    }

    #[tokio::test]
    async fn noop_reports_open_folder() {
        let folder = Folder {
            name: "INBOX".to_string(),
            messages: 4,
        };
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);
        handle_noop("A2", Some(&folder), &mut stream).await;
        drop(stream);

        assert_eq!(output(client).await, "* 4 EXISTS\r\nA2 OK NOOP completed\r\n");
    }

    #[tokio::test]
    async fn logout_sends_bye_first() {
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);
        handle_logout("X1", &mut stream).await;
        drop(stream);

        let out = output(client).await;
        assert!(out.find("* BYE").unwrap() < out.find("X1 OK").unwrap());
    }
}
