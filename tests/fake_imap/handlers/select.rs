//! SELECT and EXAMINE command handler.
//!
//! Opens a folder and responds with the metadata RFC 3501 requires.
//! EXAMINE is the read-only twin of SELECT.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle SELECT (`read_only == false`) or EXAMINE. Returns the opened
/// folder name, or `None` if it does not exist.
pub async fn handle_select<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    folder_name: &str,
    read_only: bool,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> Option<String> {
    let command = if read_only { "EXAMINE" } else { "SELECT" };

    let Some(folder) = mailbox.get_folder(folder_name) else {
        let resp = format!("{tag} NO Folder not found\r\n");
        let _ = write_line(stream, &resp).await;
        return None;
    };

    let _ = write_line(
        stream,
        "* FLAGS (\\Seen \\Answered \\Flagged \\Deleted \\Draft)\r\n",
    )
    .await;
    let _ = write_line(stream, &format!("* {} EXISTS\r\n", folder.messages)).await;
    let _ = write_line(stream, "* 0 RECENT\r\n").await;
    let _ = write_line(stream, "* OK [UIDVALIDITY 1]\r\n").await;
    let _ = write_line(
        stream,
        &format!("* OK [UIDNEXT {}]\r\n", folder.messages + 1),
    )
    .await;

    let access = if read_only { "READ-ONLY" } else { "READ-WRITE" };
    let resp = format!("{tag} OK [{access}] {command} completed\r\n");
    let _ = write_line(stream, &resp).await;
    Some(folder.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(
        folder_name: &str,
        read_only: bool,
        mailbox: &Mailbox,
    ) -> (String, Option<String>) {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        let selected = handle_select("A1", folder_name, read_only, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        (String::from_utf8(buf).unwrap(), selected)
    }

    #[tokio::test]
    async fn examine_is_read_only() {
        let mailbox = MailboxBuilder::new().folder("INBOX", 2).build();

        let (output, selected) = run("INBOX", true, &mailbox).await;

        assert_eq!(selected, Some("INBOX".to_string()));
        assert!(output.contains("* 2 EXISTS"));
        assert!(output.contains("A1 OK [READ-ONLY] EXAMINE completed"));
    }

    #[tokio::test]
    async fn select_is_read_write() {
        let mailbox = MailboxBuilder::new().folder("INBOX", 0).build();
        let (output, _) = run("inbox", false, &mailbox).await;
        assert!(output.contains("A1 OK [READ-WRITE] SELECT completed"));
    }

    #[tokio::test]
    async fn returns_none_for_missing_folder() {
        let mailbox = MailboxBuilder::new().folder("INBOX", 0).build();

        let (output, selected) = run("NoSuchFolder", true, &mailbox).await;

        assert!(selected.is_none());
        assert!(output.contains("A1 NO Folder not found"));
    }
}
