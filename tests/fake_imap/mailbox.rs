//! Test data model for the fake IMAP server
//!
//! ```ignore
//! let mailbox = MailboxBuilder::new()
//!     .user("alice", "secret")
//!     .folder("INBOX", 3)
//!     .folder("Archive", 0)
//!     .build();
//! ```
//!
//! The server accepts LOGIN only for the configured users and opens
//! only the configured folders.

/// Server-side state: accounts and folders.
#[derive(Debug, Clone)]
pub struct Mailbox {
    pub users: Vec<Account>,
    pub folders: Vec<Folder>,
}

impl Mailbox {
    /// Look up a folder by name (case-sensitive, except INBOX).
    pub fn get_folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| {
            f.name == name || (f.name == "INBOX" && name.eq_ignore_ascii_case("inbox"))
        })
    }

    /// Whether `username`/`password` names a configured account.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.users
            .iter()
            .any(|a| a.username == username && a.password == password)
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub password: String,
}

/// A folder and how many messages it claims to hold.
#[derive(Debug, Clone)]
pub struct Folder {
    pub name: String,
    pub messages: u32,
}

pub struct MailboxBuilder {
    users: Vec<Account>,
    folders: Vec<Folder>,
}

impl MailboxBuilder {
    pub fn new() -> Self {
        Self {
            users: Vec::new(),
            folders: Vec::new(),
        }
    }

    /// Accept LOGIN with these credentials.
    pub fn user(mut self, username: &str, password: &str) -> Self {
        self.users.push(Account {
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    /// Add a folder holding `messages` messages.
    pub fn folder(mut self, name: &str, messages: u32) -> Self {
        self.folders.push(Folder {
            name: name.to_string(),
            messages,
        });
        self
    }

    pub fn build(self) -> Mailbox {
        Mailbox {
            users: self.users,
            folders: self.folders,
        }
    }
}
