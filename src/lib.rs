//! Named IMAP connection registry
//!
//! Keeps a fixed set of named mailbox connections loaded at startup.
//! Each [`Connection`] builds its client lazily (checking its
//! attachments directory first) and caches it. A
//! [`ConnectionValidator`] health-checks a selection of connections and
//! aggregates the results into a [`BatchReport`] whose outcome maps to
//! a process exit status.

mod address;
mod attachments;
mod client;
mod config;
mod connection;
mod error;
mod imap;
mod registry;
mod validator;

pub use address::{IMAP_PORT, IMAPS_PORT, MailboxAddress, Security};
pub use attachments::ensure_dir;
pub use client::{ClientParams, MailboxClient, MailboxClientFactory};
pub use config::{
    ConnectionConfig, DEFAULT_DIR_PERMISSIONS, DEFAULT_SERVER_ENCODING, PermissionBits, Settings,
};
pub use connection::Connection;
pub use error::{Error, Result};
pub use imap::{ImapClient, ImapClientFactory, ImapSession, MailStream};
pub use registry::ConnectionRegistry;
pub use validator::{
    BatchReport, ConnectionValidator, FailureReason, Outcome, OverallOutcome, ValidationResult,
};
