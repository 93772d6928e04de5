//! Error types for imap-connections

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown connection(s): {}", names.join(", "))]
    UnknownConnection { names: Vec<String> },

    #[error("Connection \"{name}\" is not enabled")]
    Disabled { name: String },

    #[error("File \"{}\" exists but it is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Directory \"{}\" does not have enough access permissions", path.display())]
    Permission { path: PathBuf },

    #[error("Attachments directory \"{}\" does not exist", path.display())]
    MissingDirectory { path: PathBuf },

    #[error("Cannot create the attachments directory \"{}\": {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Client construction error: {0}")]
    ClientConstruction(String),

    #[error("Connection \"{name}\" failed: {last_error}")]
    Connection { name: String, last_error: String },

    #[error("Connection \"{name}\" timed out after {}s", after.as_secs_f64())]
    Timeout { name: String, after: Duration },

    #[error("IMAP error: {0}")]
    Imap(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short classification used in batch reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownConnection { .. } => "unknown-connection",
            Self::Disabled { .. } => "disabled",
            Self::NotADirectory { .. }
            | Self::Permission { .. }
            | Self::MissingDirectory { .. }
            | Self::CreateDirectory { .. } => "provisioning",
            Self::ClientConstruction(_) => "client-construction",
            Self::Connection { .. } | Self::Imap(_) | Self::Tls(_) | Self::Io(_) => "connection",
            Self::Timeout { .. } => "timeout",
            Self::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
