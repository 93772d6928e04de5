//! Mailbox client seams
//!
//! A [`Connection`](crate::Connection) never talks to a server
//! directly. It asks a [`MailboxClientFactory`] for a client and asks
//! that client to open its stream.

use crate::error::Result;
use secrecy::SecretString;
use std::future::Future;
use std::path::Path;

/// Everything a factory needs to build a client.
#[derive(Debug, Clone, Copy)]
pub struct ClientParams<'a> {
    pub address: &'a str,
    pub username: &'a str,
    pub password: &'a SecretString,
    pub attachments_dir: Option<&'a Path>,
    pub server_encoding: &'a str,
}

/// Builds mailbox clients from connection parameters.
///
/// Construction must not touch the network; connecting is the job of
/// [`MailboxClient::open_stream`].
pub trait MailboxClientFactory: Send + Sync {
    type Client: MailboxClient;

    /// Build a client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientConstruction`](crate::Error::ClientConstruction)
    /// if the parameters cannot describe a working client.
    fn construct(&self, params: ClientParams<'_>) -> Result<Self::Client>;
}

/// A client able to open a stream to its mailbox.
pub trait MailboxClient: Send + Sync + 'static {
    /// Open (or with `force_fresh == false`, possibly reuse) the
    /// stream to the mailbox.
    ///
    /// Errors describe the transport failure; the caller decides
    /// whether to surface them.
    fn open_stream(&self, force_fresh: bool) -> impl Future<Output = Result<()>> + Send;
}
