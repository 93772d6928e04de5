//! Named mailbox connection with a lazily built client

use crate::attachments::ensure_dir;
use crate::client::{ClientParams, MailboxClient, MailboxClientFactory};
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::imap::ImapClientFactory;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// One configured mailbox connection.
///
/// The client is built on first use and cached. Concurrent callers
/// share one construction: the cache lock is held while the client is
/// built, so the factory runs at most once until [`flush`](Self::flush).
pub struct Connection<F: MailboxClientFactory = ImapClientFactory> {
    config: ConnectionConfig,
    factory: Arc<F>,
    client: Mutex<Option<Arc<F::Client>>>,
}

impl<F: MailboxClientFactory> Connection<F> {
    #[must_use]
    pub fn new(config: ConnectionConfig, factory: Arc<F>) -> Self {
        Self {
            config,
            factory,
            client: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.config.name()
    }

    #[must_use]
    pub fn address(&self) -> &str {
        self.config.address()
    }

    #[must_use]
    pub fn username(&self) -> &str {
        self.config.username()
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Return the cached client, building it first if needed.
    ///
    /// Building checks the attachments directory (creating it if so
    /// configured) before asking the factory for a client.
    ///
    /// # Errors
    ///
    /// - [`Error::Disabled`] if the connection is not enabled.
    /// - A provisioning error if the attachments directory is unusable.
    /// - [`Error::ClientConstruction`] if the factory fails.
    pub async fn materialize_client(&self) -> Result<Arc<F::Client>> {
        if !self.is_enabled() {
            return Err(Error::Disabled {
                name: self.name().to_string(),
            });
        }

        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        if let Some(dir) = self.config.attachments_dir() {
            ensure_dir(
                dir,
                self.config.create_attachments_dir(),
                self.config.dir_permissions(),
            )?;
        }

        debug!("Building client for connection {}", self.name());
        let client = Arc::new(self.factory.construct(ClientParams {
            address: self.config.address(),
            username: self.config.username(),
            password: self.config.password(),
            attachments_dir: self.config.attachments_dir(),
            server_encoding: self.config.server_encoding(),
        })?);

        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Drop the cached client so the next use builds a new one.
    pub async fn flush(&self) {
        if self.client.lock().await.take().is_some() {
            debug!("Flushed client for connection {}", self.name());
        }
    }

    /// Whether a client has been built and not flushed.
    pub async fn is_materialized(&self) -> bool {
        self.client.lock().await.is_some()
    }

    /// Check connectivity, reporting failure as `false`.
    ///
    /// A disabled connection returns `false` without touching the
    /// network. Transport failures also return `false`.
    ///
    /// # Errors
    ///
    /// Provisioning and client construction errors are configuration
    /// problems and are returned as errors.
    pub async fn test_connection(&self) -> Result<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        match self.try_test_connection().await {
            Ok(()) => Ok(true),
            Err(Error::Connection { last_error, .. }) => {
                debug!("Connection {} failed: {}", self.name(), last_error);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Check connectivity, failing on any problem.
    ///
    /// Always opens a fresh stream.
    ///
    /// # Errors
    ///
    /// - [`Error::Disabled`] if the connection is not enabled.
    /// - Any error from [`materialize_client`](Self::materialize_client).
    /// - [`Error::Connection`] carrying the last transport error.
    pub async fn try_test_connection(&self) -> Result<()> {
        let client = self.materialize_client().await?;

        client
            .open_stream(true)
            .await
            .map_err(|e| Error::Connection {
                name: self.name().to_string(),
                last_error: e.to_string(),
            })
    }
}
