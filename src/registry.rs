//! Registry of named connections
//!
//! Built once at startup from configuration and never changed
//! afterwards. Registration order is preserved.

use crate::client::MailboxClientFactory;
use crate::config::{ConnectionConfig, Settings};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::imap::ImapClientFactory;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

pub struct ConnectionRegistry<F: MailboxClientFactory = ImapClientFactory> {
    connections: Vec<Connection<F>>,
    index: HashMap<String, usize>,
}

impl ConnectionRegistry<ImapClientFactory> {
    /// Build an IMAP-backed registry from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on empty or duplicate names.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        Self::new(settings.connections, Arc::new(ImapClientFactory))
    }
}

impl<F: MailboxClientFactory> ConnectionRegistry<F> {
    /// Register one connection per config, sharing `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a name is empty or repeated.
    pub fn new(configs: Vec<ConnectionConfig>, factory: Arc<F>) -> Result<Self> {
        let mut connections = Vec::with_capacity(configs.len());
        let mut index = HashMap::with_capacity(configs.len());

        for config in configs {
            let name = config.name().to_string();
            if name.is_empty() {
                return Err(Error::Config("Connection name cannot be empty".into()));
            }
            if index.insert(name.clone(), connections.len()).is_some() {
                return Err(Error::Config(format!(
                    "Connection \"{name}\" is defined more than once"
                )));
            }
            debug!("Registered connection {}", name);
            connections.push(Connection::new(config, Arc::clone(&factory)));
        }

        Ok(Self { connections, index })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.iter().map(Connection::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection<F>> {
        self.connections.iter()
    }

    /// Look up one connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownConnection`] if `name` is not registered.
    pub fn get(&self, name: &str) -> Result<&Connection<F>> {
        self.index
            .get(name)
            .map(|&i| &self.connections[i])
            .ok_or_else(|| Error::UnknownConnection {
                names: vec![name.to_string()],
            })
    }

    /// Select connections by name.
    ///
    /// An empty request selects every connection in registration
    /// order. Otherwise the result follows the requested order
    /// (repeated names appear once). If any requested name is unknown
    /// nothing is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownConnection`] listing every unknown name.
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> Result<Vec<&Connection<F>>> {
        if requested.is_empty() {
            return Ok(self.connections.iter().collect());
        }

        let mut seen = HashSet::new();
        let mut selected = Vec::with_capacity(requested.len());
        let mut missing = Vec::new();

        for name in requested {
            let name = name.as_ref();
            if !seen.insert(name) {
                continue;
            }
            match self.index.get(name) {
                Some(&i) => selected.push(&self.connections[i]),
                None => missing.push(name.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(selected)
        } else {
            Err(Error::UnknownConnection { names: missing })
        }
    }

    /// The cached client for `name`, built on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownConnection`] or any error from
    /// [`Connection::materialize_client`].
    pub async fn client(&self, name: &str) -> Result<Arc<F::Client>> {
        self.get(name)?.materialize_client().await
    }

    /// Discard the cached client for `name` and build a new one.
    ///
    /// # Errors
    ///
    /// Same as [`client`](Self::client).
    pub async fn fresh_client(&self, name: &str) -> Result<Arc<F::Client>> {
        let connection = self.get(name)?;
        connection.flush().await;
        connection.materialize_client().await
    }

    /// Build clients for every enabled connection, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first connection whose client cannot be built.
    pub async fn materialize_all(&self) -> Result<Vec<(&str, Arc<F::Client>)>> {
        let mut clients = Vec::with_capacity(self.connections.len());
        for connection in self.connections.iter().filter(|c| c.is_enabled()) {
            clients.push((connection.name(), connection.materialize_client().await?));
        }
        Ok(clients)
    }
}
