//! Connection configuration
//!
//! [`ConnectionConfig`] is the immutable description of one named
//! mailbox connection. [`Settings`] loads an ordered list of them from
//! a TOML file.

use crate::error::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::debug;

/// Default server encoding handed to the mailbox client.
pub const DEFAULT_SERVER_ENCODING: &str = "UTF-8";

/// Default permissions for created attachment directories, written the
/// way they appear in configuration.
pub const DEFAULT_DIR_PERMISSIONS: u32 = 770;

/// Directory permission bits written as decimal digits.
///
/// Configuration files carry permissions the way people type them for
/// `chmod`: the integer `770` means mode `0o770`. The digits of the
/// decimal value are read back as octal digits; the value is never
/// converted numerically. `370` therefore becomes `0o370`, not
/// `0o562` (which is what decimal 370 is in octal).
///
/// # Examples
///
/// ```
/// use imap_connections::PermissionBits;
///
/// let bits = PermissionBits::new(770).unwrap();
/// assert_eq!(bits.mode(), 0o770);
///
/// let bits = PermissionBits::new(370).unwrap();
/// assert_eq!(bits.mode(), 0o370);
///
/// // 8 and 9 are not octal digits.
/// assert!(PermissionBits::new(780).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionBits {
    decimal: u32,
    mode: u32,
}

impl PermissionBits {
    /// Reinterpret the decimal digits of `decimal` as an octal mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any digit is `8` or `9`, or if the
    /// value has more than four digits.
    pub fn new(decimal: u32) -> Result<Self> {
        let digits = decimal.to_string();
        if digits.len() > 4 {
            return Err(Error::Config(format!(
                "Directory permissions {decimal} have more than four digits"
            )));
        }
        let mode = u32::from_str_radix(&digits, 8).map_err(|_| {
            Error::Config(format!(
                "Directory permissions {decimal} contain a non-octal digit"
            ))
        })?;
        Ok(Self { decimal, mode })
    }

    /// The value as written in configuration (e.g. `770`).
    #[must_use]
    pub const fn as_decimal(self) -> u32 {
        self.decimal
    }

    /// The octal mode (e.g. `0o770`).
    #[must_use]
    pub const fn mode(self) -> u32 {
        self.mode
    }
}

impl Default for PermissionBits {
    fn default() -> Self {
        Self {
            decimal: DEFAULT_DIR_PERMISSIONS,
            mode: 0o770,
        }
    }
}

impl fmt::Display for PermissionBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.mode)
    }
}

/// Configuration of one named mailbox connection.
///
/// The password is kept in a [`SecretString`] so `Debug` output never
/// shows it.
#[derive(Debug)]
pub struct ConnectionConfig {
    name: String,
    address: String,
    username: String,
    password: SecretString,
    server_encoding: String,
    attachments_dir: Option<PathBuf>,
    create_attachments_dir: bool,
    dir_permissions: PermissionBits,
    enabled: bool,
}

impl ConnectionConfig {
    /// Create a configuration with default encoding, no attachments
    /// directory, and the connection enabled.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            server_encoding: DEFAULT_SERVER_ENCODING.to_string(),
            attachments_dir: None,
            create_attachments_dir: true,
            dir_permissions: PermissionBits::default(),
            enabled: true,
        }
    }

    #[must_use]
    pub fn with_server_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.server_encoding = encoding.into();
        self
    }

    /// Store attachments under `dir`. An empty path disables
    /// provisioning.
    #[must_use]
    pub fn with_attachments_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.attachments_dir = (!dir.as_os_str().is_empty()).then_some(dir);
        self
    }

    #[must_use]
    pub const fn with_create_attachments_dir(mut self, create: bool) -> Self {
        self.create_attachments_dir = create;
        self
    }

    #[must_use]
    pub const fn with_dir_permissions(mut self, bits: PermissionBits) -> Self {
        self.dir_permissions = bits;
        self
    }

    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mailbox path, e.g. `{imap.example.com:993/ssl}INBOX`.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }

    #[must_use]
    pub fn server_encoding(&self) -> &str {
        &self.server_encoding
    }

    #[must_use]
    pub fn attachments_dir(&self) -> Option<&Path> {
        self.attachments_dir.as_deref()
    }

    #[must_use]
    pub const fn create_attachments_dir(&self) -> bool {
        self.create_attachments_dir
    }

    #[must_use]
    pub const fn dir_permissions(&self) -> PermissionBits {
        self.dir_permissions
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// One `[[connections]]` table as written in the settings file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConnectionEntry {
    name: String,
    mailbox: String,
    username: String,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    password_env: Option<String>,
    #[serde(default = "default_encoding")]
    server_encoding: String,
    #[serde(default)]
    attachments_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    create_attachments_dir_if_not_exists: bool,
    #[serde(default = "default_permissions")]
    created_attachments_dir_permissions: u32,
    #[serde(default = "default_true")]
    enabled: bool,
}

fn default_encoding() -> String {
    DEFAULT_SERVER_ENCODING.to_string()
}

const fn default_permissions() -> u32 {
    DEFAULT_DIR_PERMISSIONS
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    connections: Vec<ConnectionEntry>,
}

impl ConnectionEntry {
    fn into_config(self) -> Result<ConnectionConfig> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Config("Connection name cannot be empty".into()));
        }
        if self.mailbox.trim().is_empty() {
            return Err(Error::Config(format!(
                "Connection \"{name}\": mailbox cannot be empty"
            )));
        }
        if self.username.trim().is_empty() {
            return Err(Error::Config(format!(
                "Connection \"{name}\": username cannot be empty"
            )));
        }
        if self.server_encoding.trim().is_empty() {
            return Err(Error::Config(format!(
                "Connection \"{name}\": server_encoding cannot be empty"
            )));
        }

        let password = match (self.password, self.password_env) {
            (Some(_), Some(_)) => {
                return Err(Error::Config(format!(
                    "Connection \"{name}\": set either password or password_env, not both"
                )));
            }
            (Some(password), None) => password,
            (None, Some(var)) => env::var(&var).map_err(|_| {
                Error::Config(format!("Connection \"{name}\": {var} not set"))
            })?,
            (None, None) => {
                return Err(Error::Config(format!(
                    "Connection \"{name}\": password is required"
                )));
            }
        };

        let bits =
            PermissionBits::new(self.created_attachments_dir_permissions).map_err(|e| match e {
                Error::Config(msg) => Error::Config(format!("Connection \"{name}\": {msg}")),
                other => other,
            })?;

        let mut config = ConnectionConfig::new(name, self.mailbox, self.username, password)
            .with_server_encoding(self.server_encoding)
            .with_create_attachments_dir(self.create_attachments_dir_if_not_exists)
            .with_dir_permissions(bits)
            .with_enabled(self.enabled);
        if let Some(dir) = self.attachments_dir {
            config = config.with_attachments_dir(dir);
        }
        Ok(config)
    }
}

/// Connection settings loaded at startup.
#[derive(Debug)]
pub struct Settings {
    pub connections: Vec<ConnectionConfig>,
}

impl Settings {
    /// Parse settings from a TOML document.
    ///
    /// ```
    /// use imap_connections::Settings;
    ///
    /// let settings = Settings::from_toml_str(r#"
    ///     [[connections]]
    ///     name = "support"
    ///     mailbox = "{imap.example.com:993/ssl}INBOX"
    ///     username = "support@example.com"
    ///     password = "secret"
    /// "#).unwrap();
    ///
    /// assert_eq!(settings.connections[0].name(), "support");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is malformed, lists no
    /// connections, repeats a name, or fails a field check.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: SettingsFile =
            toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid settings: {e}")))?;

        if file.connections.is_empty() {
            return Err(Error::Config(
                "At least one connection must be configured".into(),
            ));
        }

        let mut seen = HashSet::new();
        let mut connections = Vec::with_capacity(file.connections.len());
        for entry in file.connections {
            let config = entry.into_config()?;
            if !seen.insert(config.name().to_string()) {
                return Err(Error::Config(format!(
                    "Connection \"{}\" is defined more than once",
                    config.name()
                )));
            }
            connections.push(config);
        }

        Ok(Self { connections })
    }

    /// Read settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading connection settings from {}", path.display());
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Load settings from the file named by the environment.
    ///
    /// Reads from `.env` file if present. Optional variables:
    /// - `IMAP_CONFIG` (default: `imap.toml`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = env::var("IMAP_CONFIG").unwrap_or_else(|_| "imap.toml".to_string());
        Self::from_file(Path::new(&path))
    }
}
