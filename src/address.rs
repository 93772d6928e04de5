//! Mailbox path parsing
//!
//! Connections are configured with c-client style mailbox paths:
//!
//! ```text
//! {imap.example.com:993/imap/ssl/novalidate-cert}INBOX
//!  ^host             ^port ^flags                 ^folder
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

/// Port used for plaintext and STARTTLS connections.
pub const IMAP_PORT: u16 = 143;

/// Port used for implicit TLS connections.
pub const IMAPS_PORT: u16 = 993;

/// How the transport is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// TLS from the first byte (`/ssl`).
    Tls,
    /// Plaintext greeting upgraded with STARTTLS (`/tls`, the default).
    StartTls,
    /// No encryption at all (`/notls`).
    Plain,
}

/// A parsed mailbox path.
///
/// # Examples
///
/// ```
/// use imap_connections::{MailboxAddress, Security};
///
/// let addr: MailboxAddress = "{imap.gmail.com:993/imap/ssl}INBOX".parse().unwrap();
/// assert_eq!(addr.host(), "imap.gmail.com");
/// assert_eq!(addr.port(), 993);
/// assert_eq!(addr.security(), Security::Tls);
/// assert_eq!(addr.folder(), "INBOX");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxAddress {
    host: String,
    port: u16,
    security: Security,
    validate_cert: bool,
    folder: String,
}

impl MailboxAddress {
    /// Host name or IP address, without brackets.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// `host:port` for connecting, with IPv6 literals bracketed.
    #[must_use]
    pub fn endpoint(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub const fn security(&self) -> Security {
        self.security
    }

    /// Whether the server certificate is checked against the web PKI.
    #[must_use]
    pub const fn validate_cert(&self) -> bool {
        self.validate_cert
    }

    /// The folder opened after login. Empty means none.
    #[must_use]
    pub fn folder(&self) -> &str {
        &self.folder
    }
}

impl FromStr for MailboxAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |why: &str| {
            Error::ClientConstruction(format!("Invalid mailbox path \"{s}\": {why}"))
        };

        let rest = s
            .trim()
            .strip_prefix('{')
            .ok_or_else(|| invalid("missing '{'"))?;
        let (server, folder) = rest
            .split_once('}')
            .ok_or_else(|| invalid("missing '}'"))?;

        let mut parts = server.split('/');
        let endpoint = parts.next().unwrap_or_default();

        let mut security = Security::StartTls;
        let mut validate_cert = true;
        for flag in parts {
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);
            match name.to_ascii_lowercase().as_str() {
                "imap" | "imap4" | "imap4rev1" | "readonly" | "secure" | "norsh" | "debug"
                | "user" | "authuser" | "service" => {}
                "ssl" => security = Security::Tls,
                "tls" => security = Security::StartTls,
                "notls" => security = Security::Plain,
                "novalidate-cert" => validate_cert = false,
                "validate-cert" => validate_cert = true,
                "pop3" | "nntp" => return Err(invalid("only IMAP is supported")),
                _ => return Err(invalid(&format!("unknown flag /{flag}"))),
            }
        }

        // IPv6 literals are bracketed: `[::1]` or `[::1]:993`.
        let (host, port) = if let Some(bracketed) = endpoint.strip_prefix('[') {
            let (ip, after) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("missing ']'"))?;
            let ip: Ipv6Addr = ip
                .parse()
                .map_err(|e| invalid(&format!("bad IPv6 address: {e}")))?;
            let port = match after {
                "" => None,
                after => Some(
                    after
                        .strip_prefix(':')
                        .ok_or_else(|| invalid("expected ':' after ']'"))?,
                ),
            };
            (ip.to_string(), port)
        } else {
            match endpoint.rsplit_once(':') {
                Some((host, port)) => (host.to_string(), Some(port)),
                None => (endpoint.to_string(), None),
            }
        };

        let port = match port {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| invalid(&format!("bad port: {e}")))?,
            None if security == Security::Tls => IMAPS_PORT,
            None => IMAP_PORT,
        };

        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        Ok(Self {
            host,
            port,
            security,
            validate_cert,
            folder: folder.to_string(),
        })
    }
}

impl fmt::Display for MailboxAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}", self.endpoint())?;
        match self.security {
            Security::Tls => f.write_str("/ssl")?,
            Security::StartTls => {}
            Security::Plain => f.write_str("/notls")?,
        }
        if !self.validate_cert {
            f.write_str("/novalidate-cert")?;
        }
        write!(f, "}}{}", self.folder)
    }
}
