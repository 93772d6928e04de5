//! IMAP implementation of the mailbox client seams
//!
//! Opens sessions over plaintext, STARTTLS, or implicit TLS depending
//! on the flags in the mailbox path, logs in, and EXAMINEs the
//! configured folder.

use crate::address::{MailboxAddress, Security};
use crate::client::{ClientParams, MailboxClient, MailboxClientFactory};
use crate::error::{Error, Result};
use async_imap::Session;
use rustls::pki_types::ServerName;
use secrecy::{ExposeSecret, SecretString};
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info};

/// An IMAP session over either transport.
pub type ImapSession = Session<Compat<MailStream>>;

/// Transport under an IMAP session.
#[derive(Debug)]
pub enum MailStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for MailStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MailStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Builds [`ImapClient`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImapClientFactory;

impl MailboxClientFactory for ImapClientFactory {
    type Client = ImapClient;

    fn construct(&self, params: ClientParams<'_>) -> Result<ImapClient> {
        let address: MailboxAddress = params.address.parse()?;

        let encoding = params.server_encoding.trim();
        let valid_encoding = !encoding.is_empty()
            && encoding
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
        if !valid_encoding {
            return Err(Error::ClientConstruction(format!(
                "Unsupported server encoding \"{}\"",
                params.server_encoding
            )));
        }

        Ok(ImapClient {
            address,
            username: params.username.to_string(),
            password: SecretString::from(params.password.expose_secret().to_owned()),
            server_encoding: encoding.to_ascii_uppercase(),
            attachments_dir: params.attachments_dir.map(Path::to_path_buf),
            session: Mutex::new(None),
        })
    }
}

/// IMAP client for one mailbox.
///
/// Holds at most one live session. Building the client does not
/// connect; [`MailboxClient::open_stream`] does.
pub struct ImapClient {
    address: MailboxAddress,
    username: String,
    password: SecretString,
    server_encoding: String,
    attachments_dir: Option<PathBuf>,
    session: Mutex<Option<ImapSession>>,
}

impl ImapClient {
    #[must_use]
    pub const fn address(&self) -> &MailboxAddress {
        &self.address
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Charset used for server-side searches.
    #[must_use]
    pub fn server_encoding(&self) -> &str {
        &self.server_encoding
    }

    #[must_use]
    pub fn attachments_dir(&self) -> Option<&Path> {
        self.attachments_dir.as_deref()
    }

    fn tls_connector(&self) -> Result<TlsConnector> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::Tls(e.to_string()))?;

        let config = if self.address.validate_cert() {
            let roots = rustls::RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
            };
            builder.with_root_certificates(roots).with_no_client_auth()
        } else {
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(DangerousVerifier))
                .with_no_client_auth()
        };
        Ok(TlsConnector::from(Arc::new(config)))
    }

    async fn handshake(&self, tcp: TcpStream) -> Result<TlsStream<TcpStream>> {
        let connector = self.tls_connector()?;
        let server_name = server_name(self.address.host())?;

        connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| Error::Tls(e.to_string()))
    }

    async fn connect(&self) -> Result<ImapSession> {
        let addr = self.address.endpoint();
        debug!("Connecting to IMAP server at {}", addr);

        let tcp_stream = TcpStream::connect(&addr).await?;

        let stream = match self.address.security() {
            Security::Plain => MailStream::Plain(tcp_stream),
            Security::Tls => MailStream::Tls(Box::new(self.handshake(tcp_stream).await?)),
            Security::StartTls => {
                let mut client = async_imap::Client::new(tcp_stream.compat());
                client
                    .run_command_and_check_ok("STARTTLS", None)
                    .await
                    .map_err(|e| Error::Tls(format!("STARTTLS failed: {e}")))?;

                let inner = client.into_inner().into_inner();
                MailStream::Tls(Box::new(self.handshake(inner).await?))
            }
        };

        let client = async_imap::Client::new(stream.compat());
        let mut session = client
            .login(&self.username, self.password.expose_secret())
            .await
            .map_err(|(e, _)| Error::Imap(format!("Login failed: {e}")))?;

        let folder = self.address.folder();
        if !folder.is_empty() {
            session
                .examine(folder)
                .await
                .map_err(|e| Error::Imap(format!("Failed to open {folder}: {e}")))?;
        }

        info!("Connected to IMAP server at {}", addr);
        Ok(session)
    }
}

/// TLS server name for a host: IP literals verify against IP SANs,
/// anything else must be a DNS name.
fn server_name(host: &str) -> Result<ServerName<'static>> {
    match host.parse::<IpAddr>() {
        Ok(ip) => Ok(ServerName::IpAddress(ip.into())),
        Err(_) => ServerName::try_from(host.to_string())
            .map_err(|e| Error::Tls(format!("Invalid server name: {e}"))),
    }
}

impl MailboxClient for ImapClient {
    async fn open_stream(&self, force_fresh: bool) -> Result<()> {
        let mut slot = self.session.lock().await;

        if let Some(mut session) = slot.take() {
            if !force_fresh && session.noop().await.is_ok() {
                *slot = Some(session);
                return Ok(());
            }
            session.logout().await.ok();
        }

        *slot = Some(self.connect().await?);
        Ok(())
    }
}

/// Certificate verifier that accepts all certificates
/// (for `/novalidate-cert` mailbox paths).
#[derive(Debug)]
struct DangerousVerifier;

impl rustls::client::danger::ServerCertVerifier for DangerousVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
