//! TLS/TCP dialing.
//!
//! The feed endpoint only accepts TLS, so the connector owns the full dial
//! path: resolve and connect with a timeout, disable Nagle, wrap in TLS
//! against the webpki root store, then run the connection announcement read.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use crate::connection::Connection;
use crate::error::TransportError;

/// TLS stream over TCP, as produced by [`connect_tls`].
pub type TlsStream = tokio_rustls::client::TlsStream<TcpStream>;

/// Configuration for dialing the stream endpoint.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Stream endpoint hostname.
    pub host: String,
    /// Stream endpoint port.
    pub port: u16,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Whether to disable Nagle's algorithm.
    pub tcp_nodelay: bool,
}

impl ConnectorConfig {
    /// Creates a configuration for the given endpoint with default timeouts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(10),
            tcp_nodelay: true,
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to disable Nagle's algorithm.
    #[must_use]
    pub fn with_tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.tcp_nodelay = nodelay;
        self
    }
}

fn tls_connector() -> TlsConnector {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

/// Dials the endpoint over TLS and establishes a [`Connection`].
///
/// # Errors
/// Returns `TransportError::ConnectTimeout` if the TCP dial does not complete
/// in time, `InvalidServerName` for a host that is not a valid TLS name, and
/// `Io` for TLS or socket failures.
pub async fn connect_tls(config: &ConnectorConfig) -> Result<Connection<TlsStream>, TransportError> {
    let addr = (config.host.as_str(), config.port);

    let tcp = tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| TransportError::ConnectTimeout)??;

    if config.tcp_nodelay {
        tcp.set_nodelay(true)?;
    }

    let server_name = ServerName::try_from(config.host.clone())?;
    let tls = tls_connector().connect(server_name, tcp).await?;

    tracing::debug!(host = %config.host, port = config.port, "TLS established");

    Connection::establish(tls).await
}
