//! Error types for transport operations.

use oddstream_protocol::ErrorCode;
use thiserror::Error;

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection timeout.
    #[error("connection timeout")]
    ConnectTimeout,

    /// Peer closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// Pool poll timed out with no ready connection.
    #[error("poll timeout")]
    PollTimeout,

    /// A frame was not valid JSON or did not match the message model.
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server rejected the authentication request.
    #[error("authentication failed: {error_code:?}")]
    AuthenticationFailed {
        /// Upstream error code from the status reply.
        error_code: Option<ErrorCode>,
        /// Human-readable detail, when supplied.
        message: Option<String>,
    },

    /// The server replied with an unexpected message kind during handshake.
    #[error("unexpected message, expected `{expected}`")]
    UnexpectedMessage {
        /// Expected `op` value.
        expected: &'static str,
    },

    /// Operation attempted on a closed connection.
    #[error("connection is closed")]
    Closed,

    /// The configured host is not a valid TLS server name.
    #[error("invalid server name: {0}")]
    InvalidServerName(#[from] tokio_rustls::rustls::pki_types::InvalidDnsNameError),
}
