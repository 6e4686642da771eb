//! Error types for client operations.

use oddstream_protocol::ErrorCode;
use thiserror::Error;

/// Error type for client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure.
    #[error(transparent)]
    Transport(#[from] oddstream_transport::TransportError),

    /// Cache rejected a change message.
    #[error(transparent)]
    Cache(#[from] oddstream_cache::CacheError),

    /// A frame was not valid JSON or did not match the message model.
    #[error("malformed frame: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server rejected a subscription request.
    #[error("subscription rejected: {error_code:?}")]
    SubscriptionRejected {
        /// Upstream error code from the status reply.
        error_code: Option<ErrorCode>,
        /// Human-readable detail, when supplied.
        message: Option<String>,
    },

    /// The session provider could not supply a token.
    #[error("session provider failed: {0}")]
    Session(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The order snapshot provider could not supply current orders.
    #[error("order snapshot failed: {0}")]
    Snapshot(#[source] Box<dyn std::error::Error + Send + Sync>),
}
