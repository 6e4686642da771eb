//! Authentication material and the snapshot API seam.
//!
//! The stream needs a session token and an application key at connect time,
//! and the order cache needs the current-orders snapshot to cover bets
//! placed before the stream opened. Both come from outside this crate (a
//! login flow, an HTTP API client), so they are traits here; the trivial
//! static-token case is covered by [`Credentials`].

use async_trait::async_trait;

use oddstream_protocol::CurrentOrderSummary;

use crate::error::ClientError;

/// Supplies the session token and application key used to authenticate.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns a session token valid for a new connection.
    async fn session_token(&self) -> Result<String, ClientError>;

    /// Returns the application key.
    fn app_key(&self) -> &str;
}

/// Supplies the current-orders snapshot used to bootstrap the order cache.
#[async_trait]
pub trait OrderSnapshotProvider: Send + Sync {
    /// Returns every currently tracked order on the account.
    async fn current_orders(&self) -> Result<Vec<CurrentOrderSummary>, ClientError>;
}

/// A fixed application key and pre-fetched session token.
#[derive(Debug, Clone)]
pub struct Credentials {
    app_key: String,
    session_token: String,
}

impl Credentials {
    /// Creates credentials from an application key and session token.
    #[must_use]
    pub fn new(app_key: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            session_token: session_token.into(),
        }
    }
}

#[async_trait]
impl SessionProvider for Credentials {
    async fn session_token(&self) -> Result<String, ClientError> {
        Ok(self.session_token.clone())
    }

    fn app_key(&self) -> &str {
        &self.app_key
    }
}
