//! Pool assembly: one connection per subscription.
//!
//! Each subscription gets its own connection so a slow market feed cannot
//! delay order updates, and so frames from the pool map one-to-one onto
//! subscriptions via their connection id.

use oddstream_protocol::{
    MarketSubscriptionMessage, OrderSubscriptionMessage, RequestMessage, StatusCode,
};
use oddstream_transport::{ConnectionId, ConnectionPool, ConnectorConfig, connect_tls};

use crate::error::ClientError;
use crate::session::SessionProvider;

/// Builds an authenticated, subscribed [`ConnectionPool`].
pub struct StreamBuilder {
    connector: ConnectorConfig,
    subscriptions: Vec<RequestMessage>,
}

impl StreamBuilder {
    /// Creates a builder dialing the given endpoint.
    #[must_use]
    pub fn new(connector: ConnectorConfig) -> Self {
        Self {
            connector,
            subscriptions: Vec::new(),
        }
    }

    /// Adds a market subscription, served by its own connection.
    #[must_use]
    pub fn subscribe_markets(mut self, subscription: MarketSubscriptionMessage) -> Self {
        self.subscriptions
            .push(RequestMessage::MarketSubscription(subscription));
        self
    }

    /// Adds an order subscription, served by its own connection.
    #[must_use]
    pub fn subscribe_orders(mut self, subscription: OrderSubscriptionMessage) -> Self {
        self.subscriptions
            .push(RequestMessage::OrderSubscription(subscription));
        self
    }

    /// Returns the number of subscriptions added so far.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Dials, authenticates and subscribes one connection per subscription,
    /// returning the assembled pool and the connection id each subscription
    /// landed on, in the order they were added.
    ///
    /// # Errors
    /// Returns the first transport failure, authentication failure or
    /// subscription rejection. Connections already established are dropped.
    pub async fn connect(
        self,
        session: &dyn SessionProvider,
    ) -> Result<(ConnectionPool, Vec<ConnectionId>), ClientError> {
        let token = session.session_token().await?;

        let mut pool = ConnectionPool::new();
        let mut ids = Vec::with_capacity(self.subscriptions.len());

        for request in self.subscriptions {
            let mut connection = connect_tls(&self.connector).await?;
            connection.authenticate(&token, session.app_key()).await?;

            let status = connection.subscribe(request).await?;
            if status.status_code == StatusCode::Failure {
                return Err(ClientError::SubscriptionRejected {
                    error_code: status.error_code,
                    message: status.error_message,
                });
            }

            ids.push(pool.add(connection));
        }

        tracing::info!(connections = pool.len(), "stream pool ready");
        Ok((pool, ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriptions_accumulate() {
        let builder = StreamBuilder::new(ConnectorConfig::new("stream.example.com", 443))
            .subscribe_markets(MarketSubscriptionMessage::default())
            .subscribe_orders(OrderSubscriptionMessage::default());
        assert_eq!(builder.subscription_count(), 2);
    }
}
