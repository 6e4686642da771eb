//! Frame-to-cache dispatch.

use oddstream_cache::{MarketBook, MarketCache, Order, OrderCache};
use oddstream_protocol::{StatusMessage, StreamMessage};

use crate::error::ClientError;
use crate::session::OrderSnapshotProvider;

/// The outcome of applying one frame.
#[derive(Debug)]
pub enum Update<'a> {
    /// Market books touched by an `mcm`, in message order.
    Markets(Vec<&'a MarketBook>),
    /// Orders touched by an `ocm`, in message order.
    Orders(Vec<&'a Order>),
    /// A mid-stream status message, e.g. a connection-closing notice.
    Status(StatusMessage),
    /// A message with no cache effect (heartbeat, connection announcement).
    Ignored,
}

/// Market and order caches behind one frame entry point.
///
/// Frames from the pool are raw bytes; [`CacheSet::apply_frame`] decodes and
/// routes them, so the caller's event loop is a single match on [`Update`].
#[derive(Debug, Default)]
pub struct CacheSet {
    markets: MarketCache,
    orders: OrderCache,
}

impl CacheSet {
    /// Creates empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the order cache from the snapshot API before streaming starts.
    ///
    /// # Errors
    /// Returns `ClientError::Snapshot` when the provider fails.
    pub async fn bootstrap_orders(
        &mut self,
        provider: &dyn OrderSnapshotProvider,
    ) -> Result<(), ClientError> {
        let snapshot = provider.current_orders().await?;
        tracing::info!(orders = snapshot.len(), "order cache bootstrapped");
        self.orders = OrderCache::from_snapshot(snapshot.iter().map(Order::from_summary));
        Ok(())
    }

    /// Decodes one frame and applies it to the owning cache.
    ///
    /// # Errors
    /// Returns `ClientError::Decode` for malformed frames and `Cache` when a
    /// change message does not apply.
    pub fn apply_frame(&mut self, frame: &[u8]) -> Result<Update<'_>, ClientError> {
        let message: StreamMessage = serde_json::from_slice(frame)?;
        match message {
            StreamMessage::MarketChange(mcm) => Ok(Update::Markets(self.markets.update(&mcm)?)),
            StreamMessage::OrderChange(ocm) => Ok(Update::Orders(self.orders.update(&ocm))),
            StreamMessage::Status(status) => Ok(Update::Status(status)),
            StreamMessage::Connection(_) => Ok(Update::Ignored),
        }
    }

    /// Returns the market cache.
    #[must_use]
    pub fn markets(&self) -> &MarketCache {
        &self.markets
    }

    /// Returns the order cache.
    #[must_use]
    pub fn orders(&self) -> &OrderCache {
        &self.orders
    }
}
