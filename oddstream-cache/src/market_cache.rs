//! The set of tracked market books.

use std::collections::HashMap;

use oddstream_protocol::enums::ChangeType;
use oddstream_protocol::{MarketChangeMessage, MarketId};

use crate::error::CacheError;
use crate::market_book::MarketBook;

/// Market state built from a stream of `mcm` messages.
///
/// An image creates or replaces a book; a delta merges into an existing one.
/// A delta for a market with no prior image means the feed and the cache
/// have diverged, which is surfaced as an error rather than papered over.
#[derive(Debug, Default)]
pub struct MarketCache {
    books: HashMap<MarketId, MarketBook>,
    publish_time: i64,
}

impl MarketCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one `mcm` message and returns the touched books in message
    /// order.
    ///
    /// Heartbeats and other messages without a publish time are no-ops. The
    /// publish time of accepted messages is stored verbatim; ordering is the
    /// feed's guarantee, not re-checked here.
    ///
    /// # Errors
    /// Returns `CacheError` for deltas addressing unknown markets, images
    /// without definitions, and malformed ladder deltas.
    pub fn update(
        &mut self,
        message: &MarketChangeMessage,
    ) -> Result<Vec<&MarketBook>, CacheError> {
        let Some(publish_time) = message.publish_time else {
            return Ok(Vec::new());
        };
        self.publish_time = publish_time;

        let mut touched = Vec::with_capacity(message.changes.len());
        for change in &message.changes {
            match self.books.get_mut(&change.market_id) {
                Some(book) if !change.image => book.apply(change, publish_time)?,
                // An image, or the first sighting of a market. Either way the
                // entry must carry a definition to shape the book from.
                _ => {
                    if !change.image && change.market_definition.is_none() {
                        return Err(CacheError::UnknownMarket(change.market_id.clone()));
                    }
                    let book = MarketBook::from_image(change, publish_time)?;
                    self.books.insert(change.market_id.clone(), book);
                }
            }
            touched.push(change.market_id.clone());
        }

        let books = &self.books;
        Ok(touched.iter().filter_map(|id| books.get(id)).collect())
    }

    /// Returns the book for a market, if tracked.
    #[must_use]
    pub fn get(&self, market_id: &str) -> Option<&MarketBook> {
        self.books.get(market_id)
    }

    /// Drops a market from the cache, returning its final book.
    pub fn remove(&mut self, market_id: &str) -> Option<MarketBook> {
        self.books.remove(market_id)
    }

    /// Returns the number of tracked markets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Returns true if no markets are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Iterates the tracked market ids.
    pub fn market_ids(&self) -> impl Iterator<Item = &str> {
        self.books.keys().map(String::as_str)
    }

    /// Returns the publish time of the last applied message, epoch millis.
    #[must_use]
    pub fn publish_time(&self) -> i64 {
        self.publish_time
    }

    /// Re-emits the whole cache as one full-image message, equivalent to
    /// what a fresh subscription would deliver for the current state.
    #[must_use]
    pub fn snapshot_message(&self) -> MarketChangeMessage {
        MarketChangeMessage {
            publish_time: Some(self.publish_time),
            change_type: Some(ChangeType::SubImage),
            changes: self.books.values().map(MarketBook::to_market_change).collect(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oddstream_protocol::{Side, StreamMessage};

    fn mcm(raw: &str) -> MarketChangeMessage {
        let msg: StreamMessage = serde_json::from_str(raw).unwrap();
        let StreamMessage::MarketChange(mcm) = msg else {
            panic!("expected mcm");
        };
        mcm
    }

    fn seed() -> MarketChangeMessage {
        mcm(r#"{"op":"mcm","pt":100,"mc":[{"id":"1.100","img":true,
            "marketDefinition":{"version":1,"status":"OPEN","bettingType":"ODDS",
                "runners":[{"id":101,"sortPriority":1,"status":"ACTIVE"}]},
            "rc":[{"id":101,"bdatb":[[0,1.2,24]]}]}]}"#)
    }

    #[test]
    fn test_image_then_delta() {
        let mut cache = MarketCache::new();

        let touched = cache.update(&seed()).unwrap();
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].market_id(), "1.100");

        let delta = mcm(
            r#"{"op":"mcm","pt":200,"mc":[{"id":"1.100","rc":[{"id":101,"ltp":1.25}]}]}"#,
        );
        cache.update(&delta).unwrap();

        let book = cache.get("1.100").unwrap();
        assert_eq!(book.last_traded_price(101), Some(1.25));
        assert_eq!(book.best_display(101, Side::Back, 0), Some((1.2, 24.0)));
        assert_eq!(cache.publish_time(), 200);
    }

    #[test]
    fn test_delta_for_unknown_market_is_an_error() {
        let mut cache = MarketCache::new();
        let delta = mcm(
            r#"{"op":"mcm","pt":100,"mc":[{"id":"1.999","rc":[{"id":101,"ltp":1.25}]}]}"#,
        );
        let err = cache.update(&delta).unwrap_err();
        assert!(matches!(err, CacheError::UnknownMarket(id) if id == "1.999"));
        // No zero-shaped book was invented.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_first_sighting_with_definition_creates_a_book() {
        let mut cache = MarketCache::new();
        // Not flagged as an image, but carries a definition and is unseen.
        let first = mcm(
            r#"{"op":"mcm","pt":100,"mc":[{"id":"1.200",
                "marketDefinition":{"version":1,"status":"OPEN","bettingType":"ODDS",
                    "runners":[{"id":201,"sortPriority":1,"status":"ACTIVE"}]},
                "rc":[{"id":201,"ltp":2.5}]}]}"#,
        );
        cache.update(&first).unwrap();
        assert_eq!(cache.get("1.200").unwrap().last_traded_price(201), Some(2.5));
    }

    #[test]
    fn test_heartbeat_is_a_no_op() {
        let mut cache = MarketCache::new();
        cache.update(&seed()).unwrap();

        let heartbeat = mcm(r#"{"op":"mcm","ct":"HEARTBEAT","clk":"AAAA"}"#);
        let touched = cache.update(&heartbeat).unwrap();
        assert!(touched.is_empty());
        assert_eq!(cache.publish_time(), 100);
    }

    #[test]
    fn test_snapshot_message_rebuilds_equivalent_cache() {
        let mut cache = MarketCache::new();
        cache.update(&seed()).unwrap();

        let snapshot = cache.snapshot_message();
        assert_eq!(snapshot.change_type, Some(ChangeType::SubImage));

        let mut rebuilt = MarketCache::new();
        rebuilt.update(&snapshot).unwrap();
        assert_eq!(rebuilt.len(), 1);
        assert_eq!(
            rebuilt.get("1.100").unwrap().best_display(101, Side::Back, 0),
            Some((1.2, 24.0))
        );
    }

    #[test]
    fn test_remove() {
        let mut cache = MarketCache::new();
        cache.update(&seed()).unwrap();
        assert!(cache.remove("1.100").is_some());
        assert!(cache.is_empty());
    }
}
