//! One order, normalized from the stream and the snapshot API.
//!
//! The stream (`uo` entries) and the snapshot API describe the same order in
//! different spellings: abbreviated fields with epoch-millisecond timestamps
//! versus camelCase fields with RFC 3339 dates. [`Order`] is the common form
//! both convert into so the cache never cares where a record came from.

use chrono::{DateTime, TimeZone, Utc};

use oddstream_protocol::{
    CurrentOrderSummary, MarketId, OrderStatus, OrderType, PersistenceType, SelectionId, Side,
    StreamOrder,
};

/// Aggregation key: one market, one selection, one side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderKey {
    pub market_id: MarketId,
    pub selection_id: SelectionId,
    pub side: Side,
}

impl OrderKey {
    /// Builds a key.
    #[must_use]
    pub fn new(market_id: impl Into<MarketId>, selection_id: SelectionId, side: Side) -> Self {
        Self {
            market_id: market_id.into(),
            selection_id,
            side,
        }
    }
}

/// One order as tracked by the cache.
#[derive(Debug, Clone)]
pub struct Order {
    pub bet_id: String,
    pub market_id: MarketId,
    pub selection_id: SelectionId,
    pub side: Side,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub persistence_type: Option<PersistenceType>,
    /// Limit price.
    pub price: f64,
    /// Original size.
    pub size: f64,
    pub placed_at: Option<DateTime<Utc>>,
    pub matched_at: Option<DateTime<Utc>>,
    pub avg_price_matched: f64,
    pub size_matched: f64,
    pub size_remaining: f64,
    pub size_lapsed: f64,
    pub size_cancelled: f64,
    pub size_voided: f64,
    pub customer_order_ref: Option<String>,
    pub customer_strategy_ref: Option<String>,
}

fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

fn from_rfc3339(date: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

impl Order {
    /// Returns the aggregation key for this order.
    #[must_use]
    pub fn key(&self) -> OrderKey {
        OrderKey::new(self.market_id.clone(), self.selection_id, self.side)
    }

    /// Builds an order from a stream `uo` entry. The entry carries no market
    /// or selection id of its own; those come from the enclosing change.
    #[must_use]
    pub fn from_stream(market_id: &str, selection_id: SelectionId, order: &StreamOrder) -> Self {
        Self {
            bet_id: order.bet_id.clone(),
            market_id: market_id.to_owned(),
            selection_id,
            side: order.side,
            status: order.status,
            order_type: order.order_type,
            persistence_type: order.persistence_type,
            price: order.price,
            size: order.size,
            placed_at: from_millis(order.placed_at),
            matched_at: order.matched_at.and_then(from_millis),
            avg_price_matched: order.avg_price_matched.unwrap_or(0.0),
            size_matched: order.size_matched,
            size_remaining: order.size_remaining,
            size_lapsed: order.size_lapsed,
            size_cancelled: order.size_cancelled,
            size_voided: order.size_voided,
            customer_order_ref: order.customer_order_ref.clone(),
            customer_strategy_ref: order.customer_strategy_ref.clone(),
        }
    }

    /// Builds an order from a snapshot API record.
    #[must_use]
    pub fn from_summary(summary: &CurrentOrderSummary) -> Self {
        Self {
            bet_id: summary.bet_id.clone(),
            market_id: summary.market_id.clone(),
            selection_id: summary.selection_id,
            side: summary.side,
            status: summary.status,
            order_type: summary.order_type,
            persistence_type: Some(summary.persistence_type),
            price: summary.price_size.price,
            size: summary.price_size.size,
            placed_at: summary.placed_date.as_deref().and_then(from_rfc3339),
            matched_at: summary.matched_date.as_deref().and_then(from_rfc3339),
            avg_price_matched: summary.average_price_matched.unwrap_or(0.0),
            size_matched: summary.size_matched,
            size_remaining: summary.size_remaining,
            size_lapsed: summary.size_lapsed,
            size_cancelled: summary.size_cancelled,
            size_voided: summary.size_voided,
            customer_order_ref: summary.customer_order_ref.clone(),
            customer_strategy_ref: summary.customer_strategy_ref.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stream() {
        let raw = r#"{"id":"b-1","p":10,"s":30,"side":"B","status":"E","pt":"L","ot":"L",
            "pd":1583502407000,"md":1583502408000,"avp":9.8,"sm":10,"sr":20,"sl":0,"sc":0,"sv":0}"#;
        let stream_order: StreamOrder = serde_json::from_str(raw).unwrap();
        let order = Order::from_stream("1.100", 101, &stream_order);

        assert_eq!(order.bet_id, "b-1");
        assert_eq!(order.key(), OrderKey::new("1.100", 101, Side::Back));
        assert_eq!(order.size_remaining, 20.0);
        assert_eq!(order.placed_at.unwrap().timestamp_millis(), 1_583_502_407_000);
        assert_eq!(order.matched_at.unwrap().timestamp_millis(), 1_583_502_408_000);
    }

    #[test]
    fn test_from_summary_matches_stream_form() {
        let raw = r#"{"betId":"b-1","marketId":"1.100","selectionId":101,
            "priceSize":{"price":10.0,"size":30.0},"side":"BACK","status":"EXECUTABLE",
            "persistenceType":"LAPSE","orderType":"LIMIT",
            "placedDate":"2020-03-06T13:46:47.000Z","sizeMatched":10.0,"sizeRemaining":20.0}"#;
        let summary: CurrentOrderSummary = serde_json::from_str(raw).unwrap();
        let order = Order::from_summary(&summary);

        assert_eq!(order.key(), OrderKey::new("1.100", 101, Side::Back));
        assert_eq!(order.price, 10.0);
        assert_eq!(order.size, 30.0);
        assert_eq!(order.size_remaining, 20.0);
        assert_eq!(
            order.placed_at.unwrap().to_rfc3339(),
            "2020-03-06T13:46:47+00:00"
        );
    }
}
