//! # Oddstream Protocol
//!
//! Wire message model for the exchange push-streaming feed.
//!
//! The feed speaks CRLF-delimited UTF-8 JSON objects over a TLS stream, one
//! object per logical message, discriminated by an `op` field. This crate
//! provides:
//! - [`StreamMessage`] - inbound messages (`connection`, `status`, `mcm`, `ocm`)
//! - [`RequestMessage`] - outbound requests (`authentication`, subscriptions)
//! - Wire enums with their short-code spellings (`B`/`L`, `E`/`EC`, ...)
//! - [`ticks`] - the fixed table of valid prices and its index lookup

pub mod enums;
pub mod messages;
pub mod ticks;

pub use enums::{
    BettingType, ChangeType, ErrorCode, MarketStatus, OrderStatus, OrderType, PersistenceType,
    RunnerStatus, Side, StatusCode,
};
pub use messages::{
    AuthenticationMessage, ConnectionMessage, CurrentOrderSummary, LevelDelta, MarketChange,
    MarketChangeMessage, MarketDataFilter, MarketDefinition, MarketFilter,
    MarketSubscriptionMessage, OrderChangeMessage, OrderFilter, OrderMarketChange,
    OrderRunnerChange, OrderSubscriptionMessage, PriceDelta, PriceSize, RequestMessage,
    RunnerChange, RunnerDefinition, StatusMessage, StreamMessage, StreamOrder,
};
pub use ticks::{TICK_COUNT, tick_index, tick_price};

/// Market identifier as assigned by the exchange (e.g. `"1.169205465"`).
pub type MarketId = String;

/// Selection (runner) identifier within a market.
pub type SelectionId = i64;
