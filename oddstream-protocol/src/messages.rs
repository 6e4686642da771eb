//! Message types for the push stream and the order snapshot API.
//!
//! Stream messages are single JSON objects discriminated by an `op` field.
//! Field names on the wire are heavily abbreviated (`pt`, `mc`, `rc`, `batb`,
//! `uo`, ...); the structs here spell them out and map via serde renames.
//!
//! Ladder deltas come in two shapes:
//! - level-indexed triples `[level, price, size]` for the best-N ladders
//!   (`batb`/`batl`/`bdatb`/`bdatl`)
//! - price-keyed pairs `[price, size]` for the full ladder and traded volume
//!   (`atb`/`atl`/`trd`), where the price is resolved through the tick table.

use serde::{Deserialize, Serialize};

use crate::enums::{
    BettingType, ChangeType, ErrorCode, MarketStatus, OrderStatus, OrderType, PersistenceType,
    RunnerStatus, Side, StatusCode,
};

/// A level-indexed ladder delta: `[level, price, size]`.
pub type LevelDelta = [f64; 3];

/// A price-keyed ladder delta: `[price, size]`.
pub type PriceDelta = [f64; 2];

/// Inbound messages, discriminated by the `op` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum StreamMessage {
    /// Server announces the connection id right after connect.
    #[serde(rename = "connection")]
    Connection(ConnectionMessage),
    /// Reply to an authentication or subscription request.
    #[serde(rename = "status")]
    Status(StatusMessage),
    /// Market change message.
    #[serde(rename = "mcm")]
    MarketChange(MarketChangeMessage),
    /// Order change message.
    #[serde(rename = "ocm")]
    OrderChange(OrderChangeMessage),
}

/// Outbound requests, discriminated by the `op` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum RequestMessage {
    /// Authenticate the connection with a session token and application key.
    #[serde(rename = "authentication")]
    Authentication(AuthenticationMessage),
    /// Subscribe to a market data feed.
    #[serde(rename = "marketSubscription")]
    MarketSubscription(MarketSubscriptionMessage),
    /// Subscribe to the caller's own order feed.
    #[serde(rename = "orderSubscription")]
    OrderSubscription(OrderSubscriptionMessage),
}

impl RequestMessage {
    /// Returns the request id.
    #[must_use]
    pub fn id(&self) -> i32 {
        match self {
            Self::Authentication(m) => m.id,
            Self::MarketSubscription(m) => m.id,
            Self::OrderSubscription(m) => m.id,
        }
    }

    /// Stamps the request id used to correlate the `status` reply.
    pub fn set_id(&mut self, id: i32) {
        match self {
            Self::Authentication(m) => m.id = id,
            Self::MarketSubscription(m) => m.id = id,
            Self::OrderSubscription(m) => m.id = id,
        }
    }

    /// Returns true for subscription requests (market or order).
    #[must_use]
    pub fn is_subscription(&self) -> bool {
        matches!(self, Self::MarketSubscription(_) | Self::OrderSubscription(_))
    }
}

/// Server connection announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionMessage {
    /// Request id (absent on unsolicited messages).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    /// Server-assigned connection id.
    pub connection_id: String,
}

/// Reply to a request, or an unsolicited connection-closed notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    /// Id of the request this status answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    /// Success or failure.
    pub status_code: StatusCode,
    /// Reason for a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    /// Human-readable failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Set when the server is about to close the connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_closed: Option<bool>,
    /// Remaining connection allowance for the account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections_available: Option<i32>,
    /// Connection id, echoed on some replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
}

/// Authentication request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationMessage {
    /// Request id.
    pub id: i32,
    /// Session token from the session provider.
    pub session: String,
    /// Application key.
    pub app_key: String,
}

/// Market feed subscription request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSubscriptionMessage {
    /// Request id.
    #[serde(default)]
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation_enabled: Option<bool>,
    /// Resume clock from a previous session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_clk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflate_ms: Option<u64>,
    /// Which markets to stream.
    #[serde(default)]
    pub market_filter: MarketFilter,
    /// Which data to stream for each market.
    #[serde(default)]
    pub market_data_filter: MarketDataFilter,
}

/// Order feed subscription request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubscriptionMessage {
    /// Request id.
    #[serde(default)]
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_clk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflate_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_filter: Option<OrderFilter>,
}

/// Market selection filter for a market subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_codes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub betting_types: Option<Vec<BettingType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_in_play_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venues: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bsp_market: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race_types: Option<Vec<String>>,
}

/// Data selection filter for a market subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDataFilter {
    /// Ladder depth for the best-N fields (max 10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ladder_levels: Option<u32>,
    /// Requested data fields, e.g. `EX_BEST_OFFERS_DISP`, `EX_ALL_OFFERS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

/// Order filter for an order subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_overall_position: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_strategy_refs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_matched_by_strategy_ref: Option<bool>,
}

/// Market change message (`op == "mcm"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketChangeMessage {
    /// Request id of the originating subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    /// Server publish time in epoch milliseconds. Absent on non-data
    /// messages; the caches treat such messages as no-ops.
    #[serde(rename = "pt", default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<i64>,
    /// Change kind (image, delta, heartbeat).
    #[serde(rename = "ct", default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<ChangeType>,
    /// Resume clock.
    #[serde(rename = "clk", default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<String>,
    #[serde(rename = "initialClk", default, skip_serializing_if = "Option::is_none")]
    pub initial_clock: Option<String>,
    #[serde(rename = "heartbeatMs", default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_ms: Option<u64>,
    #[serde(rename = "conflateMs", default, skip_serializing_if = "Option::is_none")]
    pub conflate_ms: Option<u64>,
    #[serde(rename = "segmentType", default, skip_serializing_if = "Option::is_none")]
    pub segment_type: Option<String>,
    /// Per-market change entries.
    #[serde(rename = "mc", default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<MarketChange>,
}

/// One per-market change entry inside an `mcm`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketChange {
    /// Market id.
    #[serde(rename = "id")]
    pub market_id: String,
    /// Full image flag: replaces all previously known state for the market.
    #[serde(rename = "img", default)]
    pub image: bool,
    /// Total amount matched on the market.
    #[serde(rename = "tv", default, skip_serializing_if = "Option::is_none")]
    pub total_matched: Option<f64>,
    /// Conflation flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub con: Option<bool>,
    /// Market definition; replaced wholesale whenever present.
    #[serde(rename = "marketDefinition", default, skip_serializing_if = "Option::is_none")]
    pub market_definition: Option<MarketDefinition>,
    /// Runner-level ladder deltas.
    #[serde(rename = "rc", default, skip_serializing_if = "Vec::is_empty")]
    pub runner_changes: Vec<RunnerChange>,
}

/// Runner-level ladder deltas inside a market change entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerChange {
    /// Selection id.
    #[serde(rename = "id")]
    pub selection_id: i64,
    /// Handicap, for handicap markets.
    #[serde(rename = "hc", default, skip_serializing_if = "Option::is_none")]
    pub handicap: Option<f64>,
    /// Last traded price.
    #[serde(rename = "ltp", default, skip_serializing_if = "Option::is_none")]
    pub last_traded_price: Option<f64>,
    /// Total volume matched on this runner.
    #[serde(rename = "tv", default, skip_serializing_if = "Option::is_none")]
    pub total_volume: Option<f64>,
    /// Best available to back, virtualised for display.
    #[serde(rename = "bdatb", default, skip_serializing_if = "Vec::is_empty")]
    pub best_display_back: Vec<LevelDelta>,
    /// Best available to lay, virtualised for display.
    #[serde(rename = "bdatl", default, skip_serializing_if = "Vec::is_empty")]
    pub best_display_lay: Vec<LevelDelta>,
    /// Best available to back (raw offers).
    #[serde(rename = "batb", default, skip_serializing_if = "Vec::is_empty")]
    pub best_back: Vec<LevelDelta>,
    /// Best available to lay (raw offers).
    #[serde(rename = "batl", default, skip_serializing_if = "Vec::is_empty")]
    pub best_lay: Vec<LevelDelta>,
    /// Full available-to-back ladder, keyed by price.
    #[serde(rename = "atb", default, skip_serializing_if = "Vec::is_empty")]
    pub available_to_back: Vec<PriceDelta>,
    /// Full available-to-lay ladder, keyed by price.
    #[serde(rename = "atl", default, skip_serializing_if = "Vec::is_empty")]
    pub available_to_lay: Vec<PriceDelta>,
    /// Traded volume ladder, keyed by price.
    #[serde(rename = "trd", default, skip_serializing_if = "Vec::is_empty")]
    pub traded: Vec<PriceDelta>,
}

/// Static-ish per-market attributes, replaced wholesale on every update that
/// carries one (never field-merged).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDefinition {
    /// Definition version; increases when the definition changes.
    pub version: i64,
    /// Trading status.
    pub status: MarketStatus,
    /// Betting type.
    pub betting_type: BettingType,
    /// True once the market has turned in-play.
    #[serde(default)]
    pub in_play: bool,
    #[serde(default)]
    pub bsp_market: bool,
    #[serde(default)]
    pub turn_in_play_enabled: bool,
    #[serde(default)]
    pub persistence_enabled: bool,
    #[serde(default)]
    pub bsp_reconciled: bool,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub cross_matching: bool,
    #[serde(default)]
    pub runners_voidable: bool,
    #[serde(default)]
    pub discount_allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_winners: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_active_runners: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_delay: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_base_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspend_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regulators: Vec<String>,
    /// Runner definitions; `sortPriority` fixes each runner's ladder row.
    #[serde(default)]
    pub runners: Vec<RunnerDefinition>,
}

/// Runner definition within a market definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerDefinition {
    /// Selection id.
    #[serde(rename = "id")]
    pub selection_id: i64,
    /// Dense 1-based rank; ladder row = `sort_priority - 1`.
    pub sort_priority: u32,
    /// Runner status.
    pub status: RunnerStatus,
    /// Handicap, for handicap markets.
    #[serde(rename = "hc", default, skip_serializing_if = "Option::is_none")]
    pub handicap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bsp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removal_date: Option<String>,
}

/// Order change message (`op == "ocm"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderChangeMessage {
    /// Request id of the originating subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    /// Server publish time in epoch milliseconds.
    #[serde(rename = "pt", default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<i64>,
    #[serde(rename = "ct", default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<ChangeType>,
    #[serde(rename = "clk", default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<String>,
    #[serde(rename = "initialClk", default, skip_serializing_if = "Option::is_none")]
    pub initial_clock: Option<String>,
    #[serde(rename = "heartbeatMs", default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_ms: Option<u64>,
    #[serde(rename = "segmentType", default, skip_serializing_if = "Option::is_none")]
    pub segment_type: Option<String>,
    /// Per-market order change entries.
    #[serde(rename = "oc", default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<OrderMarketChange>,
}

/// Per-market order changes inside an `ocm`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderMarketChange {
    /// Market id.
    #[serde(rename = "id")]
    pub market_id: String,
    #[serde(rename = "accountId", default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<i64>,
    /// Market closed; no further order changes will arrive for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
    /// Per-selection order changes.
    #[serde(rename = "orc", default, skip_serializing_if = "Vec::is_empty")]
    pub runner_changes: Vec<OrderRunnerChange>,
}

/// Per-selection order changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderRunnerChange {
    /// Selection id.
    #[serde(rename = "id")]
    pub selection_id: i64,
    #[serde(rename = "hc", default, skip_serializing_if = "Option::is_none")]
    pub handicap: Option<f64>,
    /// Full image: replaces all known orders on this selection.
    #[serde(rename = "fullImage", default)]
    pub full_image: bool,
    /// Updated orders.
    #[serde(rename = "uo", default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched_orders: Vec<StreamOrder>,
    /// Matched backs ladder `[price, size]`.
    #[serde(rename = "mb", default, skip_serializing_if = "Vec::is_empty")]
    pub matched_backs: Vec<PriceDelta>,
    /// Matched lays ladder `[price, size]`.
    #[serde(rename = "ml", default, skip_serializing_if = "Vec::is_empty")]
    pub matched_lays: Vec<PriceDelta>,
}

/// One order as carried by the stream (`uo` entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamOrder {
    /// Bet id.
    #[serde(rename = "id")]
    pub bet_id: String,
    /// Limit price.
    #[serde(rename = "p")]
    pub price: f64,
    /// Original size.
    #[serde(rename = "s")]
    pub size: f64,
    pub side: Side,
    pub status: OrderStatus,
    #[serde(rename = "pt", default, skip_serializing_if = "Option::is_none")]
    pub persistence_type: Option<PersistenceType>,
    #[serde(rename = "ot")]
    pub order_type: OrderType,
    /// Placed time, epoch milliseconds.
    #[serde(rename = "pd")]
    pub placed_at: i64,
    /// Last matched time, epoch milliseconds.
    #[serde(rename = "md", default, skip_serializing_if = "Option::is_none")]
    pub matched_at: Option<i64>,
    /// Lapsed time, epoch milliseconds.
    #[serde(rename = "ld", default, skip_serializing_if = "Option::is_none")]
    pub lapsed_at: Option<i64>,
    #[serde(rename = "avp", default, skip_serializing_if = "Option::is_none")]
    pub avg_price_matched: Option<f64>,
    #[serde(rename = "sm", default)]
    pub size_matched: f64,
    #[serde(rename = "sr", default)]
    pub size_remaining: f64,
    #[serde(rename = "sl", default)]
    pub size_lapsed: f64,
    #[serde(rename = "sc", default)]
    pub size_cancelled: f64,
    #[serde(rename = "sv", default)]
    pub size_voided: f64,
    #[serde(rename = "rc", default, skip_serializing_if = "Option::is_none")]
    pub regulator_code: Option<String>,
    #[serde(rename = "rac", default, skip_serializing_if = "Option::is_none")]
    pub regulator_auth_code: Option<String>,
    #[serde(rename = "rfo", default, skip_serializing_if = "Option::is_none")]
    pub customer_order_ref: Option<String>,
    #[serde(rename = "rfs", default, skip_serializing_if = "Option::is_none")]
    pub customer_strategy_ref: Option<String>,
    #[serde(rename = "bsp", default, skip_serializing_if = "Option::is_none")]
    pub bsp_liability: Option<f64>,
    #[serde(rename = "lsrc", default, skip_serializing_if = "Option::is_none")]
    pub lapse_status_reason: Option<String>,
}

/// Price and size pair from the order snapshot API.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PriceSize {
    pub price: f64,
    pub size: f64,
}

/// One order record from the snapshot (current orders) API, used to
/// bootstrap the order cache before streaming starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentOrderSummary {
    pub bet_id: String,
    pub market_id: String,
    pub selection_id: i64,
    #[serde(default)]
    pub handicap: f64,
    pub price_size: PriceSize,
    #[serde(default)]
    pub bsp_liability: f64,
    pub side: Side,
    pub status: OrderStatus,
    pub persistence_type: PersistenceType,
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placed_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_price_matched: Option<f64>,
    #[serde(default)]
    pub size_matched: f64,
    #[serde(default)]
    pub size_remaining: f64,
    #[serde(default)]
    pub size_lapsed: f64,
    #[serde(default)]
    pub size_cancelled: f64,
    #[serde(default)]
    pub size_voided: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulator_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulator_auth_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_order_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_strategy_ref: Option<String>,
}
