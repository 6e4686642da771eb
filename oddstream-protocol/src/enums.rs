//! Wire enums shared by stream and snapshot payloads.
//!
//! The stream uses short spellings (`"B"`, `"E"`, `"L"`) while the snapshot
//! API spells the same values out (`"BACK"`, `"EXECUTABLE"`, `"LIMIT"`).
//! Each variant serializes as its stream form and deserializes from either.

use serde::{Deserialize, Serialize};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Back the selection (bet for).
    #[serde(rename = "B", alias = "BACK")]
    Back,
    /// Lay the selection (bet against).
    #[serde(rename = "L", alias = "LAY")]
    Lay,
}

impl Side {
    /// Ladder array index for this side (back = 0, lay = 1).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Back => 0,
            Self::Lay => 1,
        }
    }
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order has unmatched size remaining.
    #[serde(rename = "E", alias = "EXECUTABLE")]
    Executable,
    /// Order is fully matched, cancelled, voided or lapsed.
    #[serde(rename = "EC", alias = "EXECUTION_COMPLETE")]
    ExecutionComplete,
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Limit order at a fixed price.
    #[serde(rename = "L", alias = "LIMIT")]
    Limit,
    /// Limit order converted at market close.
    #[serde(rename = "LOC", alias = "LIMIT_ON_CLOSE")]
    LimitOnClose,
    /// Market order executed at close.
    #[serde(rename = "MOC", alias = "MARKET_ON_CLOSE")]
    MarketOnClose,
}

/// What happens to an unmatched order when the market turns in-play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersistenceType {
    /// Cancel the unmatched portion.
    #[serde(rename = "L", alias = "LAPSE")]
    Lapse,
    /// Keep the unmatched portion.
    #[serde(rename = "P", alias = "PERSIST")]
    Persist,
    /// Convert to a market-on-close order.
    #[serde(rename = "MOC", alias = "MARKET_ON_CLOSE")]
    MarketOnClose,
}

/// Outcome of a request, carried by `status` replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// Request accepted.
    Success,
    /// Request rejected; `errorCode` carries the reason.
    Failure,
}

/// Upstream error codes carried by failed `status` replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoAppKey,
    InvalidAppKey,
    NoSession,
    InvalidSessionInformation,
    NotAuthorized,
    InvalidInput,
    InvalidClock,
    UnexpectedError,
    Timeout,
    SubscriptionLimitExceeded,
    InvalidRequest,
    ConnectionFailed,
    MaxConnectionLimitExceeded,
    TooManyRequests,
}

/// Trading status of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketStatus {
    Inactive,
    Open,
    Suspended,
    Closed,
}

/// Status of a runner within a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunnerStatus {
    Active,
    Winner,
    Loser,
    Removed,
    RemovedVacant,
    Hidden,
    Placed,
}

/// Betting type of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BettingType {
    Odds,
    Line,
    Range,
    AsianHandicapDoubleLine,
    AsianHandicapSingleLine,
}

/// Kind of change message segment (`ct` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// Full image following (re)subscription.
    SubImage,
    /// Delta stream resumed from a supplied clock.
    ResubDelta,
    /// Keep-alive with no payload.
    Heartbeat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_short_and_long_forms() {
        let short: Side = serde_json::from_str("\"B\"").unwrap();
        let long: Side = serde_json::from_str("\"BACK\"").unwrap();
        assert_eq!(short, Side::Back);
        assert_eq!(long, Side::Back);
        assert_eq!(serde_json::to_string(&Side::Lay).unwrap(), "\"L\"");
    }

    #[test]
    fn test_side_index() {
        assert_eq!(Side::Back.index(), 0);
        assert_eq!(Side::Lay.index(), 1);
    }

    #[test]
    fn test_order_status_forms() {
        let short: OrderStatus = serde_json::from_str("\"EC\"").unwrap();
        let long: OrderStatus = serde_json::from_str("\"EXECUTION_COMPLETE\"").unwrap();
        assert_eq!(short, OrderStatus::ExecutionComplete);
        assert_eq!(long, OrderStatus::ExecutionComplete);
    }

    #[test]
    fn test_status_code() {
        let code: StatusCode = serde_json::from_str("\"FAILURE\"").unwrap();
        assert_eq!(code, StatusCode::Failure);
    }

    #[test]
    fn test_error_code() {
        let code: ErrorCode = serde_json::from_str("\"INVALID_SESSION_INFORMATION\"").unwrap();
        assert_eq!(code, ErrorCode::InvalidSessionInformation);
    }

    #[test]
    fn test_persistence_type_forms() {
        let short: PersistenceType = serde_json::from_str("\"P\"").unwrap();
        assert_eq!(short, PersistenceType::Persist);
        let moc: PersistenceType = serde_json::from_str("\"MARKET_ON_CLOSE\"").unwrap();
        assert_eq!(moc, PersistenceType::MarketOnClose);
    }
}
