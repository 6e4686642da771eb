//! Error types for cache operations.

use oddstream_protocol::{MarketId, SelectionId};
use thiserror::Error;

/// Error type for cache operations.
///
/// Any of these indicates a feed that has diverged from the cache, so callers
/// should treat them as grounds for a fresh subscription rather than retry.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A delta arrived for a market the cache has never seen an image for.
    #[error("delta for unknown market `{0}`")]
    UnknownMarket(MarketId),

    /// A market image arrived without the definition required to size it.
    #[error("image for market `{0}` carries no market definition")]
    MissingDefinition(MarketId),

    /// A runner change referenced a selection absent from the definition.
    #[error("unknown selection {selection_id} in market `{market_id}`")]
    UnknownSelection {
        /// Market the change addressed.
        market_id: MarketId,
        /// Selection the definition does not list.
        selection_id: SelectionId,
    },

    /// A price-keyed ladder delta used a price that is not on the tick table.
    #[error("price {0} is not on the tick table")]
    UnknownTick(f64),

    /// A level-indexed ladder delta addressed a level that is negative,
    /// fractional, or beyond the ladder depth.
    #[error("ladder level {level} out of range (depth {depth})")]
    LevelOutOfRange {
        /// Level the delta addressed, as carried on the wire.
        level: f64,
        /// Depth of the target ladder.
        depth: usize,
    },
}
