//! # Oddstream Cache
//!
//! In-memory state built from the push feed's image/delta messages.
//!
//! This crate provides:
//! - [`MarketBook`] - per-market ladder state with dense tick-indexed arrays
//! - [`MarketCache`] - the set of tracked market books, fed by `mcm` messages
//! - [`OrderCache`] - the caller's own orders with per-selection aggregates,
//!   fed by `ocm` messages and bootstrapped from the snapshot API
//!
//! Both caches apply a full image by replacement and a delta by merge; replay
//! of the same image is idempotent.

pub mod error;
pub mod market_book;
pub mod market_cache;
pub mod order_book;
pub mod order_cache;

pub use error::CacheError;
pub use market_book::{LadderGrid, MarketBook};
pub use market_cache::MarketCache;
pub use order_book::{Order, OrderKey};
pub use order_cache::OrderCache;
