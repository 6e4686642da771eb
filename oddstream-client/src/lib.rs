//! # Oddstream Client
//!
//! High-level client for the exchange push-streaming feed: dial and
//! authenticate connections, hold one subscription per connection, and fold
//! the resulting frames into market and order caches.
//!
//! ```no_run
//! use oddstream_client::{CacheSet, Credentials, StreamBuilder, Update};
//! use oddstream_protocol::{MarketSubscriptionMessage, OrderSubscriptionMessage};
//! use oddstream_transport::{ConnectorConfig, PoolEvent};
//! use futures::StreamExt;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::new("app-key", "session-token");
//! let (mut pool, _ids) = StreamBuilder::new(ConnectorConfig::new("stream.example.com", 443))
//!     .subscribe_markets(MarketSubscriptionMessage::default())
//!     .subscribe_orders(OrderSubscriptionMessage::default())
//!     .connect(&credentials)
//!     .await?;
//!
//! let mut caches = CacheSet::new();
//! while let Some(event) = pool.next().await {
//!     match event {
//!         PoolEvent::Frame(_, frame) => match caches.apply_frame(&frame)? {
//!             Update::Markets(books) => { /* react to ladder changes */ }
//!             Update::Orders(orders) => { /* react to own-order changes */ }
//!             _ => {}
//!         },
//!         PoolEvent::Closed(id, err) => eprintln!("{id} closed: {err}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cache_set;
pub mod error;
pub mod session;

pub use builder::StreamBuilder;
pub use cache_set::{CacheSet, Update};
pub use error::ClientError;
pub use session::{Credentials, OrderSnapshotProvider, SessionProvider};
