//! # Oddstream Transport
//!
//! Byte-stream framing and connection multiplexing for the exchange push
//! feed.
//!
//! This crate provides:
//! - [`framing`] - CRLF-delimited frame codec tolerant of arbitrary TCP
//!   fragmentation
//! - [`connection`] - one authenticated, subscribed connection with its
//!   handshake state machine
//! - [`connector`] - TLS/TCP dialing with timeouts
//! - [`pool`] - readiness-driven multiplexing of many connections into a
//!   single event stream

pub mod connection;
pub mod connector;
pub mod error;
pub mod framing;
pub mod pool;

pub use connection::{Connection, ConnectionState};
pub use connector::{ConnectorConfig, TlsStream, connect_tls};
pub use error::TransportError;
pub use framing::CrlfCodec;
pub use pool::{ConnectionId, ConnectionPool, PoolEvent};
