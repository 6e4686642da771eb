//! Connection pool: many stream connections, one event stream.
//!
//! The pool polls its members for readiness and yields frames from whichever
//! connection has data, draining a ready connection before moving on so a
//! burst on one subscription is delivered in order. A member that fails or
//! closes is removed and reported once as [`PoolEvent::Closed`]; the pool
//! itself keeps running for the surviving members.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::BytesMut;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::connection::Connection;
use crate::error::TransportError;

/// Pool-assigned identifier for one member connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One event from the pool.
#[derive(Debug)]
pub enum PoolEvent {
    /// A complete frame from the identified connection.
    Frame(ConnectionId, BytesMut),
    /// The identified connection failed or was closed by the peer and has
    /// been removed from the pool.
    Closed(ConnectionId, TransportError),
}

type FrameStream = Pin<Box<dyn Stream<Item = Result<BytesMut, TransportError>> + Send>>;

struct PoolMember {
    id: ConnectionId,
    frames: FrameStream,
}

/// A set of stream connections multiplexed into one event stream.
#[derive(Default)]
pub struct ConnectionPool {
    members: Vec<PoolMember>,
    next_id: u64,
    cursor: usize,
}

impl ConnectionPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an established connection and returns its pool id.
    pub fn add<S>(&mut self, connection: Connection<S>) -> ConnectionId
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;

        tracing::debug!(id = %id, "connection added to pool");
        self.members.push(PoolMember {
            id,
            frames: Box::pin(connection),
        });
        id
    }

    /// Returns the number of live member connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the pool has no live members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Drops every member connection.
    pub fn close(&mut self) {
        tracing::info!(members = self.members.len(), "closing connection pool");
        self.members.clear();
        self.cursor = 0;
    }

    fn remove(&mut self, index: usize) -> ConnectionId {
        let member = self.members.remove(index);
        if self.cursor >= self.members.len() {
            self.cursor = 0;
        }
        member.id
    }

    /// Waits for the next pool event, bounded by `timeout` when given.
    ///
    /// A timeout means no connection produced anything for the whole window,
    /// which the feed's keepalive cadence makes abnormal; the pool closes all
    /// members and reports it as fatal.
    ///
    /// # Errors
    /// Returns `TransportError::PollTimeout` when the window elapses.
    pub async fn next_event(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<PoolEvent>, TransportError> {
        match timeout {
            None => Ok(self.next().await),
            Some(window) => match tokio::time::timeout(window, self.next()).await {
                Ok(event) => Ok(event),
                Err(_) => {
                    tracing::warn!(?window, "no frames within poll window, closing pool");
                    self.close();
                    Err(TransportError::PollTimeout)
                }
            },
        }
    }
}

impl Stream for ConnectionPool {
    type Item = PoolEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.members.is_empty() {
            return Poll::Ready(None);
        }

        // One pass over the members starting at the cursor. The cursor stays
        // on a member that produced a frame so it is drained before the scan
        // moves on.
        let mut polled = 0;
        while polled < this.members.len() {
            let index = this.cursor;
            let member = &mut this.members[index];

            match member.frames.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(frame))) => {
                    return Poll::Ready(Some(PoolEvent::Frame(member.id, frame)));
                }
                Poll::Ready(Some(Err(e))) => {
                    let id = this.remove(index);
                    tracing::warn!(id = %id, error = %e, "pool connection failed");
                    return Poll::Ready(Some(PoolEvent::Closed(id, e)));
                }
                Poll::Ready(None) => {
                    // Terminal error was already reported, drop silently.
                    this.remove(index);
                    if this.members.is_empty() {
                        return Poll::Ready(None);
                    }
                }
                Poll::Pending => {
                    this.cursor = (this.cursor + 1) % this.members.len();
                    polled += 1;
                }
            }
        }

        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, DuplexStream};

    async fn member_pair() -> (Connection<DuplexStream>, DuplexStream) {
        let (client, mut server) = tokio::io::duplex(4096);
        server
            .write_all(b"{\"op\":\"connection\",\"connectionId\":\"c\"}\r\n")
            .await
            .unwrap();
        let conn = Connection::establish(client).await.unwrap();
        (conn, server)
    }

    #[tokio::test]
    async fn test_empty_pool_ends() {
        let mut pool = ConnectionPool::new();
        assert!(pool.is_empty());
        assert!(pool.next().await.is_none());
    }

    #[tokio::test]
    async fn test_frames_carry_member_id() {
        let mut pool = ConnectionPool::new();
        let (conn, mut server) = member_pair().await;
        let id = pool.add(conn);

        server.write_all(b"hello\r\n").await.unwrap();

        match pool.next().await.unwrap() {
            PoolEvent::Frame(from, frame) => {
                assert_eq!(from, id);
                assert_eq!(&frame[..], b"hello");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ready_member_drains_in_order() {
        let mut pool = ConnectionPool::new();
        let (conn_a, mut server_a) = member_pair().await;
        let (conn_b, _server_b) = member_pair().await;
        pool.add(conn_a);
        pool.add(conn_b);

        server_a.write_all(b"first\r\nsecond\r\n").await.unwrap();

        let mut frames = Vec::new();
        for _ in 0..2 {
            match pool.next().await.unwrap() {
                PoolEvent::Frame(_, frame) => frames.push(frame.to_vec()),
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert_eq!(frames, vec![b"first".to_vec(), b"second".to_vec()]);
    }

    #[tokio::test]
    async fn test_closed_member_is_removed() {
        let mut pool = ConnectionPool::new();
        let (conn, server) = member_pair().await;
        let id = pool.add(conn);
        drop(server);

        match pool.next().await.unwrap() {
            PoolEvent::Closed(from, err) => {
                assert_eq!(from, id);
                assert!(matches!(err, TransportError::ConnectionClosed));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(pool.is_empty());
        assert!(pool.next().await.is_none());
    }

    #[tokio::test]
    async fn test_poll_timeout_closes_pool() {
        let mut pool = ConnectionPool::new();
        let (conn, _server) = member_pair().await;
        pool.add(conn);

        let err = pool
            .next_event(Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::PollTimeout));
        assert!(pool.is_empty());
    }
}
