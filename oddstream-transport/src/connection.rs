//! One authenticated, subscribed stream connection.
//!
//! A [`Connection`] owns a framed transport stream, a request-id counter and
//! the handshake state machine. It is generic over the underlying byte
//! stream so the same type runs over TLS in production and over an in-memory
//! duplex pipe in tests.
//!
//! Lifecycle: `Connected → Authenticated → Subscribed → Streaming`, with any
//! send or read failure landing in the terminal `Closed` state. A closed
//! connection is never resurrected; callers build a fresh one to retry.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::BytesMut;
use futures::{SinkExt, Stream, StreamExt};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use oddstream_protocol::{
    AuthenticationMessage, RequestMessage, StatusCode, StatusMessage, StreamMessage,
};

use crate::error::TransportError;
use crate::framing::CrlfCodec;

/// Handshake state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport open, connection announcement consumed.
    Connected,
    /// Authentication accepted.
    Authenticated,
    /// Subscription request acknowledged.
    Subscribed,
    /// At least one data frame received.
    Streaming,
    /// Terminal: transport failed or peer closed.
    Closed,
}

/// One connection to the exchange push feed.
pub struct Connection<S> {
    framed: Framed<S, CrlfCodec>,
    state: ConnectionState,
    next_request_id: i32,
    connection_id: String,
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connection_id", &self.connection_id)
            .field("state", &self.state)
            .field("next_request_id", &self.next_request_id)
            .finish_non_exhaustive()
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Wraps an open transport stream and consumes the server's connection
    /// announcement frame.
    ///
    /// # Errors
    /// Returns `TransportError` if the stream closes, the announcement does
    /// not parse, or the first message is not a `connection` message.
    pub async fn establish(stream: S) -> Result<Self, TransportError> {
        let mut framed = Framed::new(stream, CrlfCodec::default());

        let frame = match framed.next().await {
            Some(frame) => frame?,
            None => return Err(TransportError::ConnectionClosed),
        };

        let message: StreamMessage = serde_json::from_slice(&frame)?;
        let StreamMessage::Connection(announcement) = message else {
            return Err(TransportError::UnexpectedMessage {
                expected: "connection",
            });
        };

        tracing::info!(connection_id = %announcement.connection_id, "stream connected");

        Ok(Self {
            framed,
            state: ConnectionState::Connected,
            next_request_id: 0,
            connection_id: announcement.connection_id,
        })
    }

    /// Returns the current handshake state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the server-assigned connection id.
    #[must_use]
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    fn next_request_id(&mut self) -> i32 {
        self.next_request_id += 1;
        self.next_request_id
    }

    /// Sends one message, framed and JSON-encoded.
    ///
    /// # Errors
    /// Returns `TransportError::Closed` on a closed connection; a send
    /// failure closes the connection.
    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<(), TransportError> {
        if self.state == ConnectionState::Closed {
            return Err(TransportError::Closed);
        }

        let payload = serde_json::to_vec(message)?;

        if let Err(e) = self.framed.send(payload.as_slice()).await {
            self.state = ConnectionState::Closed;
            return Err(e.into());
        }

        Ok(())
    }

    /// Reads one frame from the transport.
    ///
    /// # Errors
    /// Returns `TransportError::ConnectionClosed` when the peer closes; any
    /// failure is terminal for this connection.
    pub async fn read_frame(&mut self) -> Result<BytesMut, TransportError> {
        if self.state == ConnectionState::Closed {
            return Err(TransportError::Closed);
        }

        match self.framed.next().await {
            Some(Ok(frame)) => {
                if self.state == ConnectionState::Subscribed {
                    self.state = ConnectionState::Streaming;
                }
                Ok(frame)
            }
            Some(Err(e)) => {
                self.state = ConnectionState::Closed;
                Err(e.into())
            }
            None => {
                self.state = ConnectionState::Closed;
                Err(TransportError::ConnectionClosed)
            }
        }
    }

    async fn read_status(&mut self) -> Result<StatusMessage, TransportError> {
        let frame = self.read_frame().await?;
        let message: StreamMessage = serde_json::from_slice(&frame)?;
        match message {
            StreamMessage::Status(status) => Ok(status),
            _ => Err(TransportError::UnexpectedMessage { expected: "status" }),
        }
    }

    /// Authenticates the connection and blocks for the status reply.
    ///
    /// # Errors
    /// Returns `TransportError::AuthenticationFailed` carrying the upstream
    /// error code when the reply signals failure. A failed authentication
    /// closes the connection.
    pub async fn authenticate(
        &mut self,
        session_token: &str,
        app_key: &str,
    ) -> Result<(), TransportError> {
        let id = self.next_request_id();
        let request = RequestMessage::Authentication(AuthenticationMessage {
            id,
            session: session_token.to_owned(),
            app_key: app_key.to_owned(),
        });

        self.send(&request).await?;
        let status = self.read_status().await?;

        if status.status_code == StatusCode::Failure {
            self.state = ConnectionState::Closed;
            return Err(TransportError::AuthenticationFailed {
                error_code: status.error_code,
                message: status.error_message,
            });
        }

        tracing::info!(connection_id = %self.connection_id, "authenticated");
        self.state = ConnectionState::Authenticated;
        Ok(())
    }

    /// Sends a subscription request built by the caller, stamping in the
    /// next request id, and blocks for one status reply.
    ///
    /// The reply is returned for inspection; a failure status does not close
    /// the connection and does not block subsequent streaming reads.
    ///
    /// # Errors
    /// Returns `TransportError` if the send or the reply read fails.
    pub async fn subscribe(
        &mut self,
        mut request: RequestMessage,
    ) -> Result<StatusMessage, TransportError> {
        request.set_id(self.next_request_id());

        self.send(&request).await?;
        let status = self.read_status().await?;

        tracing::info!(
            connection_id = %self.connection_id,
            status = ?status.status_code,
            error = ?status.error_code,
            "subscription status"
        );

        self.state = ConnectionState::Subscribed;
        Ok(status)
    }

    /// Closes the connection.
    pub async fn close(mut self) -> Result<(), TransportError> {
        self.state = ConnectionState::Closed;
        SinkExt::<&[u8]>::close(&mut self.framed)
            .await
            .map_err(TransportError::Io)
    }
}

/// Streaming view: yields frames until the connection fails or the peer
/// closes, surfacing that as one `Err` item followed by end of stream.
impl<S: AsyncRead + AsyncWrite + Unpin> Stream for Connection<S> {
    type Item = Result<BytesMut, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.state == ConnectionState::Closed {
            return Poll::Ready(None);
        }

        match Pin::new(&mut this.framed).poll_next(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if this.state == ConnectionState::Subscribed {
                    this.state = ConnectionState::Streaming;
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.state = ConnectionState::Closed;
                Poll::Ready(Some(Err(e.into())))
            }
            Poll::Ready(None) => {
                this.state = ConnectionState::Closed;
                Poll::Ready(Some(Err(TransportError::ConnectionClosed)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    async fn server_write(server: &mut DuplexStream, frame: &str) {
        server.write_all(frame.as_bytes()).await.unwrap();
        server.write_all(b"\r\n").await.unwrap();
    }

    async fn establish_pair() -> (Connection<DuplexStream>, DuplexStream) {
        let (client, mut server) = tokio::io::duplex(4096);
        server_write(&mut server, r#"{"op":"connection","connectionId":"c-1"}"#).await;
        let conn = Connection::establish(client).await.unwrap();
        (conn, server)
    }

    #[tokio::test]
    async fn test_establish_consumes_announcement() {
        let (conn, _server) = establish_pair().await;
        assert_eq!(conn.state(), ConnectionState::Connected);
        assert_eq!(conn.connection_id(), "c-1");
    }

    #[tokio::test]
    async fn test_debug_does_not_need_a_debug_stream() {
        let (conn, _server) = establish_pair().await;
        let rendered = format!("{conn:?}");
        assert!(rendered.contains("Connected"));
        assert!(rendered.contains("c-1"));
    }

    #[tokio::test]
    async fn test_establish_rejects_wrong_first_message() {
        let (client, mut server) = tokio::io::duplex(4096);
        server_write(&mut server, r#"{"op":"status","statusCode":"SUCCESS"}"#).await;

        let err = Connection::establish(client).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::UnexpectedMessage { expected: "connection" }
        ));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let (mut conn, mut server) = establish_pair().await;

        let handshake = tokio::spawn(async move {
            let mut buf = vec![0u8; 1024];
            let n = server.read(&mut buf).await.unwrap();
            let sent: serde_json::Value = serde_json::from_slice(&buf[..n - 2]).unwrap();
            assert_eq!(sent["op"], "authentication");
            assert_eq!(sent["id"], 1);
            assert_eq!(sent["session"], "tok");

            server_write(&mut server, r#"{"op":"status","id":1,"statusCode":"SUCCESS"}"#).await;
            server
        });

        conn.authenticate("tok", "key").await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Authenticated);
        handshake.await.unwrap();
    }

    #[tokio::test]
    async fn test_authenticate_failure_carries_error_code() {
        let (mut conn, mut server) = establish_pair().await;

        let handshake = tokio::spawn(async move {
            let mut buf = vec![0u8; 1024];
            let _ = server.read(&mut buf).await.unwrap();
            server_write(
                &mut server,
                r#"{"op":"status","id":1,"statusCode":"FAILURE","errorCode":"INVALID_SESSION_INFORMATION"}"#,
            )
            .await;
            server
        });

        let err = conn.authenticate("bad", "key").await.unwrap_err();
        match err {
            TransportError::AuthenticationFailed { error_code, .. } => {
                assert_eq!(
                    error_code,
                    Some(oddstream_protocol::ErrorCode::InvalidSessionInformation)
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(conn.state(), ConnectionState::Closed);
        handshake.await.unwrap();
    }

    #[tokio::test]
    async fn test_read_after_peer_close_is_terminal() {
        let (mut conn, server) = establish_pair().await;
        drop(server);

        let err = conn.read_frame().await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed));
        assert_eq!(conn.state(), ConnectionState::Closed);

        // No resurrection: every further operation fails fast.
        let err = conn.read_frame().await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[tokio::test]
    async fn test_request_ids_increase() {
        let (mut conn, mut server) = establish_pair().await;

        let handshake = tokio::spawn(async move {
            let mut buf = vec![0u8; 2048];
            let _ = server.read(&mut buf).await.unwrap();
            server_write(&mut server, r#"{"op":"status","id":1,"statusCode":"SUCCESS"}"#).await;
            let _ = server.read(&mut buf).await.unwrap();
            server_write(&mut server, r#"{"op":"status","id":2,"statusCode":"SUCCESS"}"#).await;
            server
        });

        conn.authenticate("tok", "key").await.unwrap();
        let status = conn
            .subscribe(RequestMessage::MarketSubscription(Default::default()))
            .await
            .unwrap();
        assert_eq!(status.id, Some(2));
        assert_eq!(conn.state(), ConnectionState::Subscribed);
        handshake.await.unwrap();
    }
}
