//! Pool behaviour across several live connections.

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, DuplexStream};

use oddstream_transport::{Connection, ConnectionPool, PoolEvent, TransportError};

async fn establish() -> (Connection<DuplexStream>, DuplexStream) {
    let (client, mut server) = tokio::io::duplex(4096);
    server
        .write_all(b"{\"op\":\"connection\",\"connectionId\":\"it\"}\r\n")
        .await
        .unwrap();
    let conn = Connection::establish(client).await.unwrap();
    (conn, server)
}

#[tokio::test]
async fn one_failing_member_does_not_stop_the_pool() {
    let mut pool = ConnectionPool::new();

    let (conn_a, mut server_a) = establish().await;
    let (conn_b, server_b) = establish().await;
    let (conn_c, mut server_c) = establish().await;

    let id_a = pool.add(conn_a);
    let id_b = pool.add(conn_b);
    let id_c = pool.add(conn_c);
    assert_eq!(pool.len(), 3);

    server_a.write_all(b"a1\r\n").await.unwrap();
    server_c.write_all(b"c1\r\n").await.unwrap();
    drop(server_b);

    let mut frames = Vec::new();
    let mut closed = Vec::new();
    for _ in 0..3 {
        match pool.next().await.unwrap() {
            PoolEvent::Frame(id, frame) => frames.push((id, frame.to_vec())),
            PoolEvent::Closed(id, err) => {
                assert!(matches!(err, TransportError::ConnectionClosed));
                closed.push(id);
            }
        }
    }

    assert_eq!(closed, vec![id_b]);
    frames.sort();
    assert_eq!(frames, vec![(id_a, b"a1".to_vec()), (id_c, b"c1".to_vec())]);
    assert_eq!(pool.len(), 2);

    // Survivors keep delivering after the removal.
    server_a.write_all(b"a2\r\n").await.unwrap();
    match pool.next().await.unwrap() {
        PoolEvent::Frame(id, frame) => {
            assert_eq!(id, id_a);
            assert_eq!(&frame[..], b"a2");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn next_event_without_timeout_waits_for_a_frame() {
    let mut pool = ConnectionPool::new();
    let (conn, mut server) = establish().await;
    let id = pool.add(conn);

    server.write_all(b"tick\r\n").await.unwrap();

    match pool.next_event(None).await.unwrap().unwrap() {
        PoolEvent::Frame(from, frame) => {
            assert_eq!(from, id);
            assert_eq!(&frame[..], b"tick");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}
