//! End-to-end flow against a scripted in-process exchange.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use oddstream_cache::OrderKey;
use oddstream_client::{CacheSet, Update};
use oddstream_protocol::{
    MarketSubscriptionMessage, RequestMessage, Side, StatusCode,
};
use oddstream_transport::{Connection, ConnectionPool, PoolEvent, TransportError};

async fn write_frame(stream: &mut TcpStream, frame: &str) {
    stream.write_all(frame.as_bytes()).await.unwrap();
    stream.write_all(b"\r\n").await.unwrap();
}

/// Scripted exchange: announce, accept auth and one subscription, stream a
/// market image, a delta and an order update, then hang up.
async fn run_exchange(listener: TcpListener) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut stream = stream;
    write_frame(&mut stream, r#"{"op":"connection","connectionId":"002-1"}"#).await;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    reader.read_line(&mut line).await.unwrap();
    let auth: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(auth["op"], "authentication");
    assert_eq!(auth["session"], "tok");
    write_frame(
        reader.get_mut(),
        r#"{"op":"status","id":1,"statusCode":"SUCCESS","connectionsAvailable":9}"#,
    )
    .await;

    line.clear();
    reader.read_line(&mut line).await.unwrap();
    let sub: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(sub["op"], "marketSubscription");
    write_frame(
        reader.get_mut(),
        r#"{"op":"status","id":2,"statusCode":"SUCCESS"}"#,
    )
    .await;

    write_frame(
        reader.get_mut(),
        r#"{"op":"mcm","id":2,"pt":100,"ct":"SUB_IMAGE","mc":[{"id":"1.100","img":true,
            "marketDefinition":{"version":1,"status":"OPEN","bettingType":"ODDS",
                "runners":[{"id":101,"sortPriority":1,"status":"ACTIVE"},
                           {"id":102,"sortPriority":2,"status":"ACTIVE"}]},
            "rc":[{"id":101,"bdatb":[[0,1.2,24]],"atb":[[1.5,10]]}]}]}"#,
    )
    .await;
    write_frame(
        reader.get_mut(),
        r#"{"op":"mcm","id":2,"pt":200,"mc":[{"id":"1.100","rc":[{"id":101,"ltp":1.21,"trd":[[1.21,50]]}]}]}"#,
    )
    .await;
    write_frame(
        reader.get_mut(),
        r#"{"op":"ocm","pt":300,"oc":[{"id":"1.100","orc":[{"id":101,
            "uo":[{"id":"b-1","p":1.2,"s":30,"side":"B","status":"E","ot":"L",
                   "pd":1,"sm":0,"sr":30,"sl":0,"sc":0,"sv":0}]}]}]}"#,
    )
    .await;
}

#[tokio::test]
async fn stream_flow_fills_both_caches() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let exchange = tokio::spawn(run_exchange(listener));

    let stream = TcpStream::connect(addr).await.unwrap();
    let mut connection = Connection::establish(stream).await.unwrap();
    assert_eq!(connection.connection_id(), "002-1");

    connection.authenticate("tok", "key").await.unwrap();
    let status = connection
        .subscribe(RequestMessage::MarketSubscription(
            MarketSubscriptionMessage::default(),
        ))
        .await
        .unwrap();
    assert_eq!(status.status_code, StatusCode::Success);

    let mut pool = ConnectionPool::new();
    let id = pool.add(connection);

    let mut caches = CacheSet::new();
    let mut market_updates = 0;
    let mut order_updates = 0;

    loop {
        match pool.next_event(None).await.unwrap() {
            Some(PoolEvent::Frame(from, frame)) => {
                assert_eq!(from, id);
                match caches.apply_frame(&frame).unwrap() {
                    Update::Markets(books) if !books.is_empty() => market_updates += 1,
                    Update::Orders(orders) if !orders.is_empty() => order_updates += 1,
                    _ => {}
                }
            }
            Some(PoolEvent::Closed(from, err)) => {
                assert_eq!(from, id);
                assert!(matches!(err, TransportError::ConnectionClosed));
                break;
            }
            None => break,
        }
    }
    exchange.await.unwrap();

    assert_eq!(market_updates, 2);
    assert_eq!(order_updates, 1);

    let book = caches.markets().get("1.100").unwrap();
    assert_eq!(book.best_display(101, Side::Back, 0), Some((1.2, 24.0)));
    assert_eq!(book.available(101, Side::Back, 1.5), Some(10.0));
    assert_eq!(book.last_traded_price(101), Some(1.21));
    assert_eq!(book.traded_volume(101, 1.21), Some(50.0));
    assert_eq!(book.publish_time(), 200);

    let key = OrderKey::new("1.100", 101, Side::Back);
    assert_eq!(caches.orders().size_remaining(&key), 30.0);
    assert_eq!(caches.orders().trade_balance("1.100", 101), 30);
}
