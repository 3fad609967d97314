use std::time::Duration;

use bytes::Bytes;
use redis_server::resp::RespValue;
use tokio::time::sleep;

use crate::test_utils::{TestServer, TestUtils, eventually};

#[tokio::test]
async fn test_pipelined_commands_are_answered_in_order() {
    let server = TestServer::start(&[]).await;
    let mut client = server.connect().await;

    let mut pipeline = RespValue::command(&["SET", "fruit", "apple"]).encode().to_vec();
    pipeline.extend_from_slice(&RespValue::command(&["GET", "fruit"]).encode());
    pipeline.extend_from_slice(&RespValue::command(&["ECHO", "done"]).encode());
    client.write_raw(&pipeline).await;

    assert_eq!(client.read().await, TestUtils::simple("OK"));
    assert_eq!(client.read().await, TestUtils::bulk("apple"));
    assert_eq!(client.read().await, TestUtils::bulk("done"));
}

#[tokio::test]
async fn test_commands_split_across_writes() {
    let server = TestServer::start(&[]).await;
    let mut client = server.connect().await;

    client.write_raw(b"*2\r\n$4\r\nEC").await;
    tokio::task::yield_now().await;
    client.write_raw(b"HO\r\n$3\r\nhey\r\n").await;

    assert_eq!(client.read().await, TestUtils::bulk("hey"));
}

#[tokio::test]
async fn test_inline_commands() {
    let server = TestServer::start(&[]).await;
    let mut client = server.connect().await;

    client.write_raw(b"PING\r\n").await;
    assert_eq!(client.read().await, TestUtils::simple("PONG"));
}

#[tokio::test]
async fn test_protocol_error_closes_the_connection() {
    let server = TestServer::start(&[]).await;
    let mut client = server.connect().await;

    client.write_raw(b"*x\r\n").await;

    let RespValue::Error(message) = client.read().await else {
        panic!("a protocol error should be reported before closing");
    };
    assert!(message.starts_with("ERR Protocol error"));
    assert!(client.is_closed().await);

    // Other connections are unaffected.
    let mut other = server.connect().await;
    assert_eq!(other.request(&["PING"]).await, TestUtils::simple("PONG"));
}

#[tokio::test]
async fn test_quit_closes_the_connection() {
    let server = TestServer::start(&[]).await;
    let mut client = server.connect().await;

    assert_eq!(client.request(&["QUIT"]).await, TestUtils::simple("OK"));
    assert!(client.is_closed().await);
}

#[tokio::test]
async fn test_closed_subscriber_is_forgotten() {
    let server = TestServer::start(&[]).await;
    let mut subscriber = server.connect().await;
    let mut publisher = server.connect().await;

    assert_eq!(
        subscriber.request(&["SUBSCRIBE", "news"]).await,
        RespValue::Array(vec![
            TestUtils::bulk("subscribe"),
            TestUtils::bulk("news"),
            TestUtils::int(1),
        ])
    );
    assert_eq!(
        publisher.request(&["PUBLISH", "news", "hi"]).await,
        TestUtils::int(1)
    );
    assert_eq!(
        subscriber.read().await,
        TestUtils::bulk_array(&["message", "news", "hi"])
    );

    drop(subscriber);

    // Delivery keeps succeeding until the connection task notices the close.
    assert!(
        eventually(|| {
            let pub_sub = server.context.pub_sub.clone();
            async move { pub_sub.publish(&Bytes::from("news"), Bytes::new()).await == 0 }
        })
        .await
    );
    assert_eq!(
        publisher.request(&["PUBLISH", "news", "hi"]).await,
        TestUtils::int(0)
    );
}

#[tokio::test]
async fn test_blocked_client_over_tcp() {
    let server = TestServer::start(&[]).await;
    let mut waiter = server.connect().await;
    let mut pusher = server.connect().await;

    waiter.send(&["BLPOP", "jobs", "0"]).await;
    // Input sent while blocked is answered after the pop.
    waiter.send(&["PING"]).await;

    assert_eq!(pusher.request(&["LPUSH", "jobs", "build"]).await, TestUtils::int(1));

    assert_eq!(
        waiter.read().await,
        TestUtils::bulk_array(&["jobs", "build"])
    );
    assert_eq!(waiter.read().await, TestUtils::simple("PONG"));
}

#[tokio::test]
async fn test_blocked_client_times_out_while_input_keeps_arriving() {
    let server = TestServer::start(&[]).await;
    let mut waiter = server.connect().await;

    waiter.send(&["BLPOP", "jobs", "0.1"]).await;

    // Bytes arrive faster than the retry interval for well past the timeout.
    for _ in 0..60 {
        waiter.write_raw(b" ").await;
        sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(waiter.read().await, RespValue::NullArray);
}
