use std::time::Duration;

use redis_server::{commands::DispatchResult, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_blpop_waits_for_a_push() {
    let env = TestEnv::new_master_server();
    let mut waiter = env.client();
    let mut pusher = env.client();

    assert_eq!(
        waiter.exec(&["BLPOP", "queue", "0"]).await,
        DispatchResult::Blocked
    );
    assert!(waiter.dispatcher.is_blocked());
    assert_eq!(waiter.dispatcher.poll_blocked().await, None);

    pusher
        .exec_ok(&["RPUSH", "queue", "job"], TestUtils::int(1))
        .await;

    assert_eq!(
        waiter.wait_unblocked().await,
        vec![TestUtils::bulk_array(&["queue", "job"])]
    );
    assert!(!waiter.dispatcher.is_blocked());

    // The pushed element was consumed by the waiter.
    pusher.exec_ok(&["LLEN", "queue"], TestUtils::int(0)).await;
}

#[tokio::test]
async fn test_first_blocked_client_is_served_first() {
    let env = TestEnv::new_master_server();
    let mut first = env.client();
    let mut second = env.client();
    let mut pusher = env.client();

    assert_eq!(first.exec(&["BLPOP", "queue", "0"]).await, DispatchResult::Blocked);
    assert_eq!(second.exec(&["BLPOP", "queue", "0"]).await, DispatchResult::Blocked);

    pusher
        .exec_ok(&["RPUSH", "queue", "only"], TestUtils::int(1))
        .await;

    assert_eq!(
        first.wait_unblocked().await,
        vec![TestUtils::bulk_array(&["queue", "only"])]
    );
    assert_eq!(second.dispatcher.poll_blocked().await, None);
    assert!(second.dispatcher.is_blocked());
}

#[tokio::test(start_paused = true)]
async fn test_blpop_times_out() {
    let env = TestEnv::new_master_server();
    let mut waiter = env.client();

    assert_eq!(
        waiter.exec(&["BLPOP", "queue", "0.5"]).await,
        DispatchResult::Blocked
    );

    tokio::time::advance(Duration::from_millis(499)).await;
    assert_eq!(waiter.dispatcher.poll_blocked().await, None);

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(
        waiter.dispatcher.poll_blocked().await,
        Some(vec![RespValue::NullArray])
    );
    assert!(!waiter.dispatcher.is_blocked());
}

#[tokio::test]
async fn test_xread_block_waits_for_new_entries() {
    let env = TestEnv::new_master_server();
    let mut reader = env.client();
    let mut writer = env.client();

    writer
        .exec_ok(&["XADD", "events", "1-1", "kind", "old"], TestUtils::bulk("1-1"))
        .await;

    assert_eq!(
        reader
            .exec(&["XREAD", "BLOCK", "0", "STREAMS", "events", "$"])
            .await,
        DispatchResult::Blocked
    );

    writer
        .exec_ok(&["XADD", "events", "2-1", "kind", "new"], TestUtils::bulk("2-1"))
        .await;

    assert_eq!(
        reader.wait_unblocked().await,
        vec![RespValue::Array(vec![RespValue::Array(vec![
            TestUtils::bulk("events"),
            RespValue::Array(vec![TestUtils::stream_entry("2-1", &["kind", "new"])]),
        ])])]
    );
}

#[tokio::test(start_paused = true)]
async fn test_xread_block_times_out() {
    let env = TestEnv::new_master_server();
    let mut reader = env.client();

    assert_eq!(
        reader
            .exec(&["XREAD", "BLOCK", "100", "STREAMS", "events", "0-0"])
            .await,
        DispatchResult::Blocked
    );

    tokio::time::advance(Duration::from_millis(100)).await;
    assert_eq!(
        reader.dispatcher.poll_blocked().await,
        Some(vec![RespValue::NullArray])
    );
}

#[tokio::test]
async fn test_blocked_pop_is_propagated_as_lpop() {
    let env = TestEnv::new_master_server();
    let mut waiter = env.client();
    let mut pusher = env.client();
    let mut follower = env.client();

    follower
        .exec_ok(&["REPLCONF", "listening-port", "6380"], TestUtils::simple("OK"))
        .await;
    assert_eq!(
        follower.exec(&["PSYNC", "?", "-1"]).await,
        DispatchResult::Reply(Vec::new())
    );

    let RespValue::SimpleString(full_resync) = follower.next_pushed().await else {
        panic!("PSYNC should push FULLRESYNC first");
    };
    assert!(full_resync.starts_with("FULLRESYNC "));
    // The snapshot is not a RESP frame; skip its raw bytes.
    follower.outbound.recv().await.unwrap();

    assert_eq!(waiter.exec(&["BLPOP", "queue", "0"]).await, DispatchResult::Blocked);
    pusher
        .exec_ok(&["RPUSH", "queue", "job"], TestUtils::int(1))
        .await;
    waiter.wait_unblocked().await;

    env.context.replication.broadcast().await;

    assert_eq!(
        follower.next_pushed().await,
        RespValue::command(&["RPUSH", "queue", "job"])
    );
    assert_eq!(
        follower.next_pushed().await,
        RespValue::command(&["LPOP", "queue"])
    );
}
