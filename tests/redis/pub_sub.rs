use redis_server::{
    commands::{CommandError, DispatchResult},
    resp::RespValue,
};

use crate::test_utils::{TestEnv, TestUtils};

fn subscription_reply(kind: &str, channel: &str, count: i64) -> RespValue {
    RespValue::Array(vec![
        TestUtils::bulk(kind),
        TestUtils::bulk(channel),
        TestUtils::int(count),
    ])
}

#[tokio::test]
async fn test_subscribe_and_receive_messages() {
    let env = TestEnv::new_master_server();
    let mut subscriber = env.subscriber().await;
    let mut publisher = env.client();

    assert_eq!(
        subscriber.exec(&["SUBSCRIBE", "news", "sports"]).await,
        DispatchResult::Reply(vec![
            subscription_reply("subscribe", "news", 1),
            subscription_reply("subscribe", "sports", 2),
        ])
    );
    assert!(subscriber.dispatcher.is_subscribed());

    publisher
        .exec_ok(&["PUBLISH", "news", "hello"], TestUtils::int(1))
        .await;
    publisher
        .exec_ok(&["PUBLISH", "weather", "rain"], TestUtils::int(0))
        .await;

    assert_eq!(
        subscriber.next_pushed().await,
        TestUtils::bulk_array(&["message", "news", "hello"])
    );
}

#[tokio::test]
async fn test_publish_counts_every_subscriber() {
    let env = TestEnv::new_master_server();
    let mut first = env.subscriber().await;
    let mut second = env.subscriber().await;
    let mut publisher = env.client();

    first
        .exec_ok(&["SUBSCRIBE", "news"], subscription_reply("subscribe", "news", 1))
        .await;
    second
        .exec_ok(&["SUBSCRIBE", "news"], subscription_reply("subscribe", "news", 1))
        .await;

    publisher
        .exec_ok(&["PUBLISH", "news", "extra"], TestUtils::int(2))
        .await;

    for subscriber in [&mut first, &mut second] {
        assert_eq!(
            subscriber.next_pushed().await,
            TestUtils::bulk_array(&["message", "news", "extra"])
        );
    }
}

#[tokio::test]
async fn test_subscribed_mode_restricts_commands() {
    let env = TestEnv::new_master_server();
    let mut subscriber = env.subscriber().await;

    subscriber
        .exec_ok(&["SUBSCRIBE", "news"], subscription_reply("subscribe", "news", 1))
        .await;

    subscriber
        .exec_error(
            &["GET", "fruit"],
            CommandError::NotAllowedInSubscribedMode("get".to_string()),
        )
        .await;
    subscriber
        .exec_ok(&["PING"], TestUtils::bulk_array(&["pong", ""]))
        .await;
    subscriber
        .exec_ok(&["PING", "hi"], TestUtils::bulk_array(&["pong", "hi"]))
        .await;

    // Leaving the last channel restores normal mode.
    subscriber
        .exec_ok(
            &["UNSUBSCRIBE", "news"],
            subscription_reply("unsubscribe", "news", 0),
        )
        .await;
    assert!(!subscriber.dispatcher.is_subscribed());

    subscriber.exec_ok(&["PING"], TestUtils::simple("PONG")).await;
    subscriber
        .exec_ok(&["GET", "fruit"], RespValue::NullBulkString)
        .await;
}

#[tokio::test]
async fn test_unsubscribe_without_channels() {
    let env = TestEnv::new_master_server();
    let mut subscriber = env.subscriber().await;

    subscriber
        .exec_ok(
            &["UNSUBSCRIBE"],
            RespValue::Array(vec![
                TestUtils::bulk("unsubscribe"),
                RespValue::NullBulkString,
                TestUtils::int(0),
            ]),
        )
        .await;

    subscriber.exec(&["SUBSCRIBE", "a", "b"]).await;

    let DispatchResult::Reply(replies) = subscriber.exec(&["UNSUBSCRIBE"]).await else {
        panic!("UNSUBSCRIBE should reply");
    };
    assert_eq!(replies.len(), 2);
    assert_eq!(replies.last(), Some(&subscription_reply("unsubscribe", "b", 0)));
    assert!(!subscriber.dispatcher.is_subscribed());
}

#[tokio::test]
async fn test_unregistered_client_stops_receiving() {
    let env = TestEnv::new_master_server();
    let mut subscriber = env.subscriber().await;
    let mut publisher = env.client();

    subscriber
        .exec_ok(&["SUBSCRIBE", "news"], subscription_reply("subscribe", "news", 1))
        .await;

    env.context
        .pub_sub
        .unregister_client(subscriber.client_id())
        .await;

    publisher
        .exec_ok(&["PUBLISH", "news", "hello"], TestUtils::int(0))
        .await;
}
