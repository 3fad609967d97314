use std::time::Duration;

use redis_server::{commands::CommandError, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_get_and_set_commands() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client.exec_ok(&["GET", "grape"], RespValue::NullBulkString).await;
    client
        .exec_ok(&["SET", "grape", "mango"], TestUtils::simple("OK"))
        .await;
    client.exec_ok(&["get", "grape"], TestUtils::bulk("mango")).await;
    client
        .exec_ok(&["SET", "grape", "kiwi"], TestUtils::simple("OK"))
        .await;
    client.exec_ok(&["GET", "grape"], TestUtils::bulk("kiwi")).await;
}

#[tokio::test(start_paused = true)]
async fn test_handle_set_command_with_expiration() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client
        .exec_ok(&["SET", "grape", "mango", "PX", "100"], TestUtils::simple("OK"))
        .await;
    client
        .exec_ok(&["SET", "apple", "pear", "ex", "1"], TestUtils::simple("OK"))
        .await;

    tokio::time::advance(Duration::from_millis(99)).await;
    client.exec_ok(&["GET", "grape"], TestUtils::bulk("mango")).await;

    tokio::time::advance(Duration::from_millis(1)).await;
    client.exec_ok(&["GET", "grape"], RespValue::NullBulkString).await;
    client.exec_ok(&["GET", "apple"], TestUtils::bulk("pear")).await;

    tokio::time::advance(Duration::from_millis(900)).await;
    client.exec_ok(&["GET", "apple"], RespValue::NullBulkString).await;
    client
        .exec_ok(&["KEYS", "*"], RespValue::Array(Vec::new()))
        .await;
}

#[tokio::test]
async fn test_handle_set_command_invalid_options() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client
        .exec_error(&["SET", "grape"], CommandError::WrongNumberOfArguments("set".to_string()))
        .await;
    client
        .exec_error(&["SET", "grape", "mango", "PX"], CommandError::SyntaxError)
        .await;
    client
        .exec_error(&["SET", "grape", "mango", "XX", "10"], CommandError::SyntaxError)
        .await;
    client
        .exec_error(&["SET", "grape", "mango", "PX", "soon"], CommandError::NotAnInteger)
        .await;
    client
        .exec_error(&["SET", "grape", "mango", "PX", "0"], CommandError::InvalidExpireTime)
        .await;
    client
        .exec_error(
            &["SET", "grape", "mango", "EX", "9223372036854775807"],
            CommandError::InvalidExpireTime,
        )
        .await;
    client.exec_ok(&["GET", "grape"], RespValue::NullBulkString).await;
}

#[tokio::test]
async fn test_handle_incr_command() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client.exec_ok(&["INCR", "counter"], TestUtils::int(1)).await;
    client.exec_ok(&["INCR", "counter"], TestUtils::int(2)).await;
    client.exec_ok(&["GET", "counter"], TestUtils::bulk("2")).await;

    client
        .exec_ok(&["SET", "fruit", "apple"], TestUtils::simple("OK"))
        .await;
    client
        .exec_error(&["INCR", "fruit"], CommandError::NotAnInteger)
        .await;

    let max = i64::MAX.to_string();
    client
        .exec_ok(&["SET", "max", max.as_str()], TestUtils::simple("OK"))
        .await;
    client.exec_error(&["INCR", "max"], CommandError::Overflow).await;

    client.exec_ok(&["RPUSH", "list", "a"], TestUtils::int(1)).await;
    client.exec_error(&["INCR", "list"], CommandError::WrongType).await;
}

#[tokio::test(start_paused = true)]
async fn test_incr_keeps_the_expiry() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client
        .exec_ok(&["SET", "counter", "5", "PX", "100"], TestUtils::simple("OK"))
        .await;
    client.exec_ok(&["INCR", "counter"], TestUtils::int(6)).await;

    tokio::time::advance(Duration::from_millis(100)).await;
    client.exec_ok(&["GET", "counter"], RespValue::NullBulkString).await;
}

#[tokio::test]
async fn test_handle_type_command() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client.exec_ok(&["SET", "s", "v"], TestUtils::simple("OK")).await;
    client.exec_ok(&["RPUSH", "l", "v"], TestUtils::int(1)).await;
    client.exec_ok(&["XADD", "x", "1-1", "f", "v"], TestUtils::bulk("1-1")).await;
    client.exec_ok(&["ZADD", "z", "1", "m"], TestUtils::int(1)).await;

    let test_cases = vec![
        ("s", "string"),
        ("l", "list"),
        ("x", "stream"),
        ("z", "zset"),
        ("missing", "none"),
    ];

    for (key, expected) in test_cases {
        client
            .exec_ok(&["TYPE", key], TestUtils::simple(expected))
            .await;
    }
}

#[tokio::test]
async fn test_handle_keys_command() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    for key in ["grape", "grapefruit", "apple"] {
        client.exec_ok(&["SET", key, "1"], TestUtils::simple("OK")).await;
    }

    client
        .exec_ok(
            &["KEYS", "*"],
            TestUtils::bulk_array(&["apple", "grape", "grapefruit"]),
        )
        .await;
    client
        .exec_ok(
            &["KEYS", "grape*"],
            TestUtils::bulk_array(&["grape", "grapefruit"]),
        )
        .await;
    client
        .exec_ok(&["KEYS", "?pple"], TestUtils::bulk_array(&["apple"]))
        .await;
    client
        .exec_ok(&["KEYS", "kiwi"], RespValue::Array(Vec::new()))
        .await;
}

#[tokio::test]
async fn test_handle_ping_and_echo_commands() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client.exec_ok(&["PING"], TestUtils::simple("PONG")).await;
    client.exec_ok(&["PING", "hello"], TestUtils::bulk("hello")).await;
    client.exec_ok(&["ECHO", "hey"], TestUtils::bulk("hey")).await;
    client
        .exec_error(&["ECHO"], CommandError::WrongNumberOfArguments("echo".to_string()))
        .await;
}

#[tokio::test]
async fn test_unknown_command() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client
        .exec_error(&["FLY", "away"], CommandError::UnknownCommand("FLY".to_string()))
        .await;
}
