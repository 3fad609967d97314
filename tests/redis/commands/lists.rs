use redis_server::{commands::CommandError, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_rpush_and_lpush_commands() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client
        .exec_ok(&["RPUSH", "fruits", "apple", "banana"], TestUtils::int(2))
        .await;
    client
        .exec_ok(&["LPUSH", "fruits", "kiwi", "grape"], TestUtils::int(4))
        .await;
    client
        .exec_ok(
            &["LRANGE", "fruits", "0", "-1"],
            TestUtils::bulk_array(&["grape", "kiwi", "apple", "banana"]),
        )
        .await;
    client.exec_ok(&["LLEN", "fruits"], TestUtils::int(4)).await;
    client.exec_ok(&["LLEN", "vegetables"], TestUtils::int(0)).await;

    client.exec_ok(&["SET", "name", "x"], TestUtils::simple("OK")).await;
    client
        .exec_error(&["RPUSH", "name", "a"], CommandError::WrongType)
        .await;
    client
        .exec_error(
            &["LPUSH", "fruits"],
            CommandError::WrongNumberOfArguments("lpush".to_string()),
        )
        .await;
}

#[tokio::test]
async fn test_handle_lrange_command() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client
        .exec_ok(&["RPUSH", "letters", "a", "b", "c", "d", "e"], TestUtils::int(5))
        .await;

    let test_cases = vec![
        (("0", "1"), vec!["a", "b"]),
        (("2", "10"), vec!["c", "d", "e"]),
        (("-2", "-1"), vec!["d", "e"]),
        (("-10", "0"), vec!["a"]),
        (("3", "1"), vec![]),
        (("5", "6"), vec![]),
    ];

    for ((start, stop), expected) in test_cases {
        client
            .exec_ok(
                &["LRANGE", "letters", start, stop],
                TestUtils::bulk_array(&expected),
            )
            .await;
    }

    client
        .exec_ok(&["LRANGE", "missing", "0", "-1"], RespValue::Array(Vec::new()))
        .await;
    client
        .exec_error(&["LRANGE", "letters", "a", "1"], CommandError::NotAnInteger)
        .await;
}

#[tokio::test]
async fn test_handle_lpop_command() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client
        .exec_ok(&["RPUSH", "queue", "one", "two", "three", "four"], TestUtils::int(4))
        .await;

    client.exec_ok(&["LPOP", "queue"], TestUtils::bulk("one")).await;
    client
        .exec_ok(&["LPOP", "queue", "2"], TestUtils::bulk_array(&["two", "three"]))
        .await;
    client
        .exec_ok(&["LPOP", "queue", "5"], TestUtils::bulk_array(&["four"]))
        .await;

    // The emptied list no longer exists.
    client.exec_ok(&["TYPE", "queue"], TestUtils::simple("none")).await;
    client.exec_ok(&["LPOP", "queue"], RespValue::NullBulkString).await;
    client.exec_ok(&["LPOP", "queue", "1"], RespValue::NullArray).await;
}

#[tokio::test]
async fn test_handle_blpop_with_available_data() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client.exec_ok(&["RPUSH", "second", "job"], TestUtils::int(1)).await;
    client
        .exec_ok(
            &["BLPOP", "first", "second", "0"],
            TestUtils::bulk_array(&["second", "job"]),
        )
        .await;

    client
        .exec_error(&["BLPOP", "first", "-1"], CommandError::NegativeTimeout)
        .await;
    client
        .exec_error(&["BLPOP", "first", "later"], CommandError::InvalidTimeout)
        .await;
    client
        .exec_error(&["BLPOP", "first", "1e300"], CommandError::InvalidTimeout)
        .await;
}
