use redis_server::{commands::CommandError, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils};

async fn seed_leaderboard(client: &mut crate::test_utils::TestClient) {
    client
        .exec_ok(
            &["ZADD", "board", "2", "banana", "1.5", "apple", "2", "cherry"],
            TestUtils::int(3),
        )
        .await;
}

#[tokio::test]
async fn test_handle_zadd_command() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    seed_leaderboard(&mut client).await;

    // Updating a score does not count as an addition.
    client
        .exec_ok(&["ZADD", "board", "0.5", "cherry", "3", "date"], TestUtils::int(1))
        .await;
    client.exec_ok(&["ZCARD", "board"], TestUtils::int(4)).await;

    client
        .exec_error(&["ZADD", "board", "high", "fig"], CommandError::NotAValidFloat)
        .await;
    client
        .exec_error(&["ZADD", "board", "1", "fig", "2"], CommandError::SyntaxError)
        .await;
    // Nothing from a rejected call is inserted.
    client.exec_ok(&["ZCARD", "board"], TestUtils::int(4)).await;

    client.exec_ok(&["RPUSH", "list", "a"], TestUtils::int(1)).await;
    client
        .exec_error(&["ZADD", "list", "1", "a"], CommandError::WrongType)
        .await;
}

#[tokio::test]
async fn test_handle_zrank_and_zrange_commands() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    seed_leaderboard(&mut client).await;

    // Equal scores are ordered by member.
    let test_cases = vec![("apple", 0), ("banana", 1), ("cherry", 2)];

    for (member, rank) in test_cases {
        client
            .exec_ok(&["ZRANK", "board", member], TestUtils::int(rank))
            .await;
    }

    client
        .exec_ok(&["ZRANK", "board", "fig"], RespValue::NullBulkString)
        .await;
    client
        .exec_ok(&["ZRANK", "missing", "fig"], RespValue::NullBulkString)
        .await;

    client
        .exec_ok(
            &["ZRANGE", "board", "0", "-1"],
            TestUtils::bulk_array(&["apple", "banana", "cherry"]),
        )
        .await;
    client
        .exec_ok(
            &["ZRANGE", "board", "-2", "10"],
            TestUtils::bulk_array(&["banana", "cherry"]),
        )
        .await;
    client
        .exec_ok(&["ZRANGE", "board", "2", "1"], RespValue::Array(Vec::new()))
        .await;
    client
        .exec_ok(&["ZRANGE", "missing", "0", "-1"], RespValue::Array(Vec::new()))
        .await;
}

#[tokio::test]
async fn test_handle_zscore_zcard_and_zrem_commands() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    seed_leaderboard(&mut client).await;

    client
        .exec_ok(&["ZSCORE", "board", "apple"], TestUtils::bulk("1.5"))
        .await;
    client
        .exec_ok(&["ZSCORE", "board", "banana"], TestUtils::bulk("2"))
        .await;
    client
        .exec_ok(&["ZSCORE", "board", "fig"], RespValue::NullBulkString)
        .await;

    client
        .exec_ok(&["ZREM", "board", "apple", "fig"], TestUtils::int(1))
        .await;
    client.exec_ok(&["ZCARD", "board"], TestUtils::int(2)).await;
    client
        .exec_ok(&["ZREM", "board", "banana", "cherry"], TestUtils::int(2))
        .await;

    // The emptied set no longer exists.
    client.exec_ok(&["TYPE", "board"], TestUtils::simple("none")).await;
    client.exec_ok(&["ZCARD", "board"], TestUtils::int(0)).await;
    client.exec_ok(&["ZREM", "board", "apple"], TestUtils::int(0)).await;
}
