use redis_server::{
    commands::{CommandError, DispatchResult},
    resp::RespValue,
};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_multi_exec_runs_queued_commands_in_order() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client.exec_ok(&["MULTI"], TestUtils::simple("OK")).await;
    client
        .exec_ok(&["SET", "counter", "41"], TestUtils::simple("QUEUED"))
        .await;
    client
        .exec_ok(&["INCR", "counter"], TestUtils::simple("QUEUED"))
        .await;
    client
        .exec_ok(&["GET", "counter"], TestUtils::simple("QUEUED"))
        .await;

    // Nothing ran yet.
    assert!(env.get_store().await.get(b"counter").is_none());

    client
        .exec_ok(
            &["EXEC"],
            RespValue::Array(vec![
                TestUtils::simple("OK"),
                TestUtils::int(42),
                TestUtils::bulk("42"),
            ]),
        )
        .await;

    assert!(!client.dispatcher.is_in_transaction());
    client.exec_ok(&["GET", "counter"], TestUtils::bulk("42")).await;
}

#[tokio::test]
async fn test_exec_reports_failing_commands_inline() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client.exec_ok(&["SET", "fruit", "apple"], TestUtils::simple("OK")).await;

    client.exec_ok(&["MULTI"], TestUtils::simple("OK")).await;
    client
        .exec_ok(&["INCR", "fruit"], TestUtils::simple("QUEUED"))
        .await;
    client
        .exec_ok(&["SET", "other", "1"], TestUtils::simple("QUEUED"))
        .await;
    client
        .exec_ok(
            &["EXEC"],
            RespValue::Array(vec![
                CommandError::NotAnInteger.as_resp(),
                TestUtils::simple("OK"),
            ]),
        )
        .await;

    client.exec_ok(&["GET", "other"], TestUtils::bulk("1")).await;
}

#[tokio::test]
async fn test_transaction_errors() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client
        .exec_error(&["EXEC"], CommandError::ExecWithoutMulti)
        .await;
    client
        .exec_error(&["DISCARD"], CommandError::DiscardWithoutMulti)
        .await;

    client.exec_ok(&["MULTI"], TestUtils::simple("OK")).await;
    client.exec_error(&["MULTI"], CommandError::NestedMulti).await;

    // Rejected commands are not queued, and the transaction stays open.
    client
        .exec_error(
            &["GET"],
            CommandError::WrongNumberOfArguments("get".to_string()),
        )
        .await;
    client
        .exec_error(&["FLY"], CommandError::UnknownCommand("FLY".to_string()))
        .await;
    assert!(client.dispatcher.is_in_transaction());

    client.exec_ok(&["EXEC"], RespValue::Array(Vec::new())).await;
}

#[tokio::test]
async fn test_discard_drops_queued_commands() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client.exec_ok(&["MULTI"], TestUtils::simple("OK")).await;
    client
        .exec_ok(&["SET", "fruit", "apple"], TestUtils::simple("QUEUED"))
        .await;
    client.exec_ok(&["DISCARD"], TestUtils::simple("OK")).await;

    assert!(!client.dispatcher.is_in_transaction());
    client.exec_ok(&["GET", "fruit"], RespValue::NullBulkString).await;
    client
        .exec_error(&["EXEC"], CommandError::ExecWithoutMulti)
        .await;
}

#[tokio::test]
async fn test_transactions_are_per_connection() {
    let env = TestEnv::new_master_server();
    let mut first = env.client();
    let mut second = env.client();

    first.exec_ok(&["MULTI"], TestUtils::simple("OK")).await;
    first
        .exec_ok(&["SET", "fruit", "apple"], TestUtils::simple("QUEUED"))
        .await;

    second.exec_ok(&["GET", "fruit"], RespValue::NullBulkString).await;
    second
        .exec_ok(&["SET", "fruit", "kiwi"], TestUtils::simple("OK"))
        .await;

    first
        .exec_ok(&["EXEC"], RespValue::Array(vec![TestUtils::simple("OK")]))
        .await;
    second.exec_ok(&["GET", "fruit"], TestUtils::bulk("apple")).await;
}

#[tokio::test]
async fn test_blocking_commands_inside_exec_do_not_block() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client.exec_ok(&["MULTI"], TestUtils::simple("OK")).await;
    client
        .exec_ok(&["BLPOP", "queue", "0"], TestUtils::simple("QUEUED"))
        .await;
    client
        .exec_ok(
            &["XREAD", "BLOCK", "0", "STREAMS", "events", "$"],
            TestUtils::simple("QUEUED"),
        )
        .await;

    assert_eq!(
        client.exec(&["EXEC"]).await,
        DispatchResult::Reply(vec![RespValue::Array(vec![
            RespValue::NullArray,
            RespValue::NullArray,
        ])])
    );
    assert!(!client.dispatcher.is_blocked());
}
