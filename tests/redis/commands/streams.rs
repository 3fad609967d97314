use redis_server::{
    commands::CommandError,
    resp::RespValue,
    stream::StreamError,
};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_xadd_command() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client
        .exec_ok(
            &["XADD", "sensor", "1-1", "temperature", "36"],
            TestUtils::bulk("1-1"),
        )
        .await;
    client
        .exec_ok(&["XADD", "sensor", "1-*", "temperature", "37"], TestUtils::bulk("1-2"))
        .await;
    client
        .exec_ok(&["XADD", "sensor", "2-*", "temperature", "38"], TestUtils::bulk("2-0"))
        .await;
    client
        .exec_ok(&["XADD", "other", "0-*", "humidity", "80"], TestUtils::bulk("0-1"))
        .await;

    let RespValue::BulkString(id) = client
        .exec_single(&["XADD", "sensor", "*", "temperature", "39"])
        .await
    else {
        panic!("XADD * should answer with the new id");
    };
    let (ms, seq) = std::str::from_utf8(&id).unwrap().split_once('-').unwrap();
    assert!(ms.parse::<u64>().unwrap() > 2);
    assert_eq!(seq, "0");
}

#[tokio::test]
async fn test_handle_xadd_command_rejects_invalid_ids() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client
        .exec_error(
            &["XADD", "sensor", "0-0", "temperature", "36"],
            CommandError::Stream(StreamError::ZeroId),
        )
        .await;
    // A rejected first entry does not create the key.
    client.exec_ok(&["TYPE", "sensor"], TestUtils::simple("none")).await;

    client
        .exec_ok(&["XADD", "sensor", "5-3", "temperature", "36"], TestUtils::bulk("5-3"))
        .await;

    for id in ["5-3", "5-2", "4-9"] {
        client
            .exec_error(
                &["XADD", "sensor", id, "temperature", "36"],
                CommandError::Stream(StreamError::NotIncreasing),
            )
            .await;
    }

    client
        .exec_error(
            &["XADD", "sensor", "five", "temperature", "36"],
            CommandError::Stream(StreamError::InvalidId),
        )
        .await;
    client
        .exec_error(
            &["XADD", "sensor", "6-0", "temperature"],
            CommandError::WrongNumberOfArguments("xadd".to_string()),
        )
        .await;

    client
        .exec_ok(
            &["XADD", "sensor", "7-18446744073709551615", "temperature", "36"],
            TestUtils::bulk("7-18446744073709551615"),
        )
        .await;
    client
        .exec_error(
            &["XADD", "sensor", "7-*", "temperature", "37"],
            CommandError::Stream(StreamError::NotIncreasing),
        )
        .await;

    client.exec_ok(&["SET", "name", "x"], TestUtils::simple("OK")).await;
    client
        .exec_error(&["XADD", "name", "1-1", "f", "v"], CommandError::WrongType)
        .await;
}

#[tokio::test]
async fn test_handle_xrange_command() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    for (id, value) in [("1-1", "a"), ("1-2", "b"), ("2-0", "c"), ("3-5", "d")] {
        client
            .exec_ok(&["XADD", "log", id, "value", value], TestUtils::bulk(id))
            .await;
    }

    let entry = |id: &str, value: &str| TestUtils::stream_entry(id, &["value", value]);

    let test_cases = vec![
        (vec!["-", "+"], vec![entry("1-1", "a"), entry("1-2", "b"), entry("2-0", "c"), entry("3-5", "d")]),
        (vec!["1", "1"], vec![entry("1-1", "a"), entry("1-2", "b")]),
        (vec!["1-2", "2-0"], vec![entry("1-2", "b"), entry("2-0", "c")]),
        (vec!["2", "+"], vec![entry("2-0", "c"), entry("3-5", "d")]),
        (vec!["-", "+", "COUNT", "1"], vec![entry("1-1", "a")]),
        (
            vec!["2", "+", "COUNT", "18446744073709551615"],
            vec![entry("2-0", "c"), entry("3-5", "d")],
        ),
        (vec!["4", "+"], vec![]),
    ];

    for (range, expected) in test_cases {
        let mut command = vec!["XRANGE", "log"];
        command.extend(range);

        client.exec_ok(&command, RespValue::Array(expected)).await;
    }

    client
        .exec_ok(&["XRANGE", "missing", "-", "+"], RespValue::Array(Vec::new()))
        .await;
    client
        .exec_error(&["XRANGE", "log", "-", "+", "LIMIT", "1"], CommandError::SyntaxError)
        .await;
}

#[tokio::test]
async fn test_handle_xread_command() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    client
        .exec_ok(&["XADD", "a", "1-1", "x", "1"], TestUtils::bulk("1-1"))
        .await;
    client
        .exec_ok(&["XADD", "a", "1-2", "x", "2"], TestUtils::bulk("1-2"))
        .await;
    client
        .exec_ok(&["XADD", "b", "5-0", "y", "1"], TestUtils::bulk("5-0"))
        .await;

    client
        .exec_ok(
            &["XREAD", "STREAMS", "a", "b", "1-1", "0-0"],
            RespValue::Array(vec![
                RespValue::Array(vec![
                    TestUtils::bulk("a"),
                    RespValue::Array(vec![TestUtils::stream_entry("1-2", &["x", "2"])]),
                ]),
                RespValue::Array(vec![
                    TestUtils::bulk("b"),
                    RespValue::Array(vec![TestUtils::stream_entry("5-0", &["y", "1"])]),
                ]),
            ]),
        )
        .await;

    client
        .exec_ok(
            &["XREAD", "COUNT", "1", "STREAMS", "a", "0"],
            RespValue::Array(vec![RespValue::Array(vec![
                TestUtils::bulk("a"),
                RespValue::Array(vec![TestUtils::stream_entry("1-1", &["x", "1"])]),
            ])]),
        )
        .await;

    client
        .exec_ok(
            &["XREAD", "COUNT", "18446744073709551615", "STREAMS", "a", "1-1"],
            RespValue::Array(vec![RespValue::Array(vec![
                TestUtils::bulk("a"),
                RespValue::Array(vec![TestUtils::stream_entry("1-2", &["x", "2"])]),
            ])]),
        )
        .await;

    // Nothing newer than the latest entry, and no BLOCK.
    client
        .exec_ok(&["XREAD", "STREAMS", "a", "$"], RespValue::NullArray)
        .await;
    client
        .exec_ok(&["XREAD", "STREAMS", "missing", "0"], RespValue::NullArray)
        .await;

    client
        .exec_error(&["XREAD", "STREAMS", "a", "b", "0"], CommandError::UnbalancedStreams)
        .await;
    client
        .exec_error(&["XREAD", "LIMIT", "1", "STREAMS", "a", "0"], CommandError::SyntaxError)
        .await;
}
