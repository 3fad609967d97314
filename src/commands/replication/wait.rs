use bytes::Bytes;
use tokio::time::Duration;

use crate::{
    commands::{
        CommandError, CommandResult,
        command_utils::{check_arity, parse_integer, parse_timeout_millis},
    },
    replication::ReplicationCoordinator,
    resp::RespValue,
    server::ClientId,
};

pub struct WaitArguments {
    pub number_of_replicas: usize,
    pub timeout: Option<Duration>,
}

impl WaitArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("wait", arguments, 2, Some(2))?;

        Ok(Self {
            number_of_replicas: parse_integer(&arguments[0])?,
            timeout: parse_timeout_millis(&arguments[1])?,
        })
    }
}

/// Handles the Redis WAIT command.
///
/// Holds the calling connection until `numreplicas` followers acknowledged
/// every write propagated before the call, or the timeout passes (`0` waits
/// forever). Replies with the number of followers that acknowledged.
///
/// When `can_block` is false, as inside EXEC, the current count is returned
/// without waiting.
pub async fn wait(
    client_id: ClientId,
    replication: &ReplicationCoordinator,
    arguments: &[Bytes],
    can_block: bool,
) -> Result<CommandResult, CommandError> {
    let wait_arguments = WaitArguments::parse(arguments)?;

    if !replication.role().is_master() {
        return Err(CommandError::WaitOnReplica);
    }

    let timeout = if can_block {
        wait_arguments.timeout
    } else {
        Some(Duration::ZERO)
    };

    let acknowledged = replication
        .wait_for_acks(client_id, wait_arguments.number_of_replicas, timeout)
        .await;

    Ok(CommandResult::Response(RespValue::Integer(
        acknowledged as i64,
    )))
}
