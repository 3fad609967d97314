//! REPLCONF command implementation for Redis replication configuration.
//!
//! The handshake uses `listening-port` and `capa`; afterwards the leader asks
//! followers for their offset with `GETACK *` and they answer with `ACK`.

use bytes::Bytes;

use crate::{
    commands::{
        CommandError, CommandResult,
        command_utils::{as_str, check_arity, is_option, parse_integer},
    },
    replication::ReplicationCoordinator,
    resp::RespValue,
    server::ClientId,
};

enum ReplconfConfiguration {
    ListeningPort,
    Capabilities,
    GetAck,
    Ack(u64),
}

/// Represents the parsed arguments for the REPLCONF command.
pub struct ReplconfArguments {
    configuration: ReplconfConfiguration,
}

impl ReplconfArguments {
    /// Parses `option value [option value ...]`.
    ///
    /// # Returns
    ///
    /// * `Ok(ReplconfArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If options and values don't pair up
    /// * `Err(CommandError::UnknownReplconfOption)` - For any other option
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("replconf", arguments, 2, None)?;

        if arguments.len() % 2 != 0 {
            return Err(CommandError::SyntaxError);
        }

        let option = &arguments[0];
        let value = &arguments[1];

        let configuration = if is_option(option, "listening-port") {
            parse_integer::<u16>(value)?;
            ReplconfConfiguration::ListeningPort
        } else if is_option(option, "capa") {
            ReplconfConfiguration::Capabilities
        } else if is_option(option, "getack") {
            ReplconfConfiguration::GetAck
        } else if is_option(option, "ack") {
            ReplconfConfiguration::Ack(parse_integer(value)?)
        } else {
            return Err(CommandError::UnknownReplconfOption(
                as_str(option).unwrap_or("?").to_string(),
            ));
        };

        Ok(Self { configuration })
    }
}

/// Handles the Redis REPLCONF command.
///
/// # Returns
///
/// * `listening-port` and `capa` - `OK`
/// * `GETACK *` - `REPLCONF ACK <offset>` with the follower's processed offset
/// * `ACK <offset>` - No reply; the offset is recorded for WAIT
pub async fn replconf(
    client_id: ClientId,
    replication: &ReplicationCoordinator,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let replconf_arguments = ReplconfArguments::parse(arguments)?;

    match replconf_arguments.configuration {
        ReplconfConfiguration::ListeningPort | ReplconfConfiguration::Capabilities => {
            Ok(CommandResult::Response(RespValue::ok()))
        }
        ReplconfConfiguration::GetAck => {
            let offset = replication.follower_offset().await;

            Ok(CommandResult::Response(RespValue::command(&[
                "REPLCONF",
                "ACK",
                &offset.to_string(),
            ])))
        }
        ReplconfConfiguration::Ack(offset) => {
            replication.record_ack(client_id, offset).await;

            Ok(CommandResult::NoResponse)
        }
    }
}
