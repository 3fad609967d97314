use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    resp::RespValue,
};

pub struct PingArguments {
    message: Option<Bytes>,
}

impl PingArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("ping", arguments, 0, Some(1))?;

        Ok(Self {
            message: arguments.first().cloned(),
        })
    }
}

/// Handles the Redis PING command.
///
/// Replies `PONG`, or echoes the optional message back as a bulk string.
pub fn ping(arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let ping_arguments = PingArguments::parse(arguments)?;

    let response = match ping_arguments.message {
        Some(message) => RespValue::BulkString(message),
        None => RespValue::simple_string("PONG"),
    };

    Ok(CommandResult::Response(response))
}
