use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    resp::RespValue,
};

pub struct SubscribePingArguments {
    message: Bytes,
}

impl SubscribePingArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("ping", arguments, 0, Some(1))?;

        Ok(Self {
            message: arguments.first().cloned().unwrap_or_default(),
        })
    }
}

/// PING while subscribed replies `["pong", message]`, the message being empty
/// unless one is given.
pub fn subscribe_ping(arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let ping_arguments = SubscribePingArguments::parse(arguments)?;

    Ok(CommandResult::Response(RespValue::Array(vec![
        RespValue::bulk_string("pong"),
        RespValue::BulkString(ping_arguments.message),
    ])))
}
