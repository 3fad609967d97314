use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    resp::RespValue,
};

pub struct EchoArguments {
    message: Bytes,
}

impl EchoArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("echo", arguments, 1, Some(1))?;

        Ok(Self {
            message: arguments[0].clone(),
        })
    }
}

/// Handles the Redis ECHO command.
///
/// # Examples
///
/// ```ignore
/// // ECHO "hello world"
/// let result = echo(&[Bytes::from("hello world")]);
/// // Returns: "$11\r\nhello world\r\n"
/// ```
pub fn echo(arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let echo_arguments = EchoArguments::parse(arguments)?;

    Ok(CommandResult::Response(RespValue::BulkString(
        echo_arguments.message,
    )))
}
