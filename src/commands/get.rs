use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct GetArguments {
    key: Bytes,
}

impl GetArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("get", arguments, 1, Some(1))?;

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Handles the Redis GET command.
///
/// Retrieves the value associated with a key from the key-value store.
/// Keys whose expiration time has passed are evicted by the lookup and
/// reported as absent.
///
/// # Returns
///
/// * `Ok(CommandResult::Response)` with either:
///   - a bulk string containing the value
///   - a null bulk string when the key does not exist or has expired
/// * `Err(CommandError::WrongType)` - If the key holds a list, stream or sorted set
/// * `Err(CommandError::WrongNumberOfArguments)` - If not exactly one key is given
pub fn get(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    let response = match store.get_string(&get_arguments.key)? {
        Some(value) => RespValue::BulkString(value.clone()),
        None => RespValue::NullBulkString,
    };

    Ok(CommandResult::Response(response))
}
