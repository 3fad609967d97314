use bytes::Bytes;

use crate::{
    commands::{
        CommandError, CommandResult,
        command_utils::{check_arity, parse_integer},
    },
    key_value_store::{DataType, KeyValueStore},
    resp::RespValue,
};

pub struct IncrArguments {
    key: Bytes,
}

impl IncrArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("incr", arguments, 1, Some(1))?;

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Handles the Redis INCR command.
///
/// An absent key starts from 0. The incremented value is stored back as a
/// string and keeps the key's expiration.
pub fn incr(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let incr_arguments = IncrArguments::parse(arguments)?;

    let Some(current) = store.get_string(&incr_arguments.key)? else {
        store.set(incr_arguments.key, DataType::String(Bytes::from("1")), None);
        return Ok(CommandResult::Response(RespValue::Integer(1)));
    };

    let incremented = parse_integer::<i64>(current)?
        .checked_add(1)
        .ok_or(CommandError::Overflow)?;

    store.update_in_place(
        &incr_arguments.key,
        DataType::String(Bytes::from(incremented.to_string())),
    );

    Ok(CommandResult::Response(RespValue::Integer(incremented)))
}
