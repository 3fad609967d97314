use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct PushArrayOperations {
    key: Bytes,
    values: Vec<Bytes>,
}

impl PushArrayOperations {
    pub fn parse(arguments: &[Bytes], should_prepend: bool) -> Result<Self, CommandError> {
        let name = if should_prepend { "lpush" } else { "rpush" };
        check_arity(name, arguments, 2, None)?;

        Ok(Self {
            key: arguments[0].clone(),
            values: arguments[1..].to_vec(),
        })
    }
}

pub fn rpush(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    push_array_operations(store, arguments, false)
}

/// Values are prepended one at a time, so `LPUSH list a b c` leaves
/// `c b a` at the head of the list.
pub fn lpush(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    push_array_operations(store, arguments, true)
}

fn push_array_operations(
    store: &mut KeyValueStore,
    arguments: &[Bytes],
    should_prepend: bool,
) -> Result<CommandResult, CommandError> {
    let push_array_arguments = PushArrayOperations::parse(arguments, should_prepend)?;

    let list = store.list_entry(&push_array_arguments.key)?;

    for value in push_array_arguments.values {
        if should_prepend {
            list.push_front(value);
        } else {
            list.push_back(value);
        }
    }

    Ok(CommandResult::Response(RespValue::Integer(list.len() as i64)))
}
