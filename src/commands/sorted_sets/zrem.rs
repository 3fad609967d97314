use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ZremArguments {
    key: Bytes,
    members: Vec<Bytes>,
}

impl ZremArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("zrem", arguments, 2, None)?;

        Ok(Self {
            key: arguments[0].clone(),
            members: arguments[1..].to_vec(),
        })
    }
}

/// Replies with the number of members removed. A set left empty is deleted.
pub fn zrem(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let zrem_arguments = ZremArguments::parse(arguments)?;

    if store.get_sorted_set(&zrem_arguments.key)?.is_none() {
        return Ok(CommandResult::Response(RespValue::Integer(0)));
    }

    let set = store.sorted_set_entry(&zrem_arguments.key)?;
    let removed = zrem_arguments
        .members
        .iter()
        .filter(|member| set.remove(member))
        .count();

    store.remove_if_empty(&zrem_arguments.key);

    Ok(CommandResult::Response(RespValue::Integer(removed as i64)))
}
