use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ZcardArguments {
    key: Bytes,
}

impl ZcardArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("zcard", arguments, 1, Some(1))?;

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

pub fn zcard(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let zcard_arguments = ZcardArguments::parse(arguments)?;

    let len = store
        .get_sorted_set(&zcard_arguments.key)?
        .map_or(0, |set| set.len());

    Ok(CommandResult::Response(RespValue::Integer(len as i64)))
}
