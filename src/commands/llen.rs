use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LlenArguments {
    key: Bytes,
}

impl LlenArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("llen", arguments, 1, Some(1))?;

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

pub fn llen(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let llen_arguments = LlenArguments::parse(arguments)?;

    let len = store
        .get_list(&llen_arguments.key)?
        .map_or(0, |list| list.len());

    Ok(CommandResult::Response(RespValue::Integer(len as i64)))
}
