use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct TypeArguments {
    key: Bytes,
}

impl TypeArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("type", arguments, 1, Some(1))?;

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

pub fn type_command(
    store: &mut KeyValueStore,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;

    let type_name = store
        .get(&type_arguments.key)
        .map_or("none", |value| value.data.type_name());

    Ok(CommandResult::Response(RespValue::simple_string(type_name)))
}
