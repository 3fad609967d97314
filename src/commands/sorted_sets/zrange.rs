use bytes::Bytes;

use crate::{
    commands::{
        CommandError, CommandResult,
        command_utils::{check_arity, parse_integer},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ZrangeArguments {
    key: Bytes,
    start: i64,
    stop: i64,
}

impl ZrangeArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("zrange", arguments, 3, Some(3))?;

        Ok(Self {
            key: arguments[0].clone(),
            start: parse_integer(&arguments[1])?,
            stop: parse_integer(&arguments[2])?,
        })
    }
}

/// Members between two inclusive ranks, lowest score first. Indices follow
/// the LRANGE rules.
pub fn zrange(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let zrange_arguments = ZrangeArguments::parse(arguments)?;

    let members = store
        .get_sorted_set(&zrange_arguments.key)?
        .map(|set| set.range(zrange_arguments.start, zrange_arguments.stop))
        .unwrap_or_default();

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings(
        members,
    )))
}
