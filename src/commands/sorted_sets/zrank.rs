use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ZrankArguments {
    key: Bytes,
    member: Bytes,
}

impl ZrankArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("zrank", arguments, 2, Some(2))?;

        Ok(Self {
            key: arguments[0].clone(),
            member: arguments[1].clone(),
        })
    }
}

pub fn zrank(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let zrank_arguments = ZrankArguments::parse(arguments)?;

    let rank = store
        .get_sorted_set(&zrank_arguments.key)?
        .and_then(|set| set.rank(&zrank_arguments.member));

    let response = match rank {
        Some(rank) => RespValue::Integer(rank as i64),
        None => RespValue::NullBulkString,
    };

    Ok(CommandResult::Response(response))
}
