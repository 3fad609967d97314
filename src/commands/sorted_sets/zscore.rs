use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    key_value_store::KeyValueStore,
    resp::RespValue,
    sorted_set::format_score,
};

pub struct ZscoreArguments {
    key: Bytes,
    member: Bytes,
}

impl ZscoreArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("zscore", arguments, 2, Some(2))?;

        Ok(Self {
            key: arguments[0].clone(),
            member: arguments[1].clone(),
        })
    }
}

pub fn zscore(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let zscore_arguments = ZscoreArguments::parse(arguments)?;

    let score = store
        .get_sorted_set(&zscore_arguments.key)?
        .and_then(|set| set.score(&zscore_arguments.member));

    let response = match score {
        Some(score) => RespValue::bulk_string(format_score(score)),
        None => RespValue::NullBulkString,
    };

    Ok(CommandResult::Response(response))
}
