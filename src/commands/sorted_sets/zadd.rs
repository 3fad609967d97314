use bytes::Bytes;
use rust_decimal::Decimal;

use crate::{
    commands::{
        CommandError, CommandResult,
        command_utils::{check_arity, parse_score},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ZaddArguments {
    key: Bytes,
    members: Vec<(Decimal, Bytes)>,
}

impl ZaddArguments {
    /// Parses `key score member [score member ...]`. Every score is
    /// validated before anything is inserted.
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("zadd", arguments, 3, None)?;

        if arguments[1..].len() % 2 != 0 {
            return Err(CommandError::SyntaxError);
        }

        let members = arguments[1..]
            .chunks_exact(2)
            .map(|pair| Ok((parse_score(&pair[0])?, pair[1].clone())))
            .collect::<Result<Vec<_>, CommandError>>()?;

        Ok(Self {
            key: arguments[0].clone(),
            members,
        })
    }
}

/// Handles the Redis ZADD command.
///
/// Replies with the number of members that were not in the set before.
/// Members already present only get their score updated.
pub fn zadd(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let zadd_arguments = ZaddArguments::parse(arguments)?;

    let set = store.sorted_set_entry(&zadd_arguments.key)?;

    let added = zadd_arguments
        .members
        .into_iter()
        .filter(|(score, member)| set.insert(member.clone(), *score))
        .count();

    Ok(CommandResult::Response(RespValue::Integer(added as i64)))
}
