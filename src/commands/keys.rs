use bytes::Bytes;
use globset::Glob;

use crate::{
    commands::{
        CommandError, CommandResult,
        command_utils::{as_str, check_arity},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct KeysArguments {
    pattern: String,
}

impl KeysArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("keys", arguments, 1, Some(1))?;

        Ok(Self {
            pattern: as_str(&arguments[0])?.to_string(),
        })
    }
}

/// Lists the live keys matching a glob pattern. Listing sweeps expired
/// entries out of the store.
pub fn keys(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let keys_arguments = KeysArguments::parse(arguments)?;

    let glob = Glob::new(&keys_arguments.pattern)
        .map_err(|e| CommandError::InvalidGlobPattern(e.to_string()))?
        .compile_matcher();

    let mut matching: Vec<Bytes> = store
        .keys()
        .into_iter()
        .filter(|key| {
            std::str::from_utf8(key).is_ok_and(|key| glob.is_match(key))
        })
        .collect();
    matching.sort();

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings(
        matching,
    )))
}
