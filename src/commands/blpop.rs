use bytes::Bytes;
use tokio::time::Duration;

use crate::{
    commands::{
        BlockedState, CommandError, CommandResult,
        command_utils::{check_arity, parse_timeout_seconds},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Represents the parsed arguments for the BLPOP command.
pub struct BlpopArguments {
    /// Lists to pop from, tried left to right
    keys: Vec<Bytes>,
    /// How long to block; `None` blocks until an element arrives
    timeout: Option<Duration>,
}

impl BlpopArguments {
    /// Parses `key [key ...] timeout`, the timeout being in (fractional)
    /// seconds with `0` meaning no timeout.
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("blpop", arguments, 2, None)?;

        let (timeout, keys) = arguments
            .split_last()
            .ok_or_else(|| CommandError::WrongNumberOfArguments("blpop".to_string()))?;

        Ok(Self {
            keys: keys.to_vec(),
            timeout: parse_timeout_seconds(timeout)?,
        })
    }
}

/// Pops the head of the first non-empty list among `keys`, deleting the list
/// when it becomes empty. Keys holding other types are skipped.
fn pop_first_available(store: &mut KeyValueStore, keys: &[Bytes]) -> Option<RespValue> {
    for key in keys {
        let Ok(Some(list)) = store.get_list_mut(key) else {
            continue;
        };

        let Some(value) = list.pop_front() else {
            continue;
        };

        store.remove_if_empty(key);

        return Some(RespValue::array_of_bulk_strings([key.clone(), value]));
    }

    None
}

/// Handles the Redis BLPOP command.
///
/// When one of the lists already holds an element the reply is immediate:
/// `[key, value]`. Otherwise the connection is blocked; the returned
/// [`BlockedState`] retries the same pop until it succeeds or the timeout
/// passes, in which case the reply is a null array.
///
/// Inside a transaction the command never blocks and behaves as if the
/// timeout had already expired.
///
/// # Examples
///
/// ```ignore
/// // BLPOP queue 0.5
/// // Returns: "*2\r\n$5\r\nqueue\r\n$3\r\njob\r\n" or "*-1\r\n" after 500ms
/// ```
pub fn blpop(
    store: &mut KeyValueStore,
    arguments: &[Bytes],
    can_block: bool,
) -> Result<CommandResult, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;

    if let Some(response) = pop_first_available(store, &blpop_arguments.keys) {
        return Ok(CommandResult::Response(response));
    }

    if !can_block {
        return Ok(CommandResult::Response(RespValue::NullArray));
    }

    let keys = blpop_arguments.keys;

    Ok(CommandResult::Block(BlockedState::new(
        Box::new(move |store: &mut KeyValueStore| pop_first_available(store, &keys)),
        RespValue::NullArray,
        blpop_arguments.timeout,
    )))
}
