use bytes::Bytes;
use tokio::time::Duration;

use crate::{
    commands::{
        BlockedState, CommandError, CommandResult,
        command_utils::{as_str, check_arity, is_option, parse_integer, parse_timeout_millis},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    stream::{StreamError, StreamId},
};

/// Where reading starts in one stream.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ReadFrom {
    /// Entries strictly after this id
    After(StreamId),
    /// `$`: entries added after the command started
    Latest,
}

/// Represents the parsed arguments for the XREAD command.
pub struct XreadArguments {
    /// Maximum number of entries returned per stream
    count: Option<usize>,
    /// `Some(None)` blocks without a timeout, `None` does not block at all
    block: Option<Option<Duration>>,
    /// Stream keys paired with the position to read from
    streams: Vec<(Bytes, ReadFrom)>,
}

impl XreadArguments {
    /// Parses `[COUNT n] [BLOCK ms] STREAMS key [key ...] id [id ...]`.
    ///
    /// # Returns
    ///
    /// * `Ok(XreadArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::SyntaxError)` - On unknown options or a missing `STREAMS`
    /// * `Err(CommandError::UnbalancedStreams)` - If keys and ids don't pair up
    /// * `Err(CommandError::Stream(StreamError::InvalidId))` - For malformed ids
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("xread", arguments, 3, None)?;

        let mut count = None;
        let mut block = None;
        let mut index = 0;

        loop {
            let Some(option) = arguments.get(index) else {
                return Err(CommandError::SyntaxError);
            };

            if is_option(option, "STREAMS") {
                index += 1;
                break;
            }

            let value = arguments.get(index + 1).ok_or(CommandError::SyntaxError)?;

            if is_option(option, "COUNT") {
                count = Some(parse_integer::<usize>(value)?);
            } else if is_option(option, "BLOCK") {
                block = Some(parse_timeout_millis(value)?);
            } else {
                return Err(CommandError::SyntaxError);
            }

            index += 2;
        }

        let rest = &arguments[index..];

        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(CommandError::UnbalancedStreams);
        }

        let (keys, ids) = rest.split_at(rest.len() / 2);
        let mut streams = Vec::with_capacity(keys.len());

        for (key, id) in keys.iter().zip(ids) {
            let id = as_str(id).map_err(|_| StreamError::InvalidId)?;

            let from = match id {
                "$" => ReadFrom::Latest,
                id => ReadFrom::After(id.parse()?),
            };

            streams.push((key.clone(), from));
        }

        Ok(Self {
            count,
            block,
            streams,
        })
    }
}

/// Collects `[key, [entry, ...]]` for every stream with entries after its
/// position. Returns `None` when no stream has any.
fn read_streams(
    store: &mut KeyValueStore,
    streams: &[(Bytes, StreamId)],
    count: Option<usize>,
) -> Result<Option<RespValue>, CommandError> {
    let mut response = Vec::new();

    for (key, after) in streams {
        let Some(stream) = store.get_stream(key)? else {
            continue;
        };

        let entries = stream.entries_after(*after, count);

        if entries.is_empty() {
            continue;
        }

        response.push(RespValue::Array(vec![
            RespValue::BulkString(key.clone()),
            RespValue::Array(entries.iter().map(|entry| entry.to_resp()).collect()),
        ]));
    }

    if response.is_empty() {
        Ok(None)
    } else {
        Ok(Some(RespValue::Array(response)))
    }
}

/// Handles the Redis XREAD command.
///
/// Without `BLOCK` the reply is immediate: the entries found, or a null array
/// when no stream has new entries. With `BLOCK` the connection waits until an
/// entry arrives in any of the streams or the timeout passes (null array).
///
/// `$` is resolved once, when the command starts, to the stream's last id at
/// that moment. Retries keep that position, so only entries added while
/// blocked are returned.
pub fn xread(
    store: &mut KeyValueStore,
    arguments: &[Bytes],
    can_block: bool,
) -> Result<CommandResult, CommandError> {
    let xread_arguments = XreadArguments::parse(arguments)?;

    let mut streams = Vec::with_capacity(xread_arguments.streams.len());

    for (key, from) in xread_arguments.streams {
        let after = match from {
            ReadFrom::After(id) => id,
            ReadFrom::Latest => store
                .get_stream(&key)?
                .and_then(|stream| stream.last_id())
                .unwrap_or(StreamId::ZERO),
        };

        streams.push((key, after));
    }

    if let Some(response) = read_streams(store, &streams, xread_arguments.count)? {
        return Ok(CommandResult::Response(response));
    }

    let Some(timeout) = xread_arguments.block.filter(|_| can_block) else {
        return Ok(CommandResult::Response(RespValue::NullArray));
    };

    let count = xread_arguments.count;

    Ok(CommandResult::Block(BlockedState::new(
        Box::new(move |store: &mut KeyValueStore| {
            read_streams(store, &streams, count).unwrap_or_else(|e| Some(e.as_resp()))
        }),
        RespValue::NullArray,
        timeout,
    )))
}
