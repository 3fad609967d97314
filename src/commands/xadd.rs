use bytes::Bytes;

use crate::{
    commands::{
        CommandError, CommandResult,
        command_utils::{as_str, check_arity, unix_time_millis},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    stream::{StreamError, StreamIdRequest},
};

pub struct XaddArguments {
    key: Bytes,
    id: StreamIdRequest,
    fields: Vec<(Bytes, Bytes)>,
}

impl XaddArguments {
    /// Parses `key id field value [field value ...]`.
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("xadd", arguments, 4, None)?;

        if arguments[2..].len() % 2 != 0 {
            return Err(CommandError::WrongNumberOfArguments("xadd".to_string()));
        }

        let id = as_str(&arguments[1])
            .map_err(|_| StreamError::InvalidId)?
            .parse::<StreamIdRequest>()?;

        let fields = arguments[2..]
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();

        Ok(Self {
            key: arguments[0].clone(),
            id,
            fields,
        })
    }
}

/// Handles the Redis XADD command.
///
/// Appends an entry to the stream, creating the key when absent, and replies
/// with the id the entry was stored under. `*` takes the current Unix time in
/// milliseconds; `<ms>-*` takes the next free sequence number for `<ms>`.
///
/// # Returns
///
/// * `Ok(CommandResult::Response)` - The resolved id as a bulk string
/// * `Err(CommandError::Stream(StreamError::ZeroId))` - For the id `0-0`
/// * `Err(CommandError::Stream(StreamError::NotIncreasing))` - If the id is not
///   greater than the stream's last id
/// * `Err(CommandError::WrongType)` - If the key holds another type
pub fn xadd(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;

    let appended = store.stream_entry(&xadd_arguments.key)?.append(
        xadd_arguments.id,
        xadd_arguments.fields,
        unix_time_millis(),
    );

    // A rejected id must not leave a freshly created empty stream behind.
    store.remove_if_empty(&xadd_arguments.key);

    let id = appended?;

    Ok(CommandResult::Response(RespValue::bulk_string(
        id.to_string(),
    )))
}
