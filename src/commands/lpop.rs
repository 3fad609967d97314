use bytes::Bytes;

use crate::{
    commands::{
        CommandError, CommandResult,
        command_utils::{check_arity, parse_integer},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LpopArguments {
    key: Bytes,
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("lpop", arguments, 1, Some(2))?;

        let count = arguments.get(1).map(parse_integer::<usize>).transpose()?;

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles the Redis LPOP command.
///
/// Without a count the head element is returned as a bulk string (null when
/// the list is absent). With a count up to that many elements are returned as
/// an array (null array when the list is absent). A list emptied by the pop
/// is deleted.
///
/// # Examples
///
/// ```ignore
/// // LPOP mylist
/// // Returns: "$3\r\none\r\n"
///
/// // LPOP mylist 3
/// // Returns: "*3\r\n$3\r\none\r\n$3\r\ntwo\r\n$5\r\nthree\r\n"
/// ```
pub fn lpop(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;

    let Some(list) = store.get_list_mut(&lpop_arguments.key)? else {
        let response = match lpop_arguments.count {
            Some(_) => RespValue::NullArray,
            None => RespValue::NullBulkString,
        };

        return Ok(CommandResult::Response(response));
    };

    let response = match lpop_arguments.count {
        Some(count) => {
            let count = count.min(list.len());
            RespValue::array_of_bulk_strings(list.drain(..count))
        }
        None => list
            .pop_front()
            .map_or(RespValue::NullBulkString, RespValue::BulkString),
    };

    store.remove_if_empty(&lpop_arguments.key);

    Ok(CommandResult::Response(response))
}
