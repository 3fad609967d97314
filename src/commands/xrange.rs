use bytes::Bytes;

use crate::{
    commands::{
        CommandError, CommandResult,
        command_utils::{as_str, check_arity, is_option, parse_integer},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    stream::{StreamError, StreamId},
};

pub struct XrangeArguments {
    key: Bytes,
    start: StreamId,
    end: StreamId,
    count: Option<usize>,
}

impl XrangeArguments {
    /// Parses `key start end [COUNT n]`. `-` and `+` stand for the smallest
    /// and greatest possible ids; a bare `<ms>` covers every sequence number
    /// of that millisecond.
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("xrange", arguments, 3, Some(5))?;

        let start = StreamId::parse_range_start(
            as_str(&arguments[1]).map_err(|_| StreamError::InvalidId)?,
        )?;
        let end = StreamId::parse_range_end(
            as_str(&arguments[2]).map_err(|_| StreamError::InvalidId)?,
        )?;

        let count = match &arguments[3..] {
            [] => None,
            [option, count] if is_option(option, "COUNT") => Some(parse_integer(count)?),
            _ => return Err(CommandError::SyntaxError),
        };

        Ok(Self {
            key: arguments[0].clone(),
            start,
            end,
            count,
        })
    }
}

/// Handles the Redis XRANGE command.
///
/// Both bounds are inclusive and compared numerically, first on the
/// millisecond part and then on the sequence number.
///
/// # Examples
///
/// ```ignore
/// // XRANGE sensor 1526985054069 1526985054079
/// // Returns: "*1\r\n*2\r\n$15\r\n1526985054069-0\r\n*2\r\n$11\r\ntemperature\r\n$2\r\n36\r\n"
/// ```
pub fn xrange(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let Some(stream) = store.get_stream(&xrange_arguments.key)? else {
        return Ok(CommandResult::Response(RespValue::Array(Vec::new())));
    };

    let entries = stream
        .range(
            xrange_arguments.start,
            xrange_arguments.end,
            xrange_arguments.count,
        )
        .iter()
        .map(|entry| entry.to_resp())
        .collect();

    Ok(CommandResult::Response(RespValue::Array(entries)))
}
