use bytes::Bytes;

use crate::{
    commands::{
        CommandError, CommandResult,
        command_utils::{check_arity, normalize_range, parse_integer},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Represents the parsed arguments for the LRANGE command.
pub struct LrangeArguments {
    /// The key name to retrieve from the store
    key: Bytes,
    /// The starting index for the range (can be negative to count from the end)
    start_index: i64,
    /// The ending index for the range (can be negative to count from the end)
    end_index: i64,
}

impl LrangeArguments {
    /// Parses and validates the arguments for the LRANGE command.
    ///
    /// # Arguments
    ///
    /// * `arguments` - The command arguments: `[key, start_index, end_index]`
    ///
    /// # Returns
    ///
    /// * `Ok(LrangeArguments)` - If the arguments are valid
    /// * `Err(CommandError::WrongNumberOfArguments)` - If there are not exactly 3 arguments
    /// * `Err(CommandError::NotAnInteger)` - If start or end index is not a valid integer
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("lrange", arguments, 3, Some(3))?;

        Ok(Self {
            key: arguments[0].clone(),
            start_index: parse_integer(&arguments[1])?,
            end_index: parse_integer(&arguments[2])?,
        })
    }
}

/// Handles the Redis LRANGE command.
///
/// Returns a range of elements from a list stored at the given key. Both
/// indices are inclusive and can be negative to count from the end of the
/// list. Out of range indices are clamped; a range that ends up empty, or an
/// absent key, produces an empty array.
///
/// # Examples
///
/// ```ignore
/// // LRANGE mylist 0 2  (get first 3 elements)
/// // Returns: "*3\r\n$3\r\nval1\r\n$3\r\nval2\r\n$3\r\nval3\r\n"
///
/// // LRANGE mylist -2 -1  (get last 2 elements)
/// // Returns: "*2\r\n$3\r\nval4\r\n$3\r\nval5\r\n"
/// ```
pub fn lrange(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let Some(list) = store.get_list(&lrange_arguments.key)? else {
        return Ok(CommandResult::Response(RespValue::Array(Vec::new())));
    };

    let Some((start, end)) = normalize_range(
        lrange_arguments.start_index,
        lrange_arguments.end_index,
        list.len(),
    ) else {
        return Ok(CommandResult::Response(RespValue::Array(Vec::new())));
    };

    Ok(CommandResult::Response(RespValue::array_of_bulk_strings(
        list.range(start..=end).cloned(),
    )))
}
