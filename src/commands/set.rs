use bytes::Bytes;
use tokio::time::{Duration, Instant};

use crate::{
    commands::{
        CommandError, CommandResult,
        command_utils::{check_arity, is_option, parse_integer},
    },
    key_value_store::{DataType, KeyValueStore},
    resp::RespValue,
};

/// Represents the parsed arguments for the SET command
pub struct SetArguments {
    /// The key name to store the value under
    key: Bytes,
    /// The value to be stored under the given key
    value: Bytes,
    /// Time to live of the key value pair
    ttl: Option<Duration>,
}

impl SetArguments {
    /// Parses command arguments into a SetArguments structure.
    ///
    /// # Arguments
    ///
    /// * `arguments` - The command arguments in one of these forms:
    ///   - `[key, value]` - For permanent storage
    ///   - `[key, value, "EX", seconds]` - Expires after the given seconds
    ///   - `[key, value, "PX", milliseconds]` - Expires after the given milliseconds
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If fewer than 2 arguments are given
    /// * `Err(CommandError::SyntaxError)` - If the expiry unit is neither `EX` nor `PX`
    ///   or extra arguments follow it
    /// * `Err(CommandError::NotAnInteger)` - If the expiry amount is not an integer
    /// * `Err(CommandError::InvalidExpireTime)` - If the expiry amount is not positive
    ///   or too large to turn into a deadline
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // SET mykey hello PX 1000
    /// let result = SetArguments::parse(&[
    ///     Bytes::from("mykey"),
    ///     Bytes::from("hello"),
    ///     Bytes::from("PX"),
    ///     Bytes::from("1000"),
    /// ]);
    /// // Returns: Ok(SetArguments { key: "mykey", value: "hello", ttl: Some(1s) })
    /// ```
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("set", arguments, 2, None)?;

        let ttl = match &arguments[2..] {
            [] => None,
            [unit, amount] => {
                let amount = parse_integer::<i64>(amount)?;

                if amount <= 0 {
                    return Err(CommandError::InvalidExpireTime);
                }

                let millis = if is_option(unit, "EX") {
                    amount.checked_mul(1000)
                } else if is_option(unit, "PX") {
                    Some(amount)
                } else {
                    return Err(CommandError::SyntaxError);
                };

                // The deadline has to fit the clock.
                let ttl = millis
                    .map(|millis| Duration::from_millis(millis as u64))
                    .filter(|ttl| Instant::now().checked_add(*ttl).is_some())
                    .ok_or(CommandError::InvalidExpireTime)?;

                Some(ttl)
            }
            _ => return Err(CommandError::SyntaxError),
        };

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            ttl,
        })
    }
}

/// Handles the Redis SET command.
///
/// Stores a string under the key, replacing any previous value of any type
/// together with its expiration.
///
/// # Returns
///
/// * `Ok(CommandResult::Response)` - The `OK` simple string
/// * `Err(CommandError)` - If the arguments are invalid, see [`SetArguments::parse`]
pub fn set(store: &mut KeyValueStore, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    store.set(
        set_arguments.key,
        DataType::String(set_arguments.value),
        set_arguments.ttl,
    );

    Ok(CommandResult::Response(RespValue::ok()))
}
