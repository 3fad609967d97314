use std::str::FromStr;

use bytes::Bytes;
use rust_decimal::Decimal;
use tokio::time::Duration;

use crate::commands::CommandError;

/// Fails with the Redis arity error unless `arguments` holds between `min`
/// and `max` (inclusive) elements. `None` means no upper bound.
pub fn check_arity(
    command: &str,
    arguments: &[Bytes],
    min: usize,
    max: Option<usize>,
) -> Result<(), CommandError> {
    let len = arguments.len();

    if len < min || max.is_some_and(|max| len > max) {
        return Err(CommandError::WrongNumberOfArguments(
            command.to_lowercase(),
        ));
    }

    Ok(())
}

pub fn as_str(argument: &Bytes) -> Result<&str, CommandError> {
    std::str::from_utf8(argument).map_err(|_| CommandError::SyntaxError)
}

pub fn parse_integer<T: FromStr>(argument: &Bytes) -> Result<T, CommandError> {
    as_str(argument)
        .map_err(|_| CommandError::NotAnInteger)?
        .parse::<T>()
        .map_err(|_| CommandError::NotAnInteger)
}

/// Case-insensitive comparison of an option token such as `PX` or `COUNT`.
pub fn is_option(argument: &Bytes, option: &str) -> bool {
    argument.eq_ignore_ascii_case(option.as_bytes())
}

/// BLPOP style timeout in (fractional) seconds. Zero means wait forever.
pub fn parse_timeout_seconds(argument: &Bytes) -> Result<Option<Duration>, CommandError> {
    let seconds = as_str(argument)
        .map_err(|_| CommandError::InvalidTimeout)?
        .parse::<f64>()
        .map_err(|_| CommandError::InvalidTimeout)?;

    if seconds.is_nan() {
        return Err(CommandError::InvalidTimeout);
    }

    if seconds < 0.0 {
        return Err(CommandError::NegativeTimeout);
    }

    if seconds == 0.0 {
        return Ok(None);
    }

    Duration::try_from_secs_f64(seconds)
        .map(Some)
        .map_err(|_| CommandError::InvalidTimeout)
}

/// Millisecond timeout as used by XREAD BLOCK and WAIT. Zero means wait
/// forever.
pub fn parse_timeout_millis(argument: &Bytes) -> Result<Option<Duration>, CommandError> {
    let millis = parse_integer::<i64>(argument).map_err(|_| CommandError::InvalidTimeout)?;

    if millis < 0 {
        return Err(CommandError::NegativeTimeout);
    }

    if millis == 0 {
        return Ok(None);
    }

    Ok(Some(Duration::from_millis(millis as u64)))
}

/// Sorted set scores accept plain and scientific decimal notation.
pub fn parse_score(argument: &Bytes) -> Result<Decimal, CommandError> {
    let input = as_str(argument).map_err(|_| CommandError::NotAValidFloat)?;

    Decimal::from_str(input)
        .or_else(|_| Decimal::from_scientific(input))
        .map_err(|_| CommandError::NotAValidFloat)
}

/// Resolves inclusive `start`/`stop` positions against a collection of `len`
/// elements. Negative positions count from the end and out of range
/// positions are clamped. Returns `None` for an empty selection.
pub fn normalize_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;

    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start >= len || stop < 0 || start > stop {
        return None;
    }

    Some((start as usize, stop as usize))
}

/// Milliseconds since the Unix epoch.
pub fn unix_time_millis() -> u64 {
    jiff::Timestamp::now().as_millisecond().max(0) as u64
}
