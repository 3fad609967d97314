//! Incremental RESP codec.
//!
//! Decoding works on a borrowed buffer and reports how many bytes a complete
//! value occupied, so callers can keep partial frames around until the next
//! socket read completes them. Encoding appends to a `BytesMut`.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Arrays nested deeper than this are rejected instead of recursed into.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Largest bulk string payload accepted, 512 MB like Redis' default
/// `proto-max-bulk-len`.
pub const MAX_BULK_LENGTH: i64 = 512 * 1024 * 1024;

/// Errors raised while decoding wire input. All of them are fatal to the
/// connection that produced the bytes.
#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("Protocol error: invalid type byte '{0}'")]
    InvalidTypeByte(char),
    #[error("Protocol error: invalid length")]
    InvalidLength,
    #[error("Protocol error: invalid integer")]
    InvalidInteger,
    #[error("Protocol error: bulk string is not terminated by CRLF")]
    MissingTerminator,
    #[error("Protocol error: invalid UTF-8 in simple string")]
    InvalidUtf8,
    #[error("Protocol error: arrays nested deeper than {MAX_NESTING_DEPTH} levels")]
    NestingTooDeep,
}

impl RespError {
    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(format!("ERR {}", self))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    NullBulkString,
    Array(Vec<RespValue>),
    NullArray,
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn simple_string(value: &str) -> Self {
        RespValue::SimpleString(value.to_string())
    }

    pub fn bulk_string<T: Into<Bytes>>(value: T) -> Self {
        RespValue::BulkString(value.into())
    }

    /// Builds a command array, e.g. `["REPLCONF", "GETACK", "*"]`.
    pub fn command(parts: &[&str]) -> Self {
        RespValue::Array(
            parts
                .iter()
                .map(|part| RespValue::BulkString(Bytes::copy_from_slice(part.as_bytes())))
                .collect(),
        )
    }

    pub fn array_of_bulk_strings<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
    {
        RespValue::Array(values.into_iter().map(RespValue::BulkString).collect())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    pub fn encode(&self) -> Bytes {
        let mut buffer = BytesMut::new();
        self.encode_into(&mut buffer);
        buffer.freeze()
    }

    pub fn encode_into(&self, dst: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => {
                dst.put_u8(b'+');
                dst.put_slice(s.as_bytes());
                dst.put_slice(b"\r\n");
            }
            RespValue::Error(message) => {
                dst.put_u8(b'-');
                dst.put_slice(message.as_bytes());
                dst.put_slice(b"\r\n");
            }
            RespValue::Integer(n) => {
                dst.put_u8(b':');
                dst.put_slice(n.to_string().as_bytes());
                dst.put_slice(b"\r\n");
            }
            RespValue::BulkString(data) => {
                dst.put_u8(b'$');
                dst.put_slice(data.len().to_string().as_bytes());
                dst.put_slice(b"\r\n");
                dst.put_slice(data);
                dst.put_slice(b"\r\n");
            }
            RespValue::NullBulkString => dst.put_slice(b"$-1\r\n"),
            RespValue::Array(elements) => {
                dst.put_u8(b'*');
                dst.put_slice(elements.len().to_string().as_bytes());
                dst.put_slice(b"\r\n");

                for element in elements {
                    element.encode_into(dst);
                }
            }
            RespValue::NullArray => dst.put_slice(b"*-1\r\n"),
        }
    }

    /// Decodes the first complete value in `buffer`.
    ///
    /// Returns `Ok(None)` when the buffer holds only part of a value; nothing
    /// is consumed in that case. On success the second element is the number
    /// of bytes the value occupied.
    ///
    /// A top-level line that does not start with a RESP type byte is treated
    /// as an inline command and split on whitespace into bulk strings.
    pub fn decode_next(buffer: &[u8]) -> Result<Option<(RespValue, usize)>, RespError> {
        decode_at(buffer, 0, 0)
    }
}

/// Decodes the `$<len>\r\n<payload>` frame a leader sends after FULLRESYNC.
/// Unlike a bulk string the payload is not followed by CRLF.
pub fn decode_snapshot_payload(buffer: &[u8]) -> Result<Option<(Bytes, usize)>, RespError> {
    let Some(&type_byte) = buffer.first() else {
        return Ok(None);
    };

    if type_byte != b'$' {
        return Err(RespError::InvalidTypeByte(type_byte as char));
    }

    let Some((line, payload_start)) = read_line(buffer, 1) else {
        return Ok(None);
    };

    let length = parse_integer(line)?;

    if !(0..=MAX_BULK_LENGTH).contains(&length) {
        return Err(RespError::InvalidLength);
    }

    let end = payload_start + length as usize;

    if buffer.len() < end {
        return Ok(None);
    }

    Ok(Some((
        Bytes::copy_from_slice(&buffer[payload_start..end]),
        end,
    )))
}

fn read_line(buffer: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let rest = buffer.get(start..)?;
    let position = rest.windows(2).position(|window| window == b"\r\n")?;

    Some((&rest[..position], start + position + 2))
}

fn parse_integer(line: &[u8]) -> Result<i64, RespError> {
    std::str::from_utf8(line)
        .map_err(|_| RespError::InvalidInteger)?
        .parse::<i64>()
        .map_err(|_| RespError::InvalidInteger)
}

fn decode_at(
    buffer: &[u8],
    start: usize,
    depth: usize,
) -> Result<Option<(RespValue, usize)>, RespError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(RespError::NestingTooDeep);
    }

    let Some(&type_byte) = buffer.get(start) else {
        return Ok(None);
    };

    match type_byte {
        b'+' | b'-' | b':' | b'$' | b'*' => (),
        _ if depth == 0 => return Ok(decode_inline(buffer, start)),
        other => return Err(RespError::InvalidTypeByte(other as char)),
    }

    let Some((line, next)) = read_line(buffer, start + 1) else {
        return Ok(None);
    };

    match type_byte {
        b'+' => {
            let s = std::str::from_utf8(line).map_err(|_| RespError::InvalidUtf8)?;
            Ok(Some((RespValue::SimpleString(s.to_string()), next)))
        }
        b'-' => {
            let s = std::str::from_utf8(line).map_err(|_| RespError::InvalidUtf8)?;
            Ok(Some((RespValue::Error(s.to_string()), next)))
        }
        b':' => Ok(Some((RespValue::Integer(parse_integer(line)?), next))),
        b'$' => {
            let length = parse_integer(line)?;

            if length == -1 {
                return Ok(Some((RespValue::NullBulkString, next)));
            }

            if !(0..=MAX_BULK_LENGTH).contains(&length) {
                return Err(RespError::InvalidLength);
            }

            let end = next + length as usize;

            if buffer.len() < end + 2 {
                return Ok(None);
            }

            if &buffer[end..end + 2] != b"\r\n" {
                return Err(RespError::MissingTerminator);
            }

            Ok(Some((
                RespValue::BulkString(Bytes::copy_from_slice(&buffer[next..end])),
                end + 2,
            )))
        }
        _ => {
            let count = parse_integer(line)?;

            if count == -1 {
                return Ok(Some((RespValue::NullArray, next)));
            }

            if count < 0 {
                return Err(RespError::InvalidLength);
            }

            // The declared count is untrusted; cap the up-front allocation.
            let mut elements = Vec::with_capacity((count as usize).min(1024));
            let mut cursor = next;

            for _ in 0..count {
                match decode_at(buffer, cursor, depth + 1)? {
                    Some((element, element_end)) => {
                        elements.push(element);
                        cursor = element_end;
                    }
                    None => return Ok(None),
                }
            }

            Ok(Some((RespValue::Array(elements), cursor)))
        }
    }
}

fn decode_inline(buffer: &[u8], start: usize) -> Option<(RespValue, usize)> {
    let (line, next) = read_line(buffer, start)?;

    let arguments = line
        .split(|byte| byte.is_ascii_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| RespValue::BulkString(Bytes::copy_from_slice(part)))
        .collect();

    Some((RespValue::Array(arguments), next))
}
