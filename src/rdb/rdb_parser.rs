use std::collections::HashMap;

use bytes::Bytes;
use jiff::Timestamp;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::{
    commands::command_utils::unix_time_millis,
    key_value_store::{DataType, Value},
    rdb::{
        RdbError,
        encoding::{parse_length, parse_string},
        opcode::{
            CHECKSUM_LENGTH, DATABASE_OPCODE, END_OF_FILE_OPCODE, EXPIRATION_MILLISECONDS_OPCODE,
            EXPIRATION_SECONDS_OPCODE, METADATA_OPCODE, RESIZE_DB_OPCODE, STRING_VALUE_TYPE,
            parse_header,
        },
    },
};

/// Cursor over a snapshot held in memory.
#[derive(Debug)]
pub struct RdbParser<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> RdbParser<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.buffer.len()
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], RdbError> {
        let end = self
            .cursor
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or(RdbError::UnexpectedEof)?;

        let slice = &self.buffer[self.cursor..end];
        self.cursor = end;

        Ok(slice)
    }

    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], RdbError> {
        self.take(N)?
            .try_into()
            .map_err(|_| RdbError::UnexpectedEof)
    }

    pub fn read_u8(&mut self) -> Result<u8, RdbError> {
        Ok(self.take(1)?[0])
    }

    /// Reads the whole snapshot. Keys whose expiry already passed are left
    /// out, the others expire after the time remaining at load.
    pub fn parse(mut self) -> Result<HashMap<Bytes, Value>, RdbError> {
        let version = parse_header(&mut self)?;
        debug!(version, "parsing snapshot");

        let now_ms = unix_time_millis();
        let now = Instant::now();
        let mut entries = HashMap::new();

        loop {
            let opcode = self.read_u8()?;

            let expires_at_ms = match opcode {
                METADATA_OPCODE => {
                    let key = parse_string(&mut self)?;
                    let value = parse_string(&mut self)?;
                    debug!(
                        key = %String::from_utf8_lossy(&key),
                        value = %String::from_utf8_lossy(&value),
                        "snapshot metadata"
                    );
                    continue;
                }
                DATABASE_OPCODE => {
                    parse_length(&mut self)?;
                    continue;
                }
                RESIZE_DB_OPCODE => {
                    parse_length(&mut self)?;
                    parse_length(&mut self)?;
                    continue;
                }
                END_OF_FILE_OPCODE => {
                    self.take(CHECKSUM_LENGTH)?;
                    break;
                }
                EXPIRATION_SECONDS_OPCODE => {
                    let seconds = u32::from_le_bytes(self.take_array()?);
                    let timestamp = Timestamp::from_second(seconds as i64)
                        .map_err(|e| RdbError::InvalidTimestamp(e.to_string()))?;
                    Some(timestamp.as_millisecond())
                }
                EXPIRATION_MILLISECONDS_OPCODE => {
                    let millis = u64::from_le_bytes(self.take_array()?);
                    let millis =
                        i64::try_from(millis).map_err(|e| RdbError::InvalidTimestamp(e.to_string()))?;
                    let timestamp = Timestamp::from_millisecond(millis)
                        .map_err(|e| RdbError::InvalidTimestamp(e.to_string()))?;
                    Some(timestamp.as_millisecond())
                }
                _ => None,
            };

            let value_type = match expires_at_ms {
                Some(_) => self.read_u8()?,
                None => opcode,
            };

            if value_type != STRING_VALUE_TYPE {
                return Err(RdbError::UnsupportedValueType(value_type));
            }

            let key = parse_string(&mut self)?;
            let value = parse_string(&mut self)?;

            let expiration = match expires_at_ms {
                None => None,
                Some(expires_at_ms) if expires_at_ms <= now_ms as i64 => continue,
                Some(expires_at_ms) => {
                    Some(now + Duration::from_millis(expires_at_ms as u64 - now_ms))
                }
            };

            entries.insert(
                key,
                Value {
                    data: DataType::String(value),
                    expiration,
                },
            );
        }

        Ok(entries)
    }
}
