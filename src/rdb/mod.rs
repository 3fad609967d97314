//! Snapshot files in the RDB format.
//!
//! Only string values are read and written. A snapshot is loaded once at
//! startup from `--dir`/`--dbfilename`, and serialized from the live keyspace
//! when a follower requests a full resync.

mod encoding;
mod opcode;
mod rdb_parser;

use std::{collections::HashMap, path::Path};

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::{
    commands::command_utils::unix_time_millis,
    key_value_store::{DataType, KeyValueStore, Value},
    rdb::{
        encoding::{write_length, write_string},
        opcode::{
            CHECKSUM_LENGTH, DATABASE_OPCODE, END_OF_FILE_OPCODE, EXPIRATION_MILLISECONDS_OPCODE,
            MAGIC_STRING, METADATA_OPCODE, RDB_VERSION, RESIZE_DB_OPCODE, STRING_VALUE_TYPE,
        },
    },
};

pub use rdb_parser::RdbParser;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum RdbError {
    #[error("Invalid magic string")]
    InvalidMagicString,
    #[error("Invalid RDB version '{0}'")]
    InvalidVersion(String),
    #[error("Unexpected end of snapshot")]
    UnexpectedEof,
    #[error("Invalid length encoding 0x{0:02X}")]
    InvalidLengthEncoding(u8),
    #[error("Expected a length, found an encoded integer")]
    ExpectedLength,
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(&'static str),
    #[error("Unsupported value type 0x{0:02X}")]
    UnsupportedValueType(u8),
    #[error("Invalid expiration timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Parses a snapshot held in memory.
pub fn parse(bytes: &[u8]) -> Result<HashMap<Bytes, Value>, RdbError> {
    RdbParser::new(bytes).parse()
}

/// Loads `directory/filename`. A missing or unreadable file yields an empty
/// keyspace.
pub async fn load(directory: &str, filename: &str) -> HashMap<Bytes, Value> {
    let path = Path::new(directory).join(filename);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no snapshot to load");
            return HashMap::new();
        }
        Err(e) => {
            warn!(path = %path.display(), "Failed to read snapshot: {}", e);
            return HashMap::new();
        }
    };

    match parse(&bytes) {
        Ok(entries) => {
            info!(path = %path.display(), keys = entries.len(), "loaded snapshot");
            entries
        }
        Err(e) => {
            warn!(path = %path.display(), "Failed to parse snapshot: {}", e);
            HashMap::new()
        }
    }
}

/// Serializes the string keys of `store`. Expiries are written as
/// milliseconds since the Unix epoch; other value types are left out.
pub fn serialize(store: &KeyValueStore) -> Bytes {
    let now = Instant::now();
    let now_ms = unix_time_millis();

    let strings: Vec<(&Bytes, &Bytes, Option<Instant>)> = store
        .iter()
        .filter_map(|(key, value)| match &value.data {
            DataType::String(data) => Some((key, data, value.expiration)),
            _ => None,
        })
        .collect();

    let mut buffer = BytesMut::new();
    buffer.put_slice(MAGIC_STRING);
    buffer.put_slice(RDB_VERSION);

    buffer.put_u8(METADATA_OPCODE);
    write_string(&mut buffer, b"redis-ver");
    write_string(&mut buffer, b"7.2.0");

    if !strings.is_empty() {
        let with_expiry = strings
            .iter()
            .filter(|(_, _, expiration)| expiration.is_some())
            .count();

        buffer.put_u8(DATABASE_OPCODE);
        write_length(&mut buffer, 0);
        buffer.put_u8(RESIZE_DB_OPCODE);
        write_length(&mut buffer, strings.len());
        write_length(&mut buffer, with_expiry);

        for (key, data, expiration) in strings {
            if let Some(expiration) = expiration {
                let remaining = expiration.saturating_duration_since(now);
                buffer.put_u8(EXPIRATION_MILLISECONDS_OPCODE);
                buffer.put_u64_le(now_ms + remaining.as_millis() as u64);
            }

            buffer.put_u8(STRING_VALUE_TYPE);
            write_string(&mut buffer, key);
            write_string(&mut buffer, data);
        }
    }

    buffer.put_u8(END_OF_FILE_OPCODE);
    // A zero checksum tells readers that checksumming is disabled.
    buffer.put_bytes(0, CHECKSUM_LENGTH);

    buffer.freeze()
}
