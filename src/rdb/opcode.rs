use crate::rdb::{RdbError, rdb_parser::RdbParser};

pub const MAGIC_STRING: &[u8] = b"REDIS";
pub const RDB_VERSION: &[u8] = b"0011";

pub const METADATA_OPCODE: u8 = 0xFA;
pub const RESIZE_DB_OPCODE: u8 = 0xFB;
pub const DATABASE_OPCODE: u8 = 0xFE;
pub const EXPIRATION_SECONDS_OPCODE: u8 = 0xFD;
pub const EXPIRATION_MILLISECONDS_OPCODE: u8 = 0xFC;
pub const END_OF_FILE_OPCODE: u8 = 0xFF;
pub const STRING_VALUE_TYPE: u8 = 0x00;

/// Checksum length following the end of file opcode.
pub const CHECKSUM_LENGTH: usize = 8;

/// Reads `REDIS` followed by a four digit version.
pub fn parse_header(parser: &mut RdbParser<'_>) -> Result<u32, RdbError> {
    if parser.take(MAGIC_STRING.len())? != MAGIC_STRING {
        return Err(RdbError::InvalidMagicString);
    }

    let version = parser.take(4)?;

    std::str::from_utf8(version)
        .ok()
        .filter(|version| version.bytes().all(|byte| byte.is_ascii_digit()))
        .and_then(|version| version.parse::<u32>().ok())
        .ok_or_else(|| RdbError::InvalidVersion(String::from_utf8_lossy(version).into_owned()))
}
