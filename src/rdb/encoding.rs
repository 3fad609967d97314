use bytes::{BufMut, Bytes, BytesMut};

use crate::rdb::{RdbError, rdb_parser::RdbParser};

#[derive(Debug, PartialEq)]
enum ValueEncoding {
    Length(u64),
    Int8,
    Int16,
    Int32,
    LzfCompressedString,
}

/// The two high bits of the first byte select the encoding:
///
/// * `00` - 6 bit length in the remaining bits
/// * `01` - 14 bit length, the remaining bits and the next byte
/// * `10` - 32 bit (`0x80`) or 64 bit (`0x81`) big endian length
/// * `11` - special string encoding in the remaining bits
fn parse_length_encoding(parser: &mut RdbParser<'_>) -> Result<ValueEncoding, RdbError> {
    let byte = parser.read_u8()?;

    match byte >> 6 {
        0b00 => Ok(ValueEncoding::Length((byte & 0b0011_1111) as u64)),
        0b01 => {
            let lower_8_bits = parser.read_u8()? as u64;
            let high_6_bits = (byte & 0b0011_1111) as u64;

            Ok(ValueEncoding::Length((high_6_bits << 8) | lower_8_bits))
        }
        0b10 => match byte {
            0x80 => Ok(ValueEncoding::Length(
                u32::from_be_bytes(parser.take_array()?) as u64,
            )),
            0x81 => Ok(ValueEncoding::Length(u64::from_be_bytes(parser.take_array()?))),
            _ => Err(RdbError::InvalidLengthEncoding(byte)),
        },
        _ => match byte & 0b0011_1111 {
            0 => Ok(ValueEncoding::Int8),
            1 => Ok(ValueEncoding::Int16),
            2 => Ok(ValueEncoding::Int32),
            3 => Ok(ValueEncoding::LzfCompressedString),
            _ => Err(RdbError::InvalidLengthEncoding(byte)),
        },
    }
}

/// Reads a plain length, as used by database numbers and resize hints.
pub fn parse_length(parser: &mut RdbParser<'_>) -> Result<u64, RdbError> {
    match parse_length_encoding(parser)? {
        ValueEncoding::Length(length) => Ok(length),
        _ => Err(RdbError::ExpectedLength),
    }
}

/// Reads a string, either length prefixed or stored as a little endian
/// integer that is rendered back in decimal.
pub fn parse_string(parser: &mut RdbParser<'_>) -> Result<Bytes, RdbError> {
    let value = match parse_length_encoding(parser)? {
        ValueEncoding::Length(length) => {
            let length = usize::try_from(length).map_err(|_| RdbError::UnexpectedEof)?;
            Bytes::copy_from_slice(parser.take(length)?)
        }
        ValueEncoding::Int8 => Bytes::from((parser.read_u8()? as i8).to_string()),
        ValueEncoding::Int16 => Bytes::from(i16::from_le_bytes(parser.take_array()?).to_string()),
        ValueEncoding::Int32 => Bytes::from(i32::from_le_bytes(parser.take_array()?).to_string()),
        ValueEncoding::LzfCompressedString => {
            return Err(RdbError::UnsupportedEncoding("LZF compressed string"));
        }
    };

    Ok(value)
}

pub fn write_length(buffer: &mut BytesMut, length: usize) {
    match length {
        0..0x40 => buffer.put_u8(length as u8),
        0x40..0x4000 => {
            buffer.put_u8(0b0100_0000 | (length >> 8) as u8);
            buffer.put_u8(length as u8);
        }
        _ => match u32::try_from(length) {
            Ok(length) => {
                buffer.put_u8(0x80);
                buffer.put_u32(length);
            }
            Err(_) => {
                buffer.put_u8(0x81);
                buffer.put_u64(length as u64);
            }
        },
    }
}

pub fn write_string(buffer: &mut BytesMut, value: &[u8]) {
    write_length(buffer, value.len());
    buffer.put_slice(value);
}
