//! Low-level protobuf wire format primitives.
//!
//! This module implements the two wire-format building blocks the
//! migration payload actually uses: the 3-bit wire type tag and the
//! base-128 varint encoding.
//!
//! ## Wire Format Overview
//!
//! Each protobuf field is encoded as:
//! - A varint "header" containing the field number and wire type
//! - The field data (format depends on wire type)
//!
//! Wire types:
//! - 0: VARINT (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
//! - 1: I64 (fixed64, sfixed64, double)
//! - 2: LEN (string, bytes, embedded messages, packed repeated fields)
//! - 5: I32 (fixed32, sfixed32, float)
//!
//! The migration payload only ever carries VARINT and LEN fields; the
//! remaining types exist so they can be detected and rejected instead of
//! silently misparsed.

use crate::error::{Error, Result};

/// Protobuf wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 64-bit fixed-width
    I64 = 1,
    /// Length-delimited (strings, bytes, embedded messages)
    Len = 2,
    /// Start group (deprecated)
    StartGroup = 3,
    /// End group (deprecated)
    EndGroup = 4,
    /// 32-bit fixed-width
    I32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::I32),
            _ => Err(Error::UnknownWireType { value }),
        }
    }
}

/// Decode a varint from the given bytes.
///
/// Each byte contributes its low 7 bits at a shift of `7 * byte_index`;
/// the high bit flags that more bytes follow. Returns the decoded value
/// and the number of bytes consumed.
///
/// Fails if the buffer runs out before a byte with the continuation bit
/// clear, or after 10 bytes (the most a 64-bit value can occupy).
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in data.iter().enumerate() {
        if i >= 10 {
            // Varints are at most 10 bytes for a 64-bit value
            return Err(Error::varint_decode(i));
        }

        result |= u64::from(byte & 0x7F) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(Error::varint_decode(data.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_varint_single_byte() {
        let data = [0x08]; // Value 8
        let (value, len) = decode_varint(&data).unwrap();
        assert_eq!(value, 8);
        assert_eq!(len, 1);
    }

    #[test]
    fn test_decode_varint_multi_byte() {
        let data = [0xAC, 0x02]; // Value 300
        let (value, len) = decode_varint(&data).unwrap();
        assert_eq!(value, 300);
        assert_eq!(len, 2);
    }

    #[test]
    fn test_decode_varint_max() {
        // Maximum 64-bit varint (all 1s)
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        let (value, len) = decode_varint(&data).unwrap();
        assert_eq!(value, u64::MAX);
        assert_eq!(len, 10);
    }

    #[test]
    fn test_decode_varint_ignores_trailing_bytes() {
        let data = [0x96, 0x01, 0xDE, 0xAD];
        let (value, len) = decode_varint(&data).unwrap();
        assert_eq!(value, 150);
        assert_eq!(len, 2);
    }

    #[test]
    fn test_decode_varint_empty_buffer() {
        assert!(matches!(
            decode_varint(&[]),
            Err(Error::VarintDecode { offset: 0 })
        ));
    }

    #[test]
    fn test_decode_varint_unterminated() {
        // Continuation bit set on the last available byte
        let data = [0xFF, 0xFF];
        assert!(matches!(
            decode_varint(&data),
            Err(Error::VarintDecode { offset: 2 })
        ));
    }

    #[test]
    fn test_wire_type_conversion() {
        assert_eq!(WireType::try_from(0).unwrap(), WireType::Varint);
        assert_eq!(WireType::try_from(1).unwrap(), WireType::I64);
        assert_eq!(WireType::try_from(2).unwrap(), WireType::Len);
        assert_eq!(WireType::try_from(5).unwrap(), WireType::I32);
        assert!(WireType::try_from(6).is_err());
        assert!(WireType::try_from(7).is_err());
    }
}
