//! Error types for the otpmig-core library.
//!
//! This module provides comprehensive error handling using the `thiserror` crate,
//! with detailed error variants for different failure modes.

use crate::payload::WireType;
use thiserror::Error;

/// Result type alias for otpmig operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all otpmig operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Input string is not a Google Authenticator migration URL
    #[error("not a valid migration URL: {reason}")]
    InvalidMigrationUrl {
        /// Why the URL was rejected
        reason: String,
    },

    /// The `data` query parameter is not valid base64
    #[error("failed to decode base64 data parameter: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Failed to decode varint
    #[error("failed to decode varint at offset {offset}: buffer too small or invalid encoding")]
    VarintDecode {
        /// Byte offset where the error occurred
        offset: usize,
    },

    /// A fixed-length read ran past the end of the buffer
    #[error("not enough bytes left: requested {requested}, available {available}")]
    BufferExhausted {
        /// Number of bytes the caller asked for
        requested: usize,
        /// Number of bytes remaining in the buffer
        available: usize,
    },

    /// A field header carried a wire type outside the protobuf encoding
    #[error("unknown wire type: {value}")]
    UnknownWireType {
        /// The raw 3-bit wire type value
        value: u8,
    },

    /// A recognized field was encoded with the wrong wire type
    #[error("unexpected wire type for field {field}: expected {expected:?}, found {actual:?}")]
    UnexpectedWireType {
        /// Protobuf field number
        field: u64,
        /// Wire type the schema requires for this field
        expected: WireType,
        /// Wire type found on the wire
        actual: WireType,
    },

    /// A fixed-width field for which no skip logic exists
    #[error("unsupported wire type {wire_type:?} for field {field}: fixed-width fields cannot be skipped")]
    UnsupportedWireType {
        /// Protobuf field number
        field: u64,
        /// The unskippable wire type
        wire_type: WireType,
    },

    /// An unrecognized field number at the top level of the payload
    #[error("unknown protobuf field {field} in migration payload")]
    UnknownField {
        /// Protobuf field number
        field: u64,
    },

    /// An OtpParameters record completed its scan without all required fields
    #[error("malformed OtpParameters record: missing required field '{field}'")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// A name or issuer field was not valid UTF-8
    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Creates a new invalid migration URL error
    pub fn invalid_migration_url(reason: impl Into<String>) -> Self {
        Self::InvalidMigrationUrl {
            reason: reason.into(),
        }
    }

    /// Creates a new varint decode error
    pub fn varint_decode(offset: usize) -> Self {
        Self::VarintDecode { offset }
    }

    /// Creates a new buffer exhausted error
    pub fn buffer_exhausted(requested: usize, available: usize) -> Self {
        Self::BufferExhausted {
            requested,
            available,
        }
    }

    /// Creates a new unexpected wire type error
    pub fn unexpected_wire_type(field: u64, expected: WireType, actual: WireType) -> Self {
        Self::UnexpectedWireType {
            field,
            expected,
            actual,
        }
    }

    /// Creates a new unsupported wire type error
    pub fn unsupported_wire_type(field: u64, wire_type: WireType) -> Self {
        Self::UnsupportedWireType { field, wire_type }
    }

    /// Creates a new unknown field error
    pub fn unknown_field(field: u64) -> Self {
        Self::UnknownField { field }
    }

    /// Creates a new missing field error
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_display() {
        let err = Error::invalid_migration_url("unexpected scheme 'https'");
        assert!(err.to_string().contains("not a valid migration URL"));
        assert!(err.to_string().contains("https"));
    }

    #[test]
    fn test_buffer_exhausted_display() {
        let err = Error::buffer_exhausted(16, 3);
        assert!(err.to_string().contains("requested 16"));
        assert!(err.to_string().contains("available 3"));
    }

    #[test]
    fn test_missing_field_display() {
        let err = Error::missing_field("issuer");
        assert!(err.to_string().contains("missing required field 'issuer'"));
    }
}
