//! Migration payload decoding.
//!
//! This module turns the URL scanned from a Google Authenticator export
//! QR code into structured OTP credential records.
//!
//! ## Algorithm Overview
//!
//! 1. Validate the URL (`otpauth-migration://offline?data=...`) and pull
//!    out the `data` query parameter
//! 2. Base64-decode the parameter into the raw protobuf payload
//! 3. Walk the payload as a flat sequence of protobuf fields, recursing
//!    once into each length-delimited `OtpParameters` sub-message
//!
//! The wire schema is fixed (`MigrationPayload` from the Google
//! Authenticator export format) and only the subset of it this decoder
//! consumes is interpreted:
//!
//! ```text
//! message MigrationPayload {
//!   message OtpParameters {
//!     bytes secret = 1;
//!     string name = 2;
//!     string issuer = 3;
//!     Algorithm algorithm = 4;   // read and discarded
//!     int32 digits = 5;          // read and discarded
//!     OtpType type = 6;          // read and discarded
//!     int64 counter = 7;         // read and discarded
//!   }
//!   repeated OtpParameters otp_parameters = 1;
//!   int32 version = 2;
//!   int32 batch_size = 3;
//!   int32 batch_index = 4;
//!   int32 batch_id = 5;
//! }
//! ```
//!
//! Unknown fields at the top level are fatal; unknown fields inside an
//! `OtpParameters` sub-message are drained and ignored. The asymmetry is
//! deliberate: a top-level surprise means we are not looking at a
//! migration payload at all, while extra credential attributes are
//! expected to appear as the export format evolves.
//!
//! ## Known limitation
//!
//! There is no skip logic for fixed-width (I32/I64) fields, which the
//! export format never emits. Encountering one inside a sub-message
//! fails the decode with [`Error::UnsupportedWireType`] instead of
//! misparsing everything after it.

mod cursor;
mod wire;

use crate::base32;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::{debug, trace};
use url::Url;

pub use cursor::Cursor;
pub use wire::{decode_varint, WireType};

/// URL scheme of a Google Authenticator export QR code
const MIGRATION_SCHEME: &str = "otpauth-migration";

/// Sentinel host in a migration URL
const MIGRATION_HOST: &str = "offline";

/// Top-level field: one repeated OtpParameters sub-message
const FIELD_OTP_PARAMETERS: u64 = 1;
/// Top-level field: payload format version
const FIELD_VERSION: u64 = 2;
/// Top-level field: number of QR codes in this export batch
const FIELD_BATCH_SIZE: u64 = 3;
/// Top-level field: position of this QR code within the batch
const FIELD_BATCH_INDEX: u64 = 4;
/// Top-level field: identifier shared by all QR codes of one batch
const FIELD_BATCH_ID: u64 = 5;

/// OtpParameters field: raw shared secret bytes
const FIELD_SECRET: u64 = 1;
/// OtpParameters field: account/label name
const FIELD_NAME: u64 = 2;
/// OtpParameters field: issuing service name
const FIELD_ISSUER: u64 = 3;

/// Top-level envelope metadata of a migration payload.
///
/// Every field is optional; exports split across multiple QR codes use
/// the batch fields to describe the split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationMetadata {
    /// Payload format version
    pub version: Option<u64>,
    /// Number of QR codes in the export batch
    pub batch_size: Option<u64>,
    /// Zero-based index of this QR code within the batch
    pub batch_index: Option<u64>,
    /// Identifier shared by all QR codes of one batch
    pub batch_id: Option<u64>,
}

/// One decoded OTP credential.
///
/// All three fields are required; a sub-message missing any of them
/// fails the whole decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpParameters {
    /// Shared secret, base32-encoded without padding
    pub secret_base32: String,
    /// Account/label name
    pub name: String,
    /// Issuing service name
    pub issuer: String,
}

/// Result of decoding one migration URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Envelope metadata (version, batch info)
    pub metadata: MigrationMetadata,
    /// Credential records in wire order
    pub otp_configs: Vec<OtpParameters>,
}

/// Decode a scanned Google Authenticator migration URL.
///
/// Expects a URL of the form `otpauth-migration://offline?data=<base64>`
/// and returns the credential records embedded in its payload. Any
/// failure (wrong URL shape, bad base64, malformed protobuf, missing
/// required fields) aborts the whole decode; there is no partial result.
///
/// # Example
///
/// ```
/// let url = "otpauth-migration://offline?data=CiMKBWhlbGxvEhFhbGljZUBleGFtcGxlLmNvbRoHRXhhbXBsZRAB";
/// let payload = otpmig_core::decode_migration_url(url)?;
///
/// assert_eq!(payload.otp_configs.len(), 1);
/// assert_eq!(payload.otp_configs[0].name, "alice@example.com");
/// assert_eq!(payload.otp_configs[0].secret_base32, "NBSWY3DP");
/// # Ok::<(), otpmig_core::Error>(())
/// ```
pub fn decode_migration_url(url: &str) -> Result<DecodedPayload> {
    let data = extract_data_parameter(url)?;
    let bytes = BASE64.decode(data.as_bytes())?;
    debug!("decoded {} payload bytes from data parameter", bytes.len());

    decode_payload(&bytes)
}

/// Validate the migration URL shape and return its `data` parameter.
fn extract_data_parameter(url: &str) -> Result<String> {
    let parsed =
        Url::parse(url).map_err(|e| Error::invalid_migration_url(e.to_string()))?;

    if parsed.scheme() != MIGRATION_SCHEME {
        return Err(Error::invalid_migration_url(format!(
            "unexpected scheme '{}'",
            parsed.scheme()
        )));
    }
    if parsed.host_str() != Some(MIGRATION_HOST) {
        return Err(Error::invalid_migration_url(format!(
            "unexpected host '{}'",
            parsed.host_str().unwrap_or("")
        )));
    }

    parsed
        .query_pairs()
        .find(|(key, _)| key == "data")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| Error::invalid_migration_url("missing 'data' query parameter"))
}

/// Decode the raw payload bytes into metadata and credential records.
fn decode_payload(data: &[u8]) -> Result<DecodedPayload> {
    let mut cursor = Cursor::new(data);
    let mut metadata = MigrationMetadata::default();
    let mut otp_configs = Vec::new();

    while cursor.remaining() > 0 {
        let (field, wire_type) = read_field_header(&mut cursor)?;
        trace!("top-level field {} ({:?})", field, wire_type);

        match field {
            FIELD_OTP_PARAMETERS => {
                expect_wire_type(field, WireType::Len, wire_type)?;
                let message = read_len_delimited(&mut cursor)?;
                otp_configs.push(decode_otp_parameters(message)?);
            }
            FIELD_VERSION => {
                expect_wire_type(field, WireType::Varint, wire_type)?;
                metadata.version = Some(cursor.read_varint()?);
            }
            FIELD_BATCH_SIZE => {
                expect_wire_type(field, WireType::Varint, wire_type)?;
                metadata.batch_size = Some(cursor.read_varint()?);
            }
            FIELD_BATCH_INDEX => {
                expect_wire_type(field, WireType::Varint, wire_type)?;
                metadata.batch_index = Some(cursor.read_varint()?);
            }
            FIELD_BATCH_ID => {
                expect_wire_type(field, WireType::Varint, wire_type)?;
                metadata.batch_id = Some(cursor.read_varint()?);
            }
            _ => return Err(Error::unknown_field(field)),
        }
    }

    debug!(
        "decoded {} credential record(s), version {:?}",
        otp_configs.len(),
        metadata.version
    );

    Ok(DecodedPayload {
        metadata,
        otp_configs,
    })
}

/// Decode one length-delimited OtpParameters sub-message.
///
/// The caller hands over exactly the sub-message slice, so the inner
/// cursor is confined to it and cannot read into the outer buffer.
fn decode_otp_parameters(data: &[u8]) -> Result<OtpParameters> {
    let mut cursor = Cursor::new(data);
    let mut secret = None;
    let mut name = None;
    let mut issuer = None;

    while cursor.remaining() > 0 {
        let (field, wire_type) = read_field_header(&mut cursor)?;
        trace!("OtpParameters field {} ({:?})", field, wire_type);

        match field {
            FIELD_SECRET => {
                expect_wire_type(field, WireType::Len, wire_type)?;
                secret = Some(base32::encode(read_len_delimited(&mut cursor)?));
            }
            FIELD_NAME => {
                expect_wire_type(field, WireType::Len, wire_type)?;
                let bytes = read_len_delimited(&mut cursor)?;
                name = Some(String::from_utf8(bytes.to_vec())?);
            }
            FIELD_ISSUER => {
                expect_wire_type(field, WireType::Len, wire_type)?;
                let bytes = read_len_delimited(&mut cursor)?;
                issuer = Some(String::from_utf8(bytes.to_vec())?);
            }
            // Recognized-but-unused fields (algorithm, digits, type,
            // counter) and anything newer: drain by wire type to keep
            // the cursor synchronized, store nothing.
            _ => match wire_type {
                WireType::Len => {
                    read_len_delimited(&mut cursor)?;
                }
                WireType::Varint => {
                    cursor.read_varint()?;
                }
                other => return Err(Error::unsupported_wire_type(field, other)),
            },
        }
    }

    Ok(OtpParameters {
        secret_base32: secret.ok_or_else(|| Error::missing_field("secret"))?,
        name: name.ok_or_else(|| Error::missing_field("name"))?,
        issuer: issuer.ok_or_else(|| Error::missing_field("issuer"))?,
    })
}

/// Fail with [`Error::UnexpectedWireType`] unless the actual wire type
/// matches the expected one.
fn expect_wire_type(field: u64, expected: WireType, actual: WireType) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::unexpected_wire_type(field, expected, actual))
    }
}

/// Read one field header and split it into field number and wire type.
fn read_field_header(cursor: &mut Cursor<'_>) -> Result<(u64, WireType)> {
    let header = cursor.read_varint()?;
    let wire_type = WireType::try_from((header & 0x07) as u8)?;
    Ok((header >> 3, wire_type))
}

/// Read one length-prefixed block: a varint length, then that many bytes.
fn read_len_delimited<'a>(cursor: &mut Cursor<'a>) -> Result<&'a [u8]> {
    let length = cursor.read_varint()?;
    cursor.read_bytes(length as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Single record: secret b"hello", name "alice@example.com",
    /// issuer "Example", version 1.
    const SINGLE_RECORD_URL: &str =
        "otpauth-migration://offline?data=CiMKBWhlbGxvEhFhbGljZUBleGFtcGxlLmNvbRoHRXhhbXBsZRAB";

    #[test]
    fn test_decode_single_record() {
        let payload = decode_migration_url(SINGLE_RECORD_URL).unwrap();

        assert_eq!(payload.metadata.version, Some(1));
        assert_eq!(payload.otp_configs.len(), 1);

        let record = &payload.otp_configs[0];
        assert_eq!(record.name, "alice@example.com");
        assert_eq!(record.issuer, "Example");
        // Independently check against the base32 encoder
        assert_eq!(record.secret_base32, base32::encode(b"hello"));
        assert_eq!(record.secret_base32, "NBSWY3DP");
    }

    #[test]
    fn test_decode_metadata_fields() {
        // version=1, batch_size=2, batch_index=0, batch_id=7; no records
        let url = "otpauth-migration://offline?data=EAEYAiAAKAc=";
        let payload = decode_migration_url(url).unwrap();

        assert_eq!(
            payload.metadata,
            MigrationMetadata {
                version: Some(1),
                batch_size: Some(2),
                batch_index: Some(0),
                batch_id: Some(7),
            }
        );
        assert!(payload.otp_configs.is_empty());
    }

    #[test]
    fn test_decode_drains_unused_sub_fields() {
        // Record carrying algorithm/digits/type/counter varints plus an
        // unknown length-delimited field 9; all are discarded.
        let url = "otpauth-migration://offline?data=ChsKAgD/EgNib2IaA0dpdCABKAYwAjgASgNhYmM=";
        let payload = decode_migration_url(url).unwrap();

        assert_eq!(payload.otp_configs.len(), 1);
        let record = &payload.otp_configs[0];
        assert_eq!(record.name, "bob");
        assert_eq!(record.issuer, "Git");
        assert_eq!(record.secret_base32, "AD7Q");
    }

    #[test]
    fn test_reject_wrong_scheme() {
        let err = decode_migration_url("https://example.com?data=AAAA").unwrap_err();
        assert!(matches!(err, Error::InvalidMigrationUrl { .. }));
        assert!(err.to_string().contains("scheme"));
    }

    #[test]
    fn test_reject_wrong_host() {
        let err = decode_migration_url("otpauth-migration://online?data=AAAA").unwrap_err();
        assert!(matches!(err, Error::InvalidMigrationUrl { .. }));
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_reject_missing_data_parameter() {
        let err = decode_migration_url("otpauth-migration://offline?other=1").unwrap_err();
        assert!(matches!(err, Error::InvalidMigrationUrl { .. }));
        assert!(err.to_string().contains("data"));
    }

    #[test]
    fn test_reject_unparseable_url() {
        let err = decode_migration_url("not a url at all").unwrap_err();
        assert!(matches!(err, Error::InvalidMigrationUrl { .. }));
    }

    #[test]
    fn test_reject_bad_base64() {
        let err = decode_migration_url("otpauth-migration://offline?data=%25%25").unwrap_err();
        assert!(matches!(err, Error::Base64Decode(_)));
    }

    #[test]
    fn test_truncated_len_field_fails() {
        // Field 1 declares 16 bytes but only 3 follow
        let url = "otpauth-migration://offline?data=ChABAgM=";
        let err = decode_migration_url(url).unwrap_err();
        assert!(matches!(
            err,
            Error::BufferExhausted {
                requested: 16,
                available: 3
            }
        ));
    }

    #[test]
    fn test_unknown_top_level_field_is_fatal() {
        // Field 6 (varint) at the top level
        let data = BASE64.encode([0x30, 0x01]);
        let url = format!("otpauth-migration://offline?data={data}");
        let err = decode_migration_url(&url).unwrap_err();
        assert!(matches!(err, Error::UnknownField { field: 6 }));
    }

    #[test]
    fn test_top_level_wire_type_mismatch() {
        // Field 2 (version) encoded as length-delimited instead of varint
        let data = BASE64.encode([0x12, 0x01, 0x00]);
        let url = format!("otpauth-migration://offline?data={data}");
        let err = decode_migration_url(&url).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedWireType {
                field: 2,
                expected: WireType::Varint,
                actual: WireType::Len
            }
        ));
    }

    #[test]
    fn test_missing_issuer_fails_whole_decode() {
        // First record is complete, second lacks the issuer field
        let url = "otpauth-migration://offline?data=CiMKBWhlbGxvEhFhbGljZUBleGFtcGxlLmNvbRoHRXhhbXBsZQoMCgVoZWxsbxIDYm9i";
        let err = decode_migration_url(url).unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "issuer" }));
    }

    #[test]
    fn test_fixed_width_field_in_record_fails() {
        // Sub-message with a field 8 of wire type I64: no skip logic
        let mut sub = vec![0x41u8];
        sub.extend_from_slice(&[0u8; 8]);
        let mut payload = vec![0x0Au8, sub.len() as u8];
        payload.extend_from_slice(&sub);

        let data = BASE64.encode(&payload);
        let url = format!("otpauth-migration://offline?data={data}");
        let err = decode_migration_url(&url).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedWireType {
                field: 8,
                wire_type: WireType::I64
            }
        ));
    }

    #[test]
    fn test_invalid_utf8_name_fails() {
        // name field carrying invalid UTF-8
        let sub = [
            0x0A, 0x01, 0xAB, // secret
            0x12, 0x02, 0xC3, 0x28, // name: invalid UTF-8
            0x1A, 0x01, b'X', // issuer
        ];
        let mut payload = vec![0x0Au8, sub.len() as u8];
        payload.extend_from_slice(&sub);

        let data = BASE64.encode(payload);
        let url = format!("otpauth-migration://offline?data={data}");
        let err = decode_migration_url(&url).unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8(_)));
    }

    #[test]
    fn test_record_order_preserved() {
        // Two minimal records; output order matches wire order
        let mut payload = Vec::new();
        for (name, issuer) in [("first", "One"), ("second", "Two")] {
            let mut sub = vec![0x0Au8, 0x01, 0x42];
            sub.push(0x12);
            sub.push(name.len() as u8);
            sub.extend_from_slice(name.as_bytes());
            sub.push(0x1A);
            sub.push(issuer.len() as u8);
            sub.extend_from_slice(issuer.as_bytes());

            payload.push(0x0A);
            payload.push(sub.len() as u8);
            payload.extend_from_slice(&sub);
        }

        let data = BASE64.encode(&payload);
        let url = format!("otpauth-migration://offline?data={data}");
        let decoded = decode_migration_url(&url).unwrap();

        assert_eq!(decoded.otp_configs.len(), 2);
        assert_eq!(decoded.otp_configs[0].name, "first");
        assert_eq!(decoded.otp_configs[1].name, "second");
        assert_eq!(decoded.metadata, MigrationMetadata::default());
    }

    #[test]
    fn test_empty_payload_decodes_empty() {
        let url = "otpauth-migration://offline?data=";
        let payload = decode_migration_url(url).unwrap();
        assert!(payload.otp_configs.is_empty());
        assert_eq!(payload.metadata, MigrationMetadata::default());
    }
}
