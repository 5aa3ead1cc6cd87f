//! # otpmig-core
//!
//! A library for decoding Google Authenticator export QR payloads into
//! structured OTP credential records.
//!
//! This crate provides the core functionality for:
//! - Validating `otpauth-migration://offline?data=...` URLs
//! - Parsing the embedded protobuf wire format payload
//! - Rendering shared secrets as unpadded base32 text
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`payload`]: Migration URL handling and wire format decoding
//! - [`base32`]: Unpadded RFC 4648 base32 encoding of secrets
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use otpmig_core::decode_migration_url;
//!
//! // The string scanned from an export QR code
//! let url = "otpauth-migration://offline?data=...";
//!
//! let payload = decode_migration_url(url)?;
//! for record in &payload.otp_configs {
//!     println!("{} ({}): {}", record.name, record.issuer, record.secret_base32);
//! }
//! # Ok::<(), otpmig_core::Error>(())
//! ```
//!
//! Decoding is a pure, single-pass computation over an in-memory buffer:
//! no I/O, no shared state, and every failure aborts the whole decode
//! rather than returning a partial record list.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod base32;
pub mod error;
pub mod payload;

// Re-export primary types for convenience
pub use error::{Error, Result};
pub use payload::{
    decode_migration_url, DecodedPayload, MigrationMetadata, OtpParameters,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
