//! Unpadded base32 encoding of OTP secrets.
//!
//! Authenticator apps exchange shared secrets as base32 text using the
//! RFC 4648 standard alphabet (`A-Z2-7`) with the trailing `=` padding
//! omitted. This module produces exactly that form, since the output is
//! pasted verbatim into other tools.
//!
//! Only encoding is provided; the decoder never needs the inverse.

/// RFC 4648 standard base32 alphabet
const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Encode a byte sequence as unpadded base32.
///
/// Input bits are consumed in a sliding 5-bit window across byte
/// boundaries; a final partial group is left-justified into one last
/// character. No `=` padding is appended.
///
/// # Example
///
/// ```
/// assert_eq!(otpmig_core::base32::encode(b"hello"), "NBSWY3DP");
/// ```
pub fn encode(data: &[u8]) -> String {
    let mut output = String::with_capacity(data.len().div_ceil(5) * 8);
    // Accumulator holds at most 12 unflushed bits (7 carried + 8 incoming).
    let mut bits: u16 = 0;
    let mut bit_count: u8 = 0;

    for &byte in data {
        bits = (bits << 8) | u16::from(byte);
        bit_count += 8;

        while bit_count >= 5 {
            bit_count -= 5;
            let index = usize::from((bits >> bit_count) & 0x1F);
            output.push(ALPHABET[index] as char);
        }
    }

    if bit_count > 0 {
        // Flush the leftover bits, left-justified in a 5-bit group.
        let index = usize::from((bits << (5 - bit_count)) & 0x1F);
        output.push(ALPHABET[index] as char);
    }

    output
}
