//! Bounds-checked sequential reader over an immutable byte buffer.
//!
//! The decoder never seeks or rewinds on its normal path; it only ever
//! moves forward, one field at a time. Every read is all-or-nothing: a
//! read that would cross the end of the buffer fails without moving the
//! offset, so a failed decode never leaves a cursor in a half-consumed
//! state.

use crate::error::{Error, Result};
use crate::payload::wire::decode_varint;

/// Sequential reader over a borrowed byte buffer.
///
/// The offset is monotonically non-decreasing and never exceeds the
/// buffer length. Sub-message decoding constructs a fresh `Cursor` over
/// the length-prefixed slice, so an inner cursor can never read past its
/// own sub-message boundary regardless of what follows in the outer
/// buffer.
#[derive(Debug)]
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
    checkpoint: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor positioned at the start of `buffer`.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            offset: 0,
            checkpoint: 0,
        }
    }

    /// Decodes one varint at the current offset and advances past it.
    ///
    /// The error offset is reported relative to the start of this
    /// cursor's buffer, not the varint.
    pub fn read_varint(&mut self) -> Result<u64> {
        match decode_varint(&self.buffer[self.offset..]) {
            Ok((value, consumed)) => {
                self.offset += consumed;
                Ok(value)
            }
            Err(Error::VarintDecode { offset }) => {
                Err(Error::varint_decode(self.offset + offset))
            }
            Err(e) => Err(e),
        }
    }

    /// Returns the next `length` bytes and advances past them.
    ///
    /// All-or-nothing: if fewer than `length` bytes remain, the error
    /// reports the requested and available counts and the offset is left
    /// unchanged.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if length > available {
            return Err(Error::buffer_exhausted(length, available));
        }

        let slice = &self.buffer[self.offset..self.offset + length];
        self.offset += length;
        Ok(slice)
    }

    /// Number of unread bytes left in the buffer.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.offset
    }

    /// Records the current offset for a later [`reset_to_checkpoint`].
    ///
    /// A single checkpoint slot; saving again overwrites the previous one.
    ///
    /// [`reset_to_checkpoint`]: Cursor::reset_to_checkpoint
    pub fn save_checkpoint(&mut self) {
        self.checkpoint = self.offset;
    }

    /// Rewinds the offset to the last saved checkpoint (the buffer start
    /// if none was saved).
    pub fn reset_to_checkpoint(&mut self) {
        self.offset = self.checkpoint;
    }
}
