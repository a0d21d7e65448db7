//! Bounds-checked reader over netlink wire bytes.
//!
//! Every decoder in this crate walks message bodies through [`ByteCursor`]
//! rather than indexing into buffers, so no component handles raw offsets.
//! Reads past the end of the buffer fail with a decode error instead of
//! panicking.
//!
//! ```ignore
//! let mut cur = ByteCursor::new(payload);
//! let header: IfAddrMsg = cur.read_header()?;
//! while let Some(attr) = cur.read_attribute()? {
//!     println!("attr {} ({} bytes)", attr.kind, attr.payload.len());
//! }
//! ```

use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;
use zerocopy::FromBytes;

use super::attr::{NLA_ALIGNTO, NLA_HDRLEN, NLA_TYPE_MASK, RawAttr};
use super::error::{Error, Result};

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

fn take_slice<'a>(input: &mut &'a [u8], len: usize) -> PResult<&'a [u8]> {
    take(len).parse_next(input)
}

/// Cursor over a byte slice with alignment-aware reads.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    input: &'a [u8],
    total: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            input: data,
            total: data.len(),
        }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    /// Whether all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.total - self.input.len()
    }

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let actual = self.remaining();
        take_slice(&mut self.input, len).map_err(|_| Error::Truncated {
            expected: len,
            actual,
        })
    }

    /// Read a fixed-size wire header (`ifaddrmsg`, `rtmsg`, ...).
    ///
    /// The value is copied out, so the buffer needs no particular alignment.
    pub fn read_header<T: FromBytes>(&mut self) -> Result<T> {
        let bytes = self.read_bytes(std::mem::size_of::<T>())?;
        T::read_from_bytes(bytes).map_err(|_| Error::Truncated {
            expected: std::mem::size_of::<T>(),
            actual: bytes.len(),
        })
    }

    /// Skip padding up to the next multiple of `alignment` (relative to the
    /// start of the buffer).
    ///
    /// Padding that would run past the end is clamped: the kernel may omit
    /// the padding of the final attribute in a message.
    pub fn align_to(&mut self, alignment: usize) {
        debug_assert!(alignment.is_power_of_two());
        let pos = self.position();
        let aligned = (pos + alignment - 1) & !(alignment - 1);
        let skip = (aligned - pos).min(self.remaining());
        self.input = &self.input[skip..];
    }

    /// Read the next rtattr, or `None` once the buffer is exhausted.
    ///
    /// The declared length must cover at least the attribute header and must
    /// not exceed the bytes left in the message. Either violation is a decode
    /// error, as is a tail too short to hold a header.
    pub fn read_attribute(&mut self) -> Result<Option<RawAttr<'a>>> {
        if self.is_empty() {
            return Ok(None);
        }
        let remaining = self.remaining();
        if remaining < NLA_HDRLEN {
            return Err(Error::InvalidAttribute(format!(
                "{} trailing bytes cannot hold an attribute header",
                remaining
            )));
        }

        let at = self.position();
        let header = self.read_bytes(NLA_HDRLEN)?;
        let len = u16::from_ne_bytes([header[0], header[1]]) as usize;
        let kind = u16::from_ne_bytes([header[2], header[3]]);

        if len < NLA_HDRLEN || len > remaining {
            return Err(Error::InvalidAttribute(format!(
                "attribute type {} at offset {} declares length {} with {} bytes left",
                kind, at, len, remaining
            )));
        }

        let payload = self.read_bytes(len - NLA_HDRLEN)?;
        self.align_to(NLA_ALIGNTO);

        Ok(Some(RawAttr {
            kind: kind & NLA_TYPE_MASK,
            payload,
        }))
    }
}
