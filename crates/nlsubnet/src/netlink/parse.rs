//! Traits for strongly-typed netlink record parsing.
//!
//! # Example
//!
//! ```ignore
//! use nlsubnet::netlink::parse::FromNetlink;
//! use nlsubnet::netlink::messages::AddressRecord;
//!
//! // Parse a message payload (the bytes after nlmsghdr)
//! let record = AddressRecord::from_bytes(&payload)?;
//! ```

use super::cursor::ByteCursor;
use super::error::Result;
use super::types::Family;

/// Trait for records that can be parsed from netlink wire format.
pub trait FromNetlink: Sized {
    /// Message type the kernel uses for one record of this kind.
    const MSG_TYPE: u16;

    /// Request type that dumps records of this kind.
    const DUMP_TYPE: u16;

    /// Parse from a cursor positioned at the start of the message payload.
    fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self>;

    /// Parse from a complete message payload.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse(&mut ByteCursor::new(data))
    }

    /// Write the family-specific header that follows nlmsghdr in a dump
    /// request for this record kind.
    fn write_dump_header(buf: &mut Vec<u8>, family: Family);
}
