//! Netlink attribute (rtattr/nlattr) handling.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4; // nla_align(size_of::<NlAttr>())

/// Netlink attribute header (mirrors struct nlattr / struct rtattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl NlAttr {
    /// Create a new attribute header.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Get the attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }
}

/// One attribute borrowed from a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAttr<'a> {
    /// Attribute type with the nested/byte-order flags masked off.
    pub kind: u16,
    /// Payload, excluding header and padding.
    pub payload: &'a [u8],
}

/// Helper functions for extracting typed values from attribute payloads.
pub mod get {
    use super::*;

    /// Extract a u8 value.
    pub fn u8(data: &[u8]) -> Result<u8> {
        data.first()
            .copied()
            .ok_or_else(|| Error::InvalidAttribute("empty u8 attribute".into()))
    }

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        let bytes: [u8; 4] = data
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| Error::InvalidAttribute("truncated u32 attribute".into()))?;
        Ok(u32::from_ne_bytes(bytes))
    }

    /// Extract an IPv4 address (network order payload).
    pub fn ipv4(data: &[u8]) -> Result<Ipv4Addr> {
        let octets: [u8; 4] = data.try_into().map_err(|_| {
            Error::InvalidAttribute(format!("IPv4 address of {} bytes", data.len()))
        })?;
        Ok(Ipv4Addr::from(octets))
    }

    /// Extract an IPv6 address (network order payload).
    pub fn ipv6(data: &[u8]) -> Result<Ipv6Addr> {
        let octets: [u8; 16] = data.try_into().map_err(|_| {
            Error::InvalidAttribute(format!("IPv6 address of {} bytes", data.len()))
        })?;
        Ok(Ipv6Addr::from(octets))
    }

    /// Extract an IP address whose width is fixed by the address family.
    pub fn ip_addr(data: &[u8], family: u8) -> Result<IpAddr> {
        match family as i32 {
            libc::AF_INET => ipv4(data).map(IpAddr::V4),
            libc::AF_INET6 => ipv6(data).map(IpAddr::V6),
            other => Err(Error::InvalidMessage(format!(
                "unknown address family: {}",
                other
            ))),
        }
    }
}
