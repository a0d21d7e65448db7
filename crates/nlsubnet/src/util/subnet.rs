//! IPv4/IPv6 prefix arithmetic and CIDR notation.
//!
//! IPv4 subnets follow the reported prefix length. IPv6 subnets are always
//! the /64 containing the address, whatever length the kernel reported.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Error type for address parsing and prefix arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddrError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid prefix length: {0}")]
    InvalidPrefix(String),
}

pub type Result<T> = std::result::Result<T, AddrError>;

/// Prefix length of every derived IPv6 subnet.
pub const IPV6_SUBNET_PREFIX: u8 = 64;

fn check_prefix(prefix_len: u8, max: u8) -> Result<()> {
    if prefix_len > max {
        return Err(AddrError::InvalidPrefix(format!(
            "{} exceeds maximum {} for address family",
            prefix_len, max
        )));
    }
    Ok(())
}

/// IPv4 netmask with the top `prefix_len` bits set.
pub fn ipv4_mask(prefix_len: u8) -> Result<Ipv4Addr> {
    check_prefix(prefix_len, 32)?;
    let bits = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
    Ok(Ipv4Addr::from(bits))
}

/// Network address of `addr` under a `prefix_len` mask.
pub fn ipv4_routing_prefix(addr: Ipv4Addr, prefix_len: u8) -> Result<Ipv4Addr> {
    let mask = ipv4_mask(prefix_len)?;
    Ok(Ipv4Addr::from(u32::from(addr) & u32::from(mask)))
}

/// The /64 containing `addr`.
pub fn ipv6_subnet(addr: Ipv6Addr) -> Ipv6Addr {
    Ipv6Addr::from(u128::from(addr) & !(u64::MAX as u128))
}

fn split_cidr(s: &str) -> (&str, Option<&str>) {
    match s.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (s, None),
    }
}

fn parse_prefix_len(s: &str, max: u8) -> Result<u8> {
    let prefix_len: u8 = s
        .parse()
        .map_err(|_| AddrError::InvalidPrefix(s.to_string()))?;
    check_prefix(prefix_len, max)?;
    Ok(prefix_len)
}

/// An IPv4 address with its prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Cidr {
    addr: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Cidr {
    /// Create from an address and a prefix length in `0..=32`.
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self> {
        check_prefix(prefix_len, 32)?;
        Ok(Self { addr, prefix_len })
    }

    /// Get the address.
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    /// Get the prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// The subnet this address lives in.
    ///
    /// `None` for prefix length 0, which means no prefix was reported.
    pub fn subnet(&self) -> Option<Ipv4SubnetView> {
        if self.prefix_len == 0 {
            return None;
        }
        let mask = ipv4_mask(self.prefix_len).ok()?;
        Some(Ipv4SubnetView {
            network: Ipv4Addr::from(u32::from(self.addr) & u32::from(mask)),
            mask,
            prefix_len: self.prefix_len,
        })
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = AddrError;

    /// Parse `a.b.c.d` or `a.b.c.d/n`; a missing suffix means /32.
    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = split_cidr(s);
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| AddrError::InvalidAddress(s.to_string()))?;
        let prefix_len = match prefix {
            Some(p) => parse_prefix_len(p, 32)?,
            None => 32,
        };
        Ok(Self { addr, prefix_len })
    }
}

/// Network, mask and prefix length of an IPv4 subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4SubnetView {
    network: Ipv4Addr,
    mask: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4SubnetView {
    /// Routing prefix (network address).
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Subnet mask.
    pub fn mask(&self) -> Ipv4Addr {
        self.mask
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Render the network address, with `/n` if `cidr` is set.
    pub fn render(&self, cidr: bool) -> String {
        if cidr {
            self.to_string()
        } else {
            self.network.to_string()
        }
    }
}

impl fmt::Display for Ipv4SubnetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// An IPv6 address with its prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv6Cidr {
    addr: Ipv6Addr,
    prefix_len: u8,
}

impl Ipv6Cidr {
    /// Create from an address and a prefix length in `0..=128`.
    pub fn new(addr: Ipv6Addr, prefix_len: u8) -> Result<Self> {
        check_prefix(prefix_len, 128)?;
        Ok(Self { addr, prefix_len })
    }

    /// Get the address.
    pub fn addr(&self) -> Ipv6Addr {
        self.addr
    }

    /// Get the prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// The /64 this address lives in.
    pub fn subnet(&self) -> Ipv6SubnetView {
        Ipv6SubnetView {
            network: ipv6_subnet(self.addr),
        }
    }
}

impl fmt::Display for Ipv6Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

impl FromStr for Ipv6Cidr {
    type Err = AddrError;

    /// Parse `addr` or `addr/n`; a missing suffix means /128.
    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = split_cidr(s);
        let addr: Ipv6Addr = addr
            .parse()
            .map_err(|_| AddrError::InvalidAddress(s.to_string()))?;
        let prefix_len = match prefix {
            Some(p) => parse_prefix_len(p, 128)?,
            None => 128,
        };
        Ok(Self { addr, prefix_len })
    }
}

/// A derived IPv6 /64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6SubnetView {
    network: Ipv6Addr,
}

impl Ipv6SubnetView {
    pub fn network(&self) -> Ipv6Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        IPV6_SUBNET_PREFIX
    }

    /// Render the network address, with `/64` if `cidr` is set.
    pub fn render(&self, cidr: bool) -> String {
        if cidr {
            self.to_string()
        } else {
            self.network.to_string()
        }
    }
}

impl fmt::Display for Ipv6SubnetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, IPV6_SUBNET_PREFIX)
    }
}

#[cfg(feature = "output")]
mod serialize {
    use serde::{Serialize, Serializer};

    use super::*;

    macro_rules! serialize_display {
        ($($ty:ty),*) => {
            $(impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
                    s.collect_str(self)
                }
            })*
        };
    }

    serialize_display!(Ipv4Cidr, Ipv4SubnetView, Ipv6Cidr, Ipv6SubnetView);
}
