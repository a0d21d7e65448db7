//! Strongly-typed address record.

use std::net::IpAddr;

use tracing::trace;

use crate::netlink::attr::get;
use crate::netlink::cursor::ByteCursor;
use crate::netlink::error::Result;
use crate::netlink::message::NlMsgType;
use crate::netlink::parse::FromNetlink;
use crate::netlink::types::Family;
use crate::netlink::types::addr::{IfAddrMsg, Scope, ifa, ifa_flags};

/// One `RTM_NEWADDR` record from an address dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Fixed-size header.
    pub(crate) header: IfAddrMsg,
    /// Address (IFA_ADDRESS).
    pub(crate) address: Option<IpAddr>,
    /// Local address (IFA_LOCAL). Differs from `address` only on
    /// point-to-point links, where `address` is the peer.
    pub(crate) local: Option<IpAddr>,
    /// Extended flags (IFA_FLAGS), superseding the 8-bit header flags.
    pub(crate) flags: Option<u32>,
}

impl AddressRecord {
    /// Get the raw address family byte.
    pub fn family(&self) -> u8 {
        self.header.ifa_family
    }

    /// Get the address family, if it is one the resolver handles.
    pub fn ip_family(&self) -> Option<Family> {
        Family::from_af(self.header.ifa_family)
    }

    /// Get the prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.header.ifa_prefixlen
    }

    /// Get the interface index.
    pub fn ifindex(&self) -> u32 {
        self.header.ifa_index
    }

    /// Get the scope.
    pub fn scope(&self) -> Scope {
        Scope::from(self.header.ifa_scope)
    }

    /// Get the IFA_ADDRESS attribute.
    pub fn address(&self) -> Option<&IpAddr> {
        self.address.as_ref()
    }

    /// Get the IFA_LOCAL attribute.
    pub fn local(&self) -> Option<&IpAddr> {
        self.local.as_ref()
    }

    /// Get the interface's own address (local, falling back to address).
    pub fn primary_address(&self) -> Option<&IpAddr> {
        self.local.as_ref().or(self.address.as_ref())
    }

    fn flags(&self) -> u32 {
        self.flags.unwrap_or(self.header.ifa_flags as u32)
    }

    /// Check if this is a secondary/temporary address.
    pub fn is_secondary(&self) -> bool {
        self.flags() & ifa_flags::SECONDARY != 0
    }

    /// Check if this address is still undergoing duplicate address detection.
    pub fn is_tentative(&self) -> bool {
        self.flags() & ifa_flags::TENTATIVE != 0
    }
}

impl FromNetlink for AddressRecord {
    const MSG_TYPE: u16 = NlMsgType::RTM_NEWADDR;
    const DUMP_TYPE: u16 = NlMsgType::RTM_GETADDR;

    fn write_dump_header(buf: &mut Vec<u8>, family: Family) {
        let header = IfAddrMsg::new().with_family(family.as_af());
        buf.extend_from_slice(header.as_bytes());
    }

    fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let header: IfAddrMsg = cursor.read_header()?;

        let mut msg = AddressRecord {
            header,
            address: None,
            local: None,
            flags: None,
        };

        while let Some(attr) = cursor.read_attribute()? {
            match attr.kind {
                ifa::ADDRESS => {
                    msg.address = Some(get::ip_addr(attr.payload, header.ifa_family)?);
                }
                ifa::LOCAL => {
                    msg.local = Some(get::ip_addr(attr.payload, header.ifa_family)?);
                }
                ifa::FLAGS => {
                    msg.flags = Some(get::u32_ne(attr.payload)?);
                }
                kind => trace!(kind, len = attr.payload.len(), "skipping address attribute"),
            }
        }

        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::error::Error;
    use crate::netlink::fixtures;

    #[test]
    fn test_parse_loopback_v4() {
        let data = fixtures::addr_loopback_v4();
        let addr = AddressRecord::from_bytes(&data).expect("failed to parse address record");

        assert_eq!(addr.ifindex(), 1);
        assert_eq!(addr.prefix_len(), 8);
        assert_eq!(addr.ip_family(), Some(Family::V4));
        assert_eq!(addr.scope(), Scope::Host);
        assert_eq!(addr.primary_address().unwrap().to_string(), "127.0.0.1");
    }

    #[test]
    fn test_parse_global_v6_with_flags() {
        let data = fixtures::addr_v6(4, 64, Scope::Universe, "2001:db8:0:1::20");
        let addr = AddressRecord::from_bytes(&data).unwrap();

        assert_eq!(addr.ifindex(), 4);
        assert_eq!(addr.scope(), Scope::Universe);
        assert_eq!(addr.address().unwrap().to_string(), "2001:db8:0:1::20");
        assert!(addr.local().is_none());
        assert!(!addr.is_tentative());
    }

    #[test]
    fn test_unknown_attribute_between_known_ones() {
        let data = fixtures::addr_with_unknown_attr();
        let addr = AddressRecord::from_bytes(&data).unwrap();

        assert_eq!(addr.address().unwrap().to_string(), "10.1.2.3");
        assert_eq!(addr.local().unwrap().to_string(), "10.1.2.3");
        assert!(addr.is_secondary());
    }

    #[test]
    fn test_wrong_address_width_is_rejected() {
        let data = fixtures::addr_bad_width();
        assert!(matches!(
            AddressRecord::from_bytes(&data),
            Err(Error::InvalidAttribute(_))
        ));
    }

    #[test]
    fn test_truncated_header() {
        assert!(matches!(
            AddressRecord::from_bytes(&[2, 24, 0]),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_dump_header() {
        let mut buf = Vec::new();
        AddressRecord::write_dump_header(&mut buf, Family::V6);
        assert_eq!(buf, vec![10, 0, 0, 0, 0, 0, 0, 0]);
    }
}
