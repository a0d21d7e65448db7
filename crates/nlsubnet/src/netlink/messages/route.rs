//! Strongly-typed route record.

use std::net::IpAddr;

use tracing::trace;

use crate::netlink::attr::get;
use crate::netlink::cursor::ByteCursor;
use crate::netlink::error::Result;
use crate::netlink::message::NlMsgType;
use crate::netlink::parse::FromNetlink;
use crate::netlink::types::Family;
use crate::netlink::types::route::{RouteType, RtMsg, rt_table, rta, rtprot};

/// One route attribute the resolver understands.
///
/// Records keep these in wire order: whether a gateway belongs to an
/// interface depends on what follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAttr {
    /// RTA_DST.
    Destination(IpAddr),
    /// RTA_OIF.
    OutputInterface(u32),
    /// RTA_GATEWAY.
    Gateway(IpAddr),
    /// RTA_PRIORITY.
    Priority(u32),
    /// RTA_TABLE, overriding the 8-bit header field.
    Table(u32),
}

/// One `RTM_NEWROUTE` record from a route dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub(crate) header: RtMsg,
    pub(crate) attrs: Vec<RouteAttr>,
}

impl RouteRecord {
    /// Get the raw address family byte.
    pub fn family(&self) -> u8 {
        self.header.rtm_family
    }

    /// Get the address family, if it is one the resolver handles.
    pub fn ip_family(&self) -> Option<Family> {
        Family::from_af(self.header.rtm_family)
    }

    /// Get the destination prefix length.
    pub fn dst_len(&self) -> u8 {
        self.header.rtm_dst_len
    }

    /// Get the routing table ID (RTA_TABLE wins over the header byte).
    pub fn table_id(&self) -> u32 {
        self.attrs
            .iter()
            .find_map(|a| match a {
                RouteAttr::Table(t) => Some(*t),
                _ => None,
            })
            .unwrap_or(self.header.rtm_table as u32)
    }

    /// Get the route type.
    pub fn route_type(&self) -> RouteType {
        RouteType::from(self.header.rtm_type)
    }

    /// Attributes in the order they appeared on the wire.
    pub fn attrs(&self) -> &[RouteAttr] {
        &self.attrs
    }

    /// Get the first gateway attribute.
    pub fn gateway(&self) -> Option<&IpAddr> {
        self.attrs.iter().find_map(|a| match a {
            RouteAttr::Gateway(gw) => Some(gw),
            _ => None,
        })
    }

    /// Get the first output interface attribute.
    pub fn oif(&self) -> Option<u32> {
        self.attrs.iter().find_map(|a| match a {
            RouteAttr::OutputInterface(idx) => Some(*idx),
            _ => None,
        })
    }

    /// Get the destination attribute.
    pub fn destination(&self) -> Option<&IpAddr> {
        self.attrs.iter().find_map(|a| match a {
            RouteAttr::Destination(dst) => Some(dst),
            _ => None,
        })
    }

    /// Whether this route could be the default route: a unicast route in
    /// the main table with an empty destination prefix.
    pub fn is_default_candidate(&self) -> bool {
        self.table_id() == rt_table::MAIN as u32
            && self.route_type() == RouteType::Unicast
            && self.header.rtm_dst_len == 0
    }
}

impl FromNetlink for RouteRecord {
    const MSG_TYPE: u16 = NlMsgType::RTM_NEWROUTE;
    const DUMP_TYPE: u16 = NlMsgType::RTM_GETROUTE;

    fn write_dump_header(buf: &mut Vec<u8>, family: Family) {
        let header = RtMsg::new()
            .with_family(family.as_af())
            .with_table(rt_table::MAIN)
            .with_protocol(rtprot::UNSPEC)
            .with_scope(0)
            .with_type(RouteType::Unicast as u8);
        buf.extend_from_slice(header.as_bytes());
    }

    fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let header: RtMsg = cursor.read_header()?;
        let family = header.rtm_family;
        let mut attrs = Vec::new();

        while let Some(attr) = cursor.read_attribute()? {
            let parsed = match attr.kind {
                rta::DST => RouteAttr::Destination(get::ip_addr(attr.payload, family)?),
                rta::OIF => RouteAttr::OutputInterface(get::u32_ne(attr.payload)?),
                rta::GATEWAY => RouteAttr::Gateway(get::ip_addr(attr.payload, family)?),
                rta::PRIORITY => RouteAttr::Priority(get::u32_ne(attr.payload)?),
                rta::TABLE => RouteAttr::Table(get::u32_ne(attr.payload)?),
                kind => {
                    trace!(kind, len = attr.payload.len(), "skipping route attribute");
                    continue;
                }
            };
            attrs.push(parsed);
        }

        Ok(Self { header, attrs })
    }
}
