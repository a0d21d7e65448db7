//! Netlink message fixtures for testing.
//!
//! Payload fixtures start at the family header (`ifaddrmsg`/`rtmsg`), i.e.
//! the bytes that follow nlmsghdr. The `nlmsg`/`done`/`error` helpers wrap
//! them into complete messages for dump decoder tests.
//!
//! Hand-written byte vectors use little-endian integers.

use std::net::IpAddr;

use super::attr::{NLA_HDRLEN, nla_align};
use super::message::{NLM_F_MULTI, NLMSG_HDRLEN, NlMsgHdr, NlMsgType, nlmsg_align};
use super::messages::RouteAttr;
use super::types::addr::{IfAddrMsg, Scope, ifa};
use super::types::route::{RouteType, RtMsg, rt_table, rta};

fn attr(kind: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = ((NLA_HDRLEN + payload.len()) as u16).to_ne_bytes().to_vec();
    buf.extend_from_slice(&kind.to_ne_bytes());
    buf.extend_from_slice(payload);
    buf.resize(nla_align(buf.len()), 0);
    buf
}

fn ip_bytes(addr: &str) -> (u8, Vec<u8>) {
    match addr.parse::<IpAddr>().expect("fixture address") {
        IpAddr::V4(v4) => (libc::AF_INET as u8, v4.octets().to_vec()),
        IpAddr::V6(v6) => (libc::AF_INET6 as u8, v6.octets().to_vec()),
    }
}

/// Address message for IPv4 loopback address 127.0.0.1/8.
pub fn addr_loopback_v4() -> Vec<u8> {
    vec![
        // ifaddrmsg
        0x02, // family = AF_INET
        0x08, // prefixlen = 8
        0x80, // flags = IFA_F_PERMANENT
        0xfe, // scope = RT_SCOPE_HOST (254)
        0x01, 0x00, 0x00, 0x00, // index = 1
        // IFA_ADDRESS = 127.0.0.1
        0x08, 0x00, // len = 8
        0x01, 0x00, // type = IFA_ADDRESS (1)
        0x7f, 0x00, 0x00, 0x01, // 127.0.0.1
        // IFA_LOCAL = 127.0.0.1
        0x08, 0x00, // len = 8
        0x02, 0x00, // type = IFA_LOCAL (2)
        0x7f, 0x00, 0x00, 0x01, // 127.0.0.1
        // IFA_LABEL = "lo"
        0x07, 0x00, // len = 7
        0x03, 0x00, // type = IFA_LABEL (3)
        b'l', b'o', 0x00, 0x00, // "lo\0" + padding
    ]
}

/// Secondary IPv4 address with IFA_CACHEINFO between ADDRESS and LOCAL.
pub fn addr_with_unknown_attr() -> Vec<u8> {
    vec![
        0x02, // family = AF_INET
        0x18, // prefixlen = 24
        0x01, // flags = IFA_F_SECONDARY
        0x00, // scope = RT_SCOPE_UNIVERSE
        0x02, 0x00, 0x00, 0x00, // index = 2
        // IFA_ADDRESS = 10.1.2.3
        0x08, 0x00, 0x01, 0x00, 0x0a, 0x01, 0x02, 0x03,
        // IFA_CACHEINFO (4 x u32)
        0x14, 0x00, // len = 20
        0x06, 0x00, // type = IFA_CACHEINFO (6)
        0xff, 0xff, 0xff, 0xff, // ifa_prefered
        0xff, 0xff, 0xff, 0xff, // ifa_valid
        0x10, 0x00, 0x00, 0x00, // cstamp
        0x10, 0x00, 0x00, 0x00, // tstamp
        // IFA_LOCAL = 10.1.2.3
        0x08, 0x00, 0x02, 0x00, 0x0a, 0x01, 0x02, 0x03,
    ]
}

/// IPv4 address record whose IFA_ADDRESS carries five bytes.
pub fn addr_bad_width() -> Vec<u8> {
    vec![
        0x02, 0x18, 0x00, 0x00, // AF_INET /24 universe
        0x02, 0x00, 0x00, 0x00, // index = 2
        0x09, 0x00, // len = 9
        0x01, 0x00, // type = IFA_ADDRESS (1)
        0x0a, 0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x00, // 5 bytes + padding
    ]
}

/// IPv4 address record carrying both IFA_ADDRESS and IFA_LOCAL.
pub fn addr_v4(index: u32, prefix_len: u8, scope: Scope, addr: &str) -> Vec<u8> {
    let (family, octets) = ip_bytes(addr);
    let mut buf = IfAddrMsg::new()
        .with_family(family)
        .with_prefixlen(prefix_len)
        .with_scope(scope.into())
        .with_index(index)
        .as_bytes()
        .to_vec();
    buf.extend(attr(ifa::ADDRESS, &octets));
    buf.extend(attr(ifa::LOCAL, &octets));
    buf
}

/// IPv4 point-to-point record: IFA_ADDRESS is the peer, IFA_LOCAL our end.
pub fn addr_v4_peer(index: u32, local: &str, peer: &str) -> Vec<u8> {
    let (family, local) = ip_bytes(local);
    let (_, peer) = ip_bytes(peer);
    let mut buf = IfAddrMsg::new()
        .with_family(family)
        .with_prefixlen(32)
        .with_index(index)
        .as_bytes()
        .to_vec();
    buf.extend(attr(ifa::ADDRESS, &peer));
    buf.extend(attr(ifa::LOCAL, &local));
    buf
}

/// IPv6 address record carrying IFA_ADDRESS only, as the kernel sends them.
pub fn addr_v6(index: u32, prefix_len: u8, scope: Scope, addr: &str) -> Vec<u8> {
    let (family, octets) = ip_bytes(addr);
    let mut buf = IfAddrMsg::new()
        .with_family(family)
        .with_prefixlen(prefix_len)
        .with_scope(scope.into())
        .with_index(index)
        .as_bytes()
        .to_vec();
    buf.extend(attr(ifa::ADDRESS, &octets));
    buf.extend(attr(ifa::FLAGS, &0x80u32.to_ne_bytes()));
    buf
}

fn encode_route_attr(route_attr: &RouteAttr) -> Vec<u8> {
    let ip = |addr: &IpAddr| match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    };
    match route_attr {
        RouteAttr::Destination(dst) => attr(rta::DST, &ip(dst)),
        RouteAttr::OutputInterface(idx) => attr(rta::OIF, &idx.to_ne_bytes()),
        RouteAttr::Gateway(gw) => attr(rta::GATEWAY, &ip(gw)),
        RouteAttr::Priority(prio) => attr(rta::PRIORITY, &prio.to_ne_bytes()),
        RouteAttr::Table(table) => attr(rta::TABLE, &table.to_ne_bytes()),
    }
}

/// Route record with an arbitrary header and attributes in the given order.
pub fn route(header: RtMsg, attrs: &[RouteAttr]) -> Vec<u8> {
    let mut buf = header.as_bytes().to_vec();
    for a in attrs {
        buf.extend(encode_route_attr(a));
    }
    buf
}

/// Header of a unicast main-table route with an empty destination prefix.
pub fn default_route_header(family: u8) -> RtMsg {
    RtMsg::new()
        .with_family(family)
        .with_table(rt_table::MAIN)
        .with_protocol(16) // dhcp
        .with_type(RouteType::Unicast as u8)
}

/// Default route: `default via <gw> dev <oif>`.
pub fn route_default_v4(oif: u32, gateway: &str) -> Vec<u8> {
    let (family, _) = ip_bytes(gateway);
    route(
        default_route_header(family),
        &[
            RouteAttr::Table(rt_table::MAIN as u32),
            RouteAttr::Gateway(gateway.parse().expect("fixture gateway")),
            RouteAttr::OutputInterface(oif),
        ],
    )
}

/// IPv6 default route, gateway after the output interface.
pub fn route_default_v6(oif: u32, gateway: &str) -> Vec<u8> {
    let (family, _) = ip_bytes(gateway);
    route(
        default_route_header(family),
        &[
            RouteAttr::Table(rt_table::MAIN as u32),
            RouteAttr::Priority(1024),
            RouteAttr::OutputInterface(oif),
            RouteAttr::Gateway(gateway.parse().expect("fixture gateway")),
        ],
    )
}

/// Link-scope subnet route: `<dst>/<len> dev <oif> proto kernel`.
pub fn route_subnet_v4(oif: u32, dst: &str, dst_len: u8) -> Vec<u8> {
    let (family, _) = ip_bytes(dst);
    let header = RtMsg::new()
        .with_family(family)
        .with_dst_len(dst_len)
        .with_table(rt_table::MAIN)
        .with_protocol(2) // kernel
        .with_scope(Scope::Link.into())
        .with_type(RouteType::Unicast as u8);
    route(
        header,
        &[
            RouteAttr::Table(rt_table::MAIN as u32),
            RouteAttr::Destination(dst.parse().expect("fixture destination")),
            RouteAttr::OutputInterface(oif),
        ],
    )
}

/// Default route in a table whose ID does not fit the header byte.
pub fn route_in_table(table: u32) -> Vec<u8> {
    let header = default_route_header(libc::AF_INET as u8).with_table(rt_table::COMPAT);
    route(
        header,
        &[
            RouteAttr::Table(table),
            RouteAttr::Gateway("10.0.0.1".parse().expect("fixture gateway")),
            RouteAttr::OutputInterface(3),
        ],
    )
}

/// IPv4 route whose RTA_GATEWAY is sixteen bytes long.
pub fn route_bad_gateway() -> Vec<u8> {
    let mut buf = default_route_header(libc::AF_INET as u8).as_bytes().to_vec();
    buf.extend(attr(rta::GATEWAY, &[0u8; 16]));
    buf
}

/// Wrap a payload into a complete netlink message.
pub fn nlmsg(msg_type: u16, flags: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
    let mut header = NlMsgHdr::new(msg_type, flags);
    header.nlmsg_len = (NLMSG_HDRLEN + payload.len()) as u32;
    header.nlmsg_seq = seq;
    let mut buf = header.as_bytes().to_vec();
    buf.extend_from_slice(payload);
    buf.resize(nlmsg_align(buf.len()), 0);
    buf
}

/// `RTM_NEWADDR` dump message.
pub fn newaddr(seq: u32, payload: &[u8]) -> Vec<u8> {
    nlmsg(NlMsgType::RTM_NEWADDR, NLM_F_MULTI, seq, payload)
}

/// `RTM_NEWROUTE` dump message.
pub fn newroute(seq: u32, payload: &[u8]) -> Vec<u8> {
    nlmsg(NlMsgType::RTM_NEWROUTE, NLM_F_MULTI, seq, payload)
}

/// `NLMSG_DONE` terminator.
pub fn done(seq: u32) -> Vec<u8> {
    done_with_code(seq, 0)
}

/// `NLMSG_DONE` whose payload carries `code` (a negated errno on failure).
pub fn done_with_code(seq: u32, code: i32) -> Vec<u8> {
    nlmsg(NlMsgType::DONE, NLM_F_MULTI, seq, &code.to_ne_bytes())
}

/// `NLMSG_ERROR` carrying `-errno` (0 is an acknowledgement).
pub fn error(seq: u32, errno: i32) -> Vec<u8> {
    error_with_code(seq, -errno)
}

/// `NLMSG_ERROR` carrying `code` verbatim.
pub fn error_with_code(seq: u32, code: i32) -> Vec<u8> {
    let mut payload = code.to_ne_bytes().to_vec();
    let mut orig = NlMsgHdr::new(NlMsgType::RTM_GETADDR, 0);
    orig.nlmsg_len = NLMSG_HDRLEN as u32;
    orig.nlmsg_seq = seq;
    payload.extend_from_slice(orig.as_bytes());
    nlmsg(NlMsgType::ERROR, 0, seq, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::message::MessageIter;

    #[test]
    fn test_attr_helper_matches_hand_bytes() {
        let built = addr_v4(1, 8, Scope::Host, "127.0.0.1");
        let hand = addr_loopback_v4();
        // Hand-written record additionally carries IFA_F_PERMANENT.
        assert_eq!(built[..2], hand[..2]);
        assert_eq!(built[3..], hand[3..built.len()]);
    }

    #[test]
    fn test_wrapped_messages_iterate() {
        let mut chunk = newaddr(9, &addr_loopback_v4());
        chunk.extend(done(9));

        let types: Vec<u16> = MessageIter::new(&chunk)
            .map(|m| m.unwrap().0.nlmsg_type)
            .collect();
        assert_eq!(types, vec![NlMsgType::RTM_NEWADDR, NlMsgType::DONE]);
    }
}
