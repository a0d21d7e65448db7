//! Scripted kernel for resolver tests.
//!
//! `ScriptedKernel` stands in for `SIOCGIFINDEX` and the netlink socket:
//! interface names map to fixed indices and each opened source replays one
//! scripted dump reply. Opening more sources than were scripted fails, so a
//! test can assert that an exchange never happened.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;

use nlsubnet::netlink::message::NLM_F_MULTI;
use nlsubnet::netlink::types::addr::{IfAddrMsg, Scope, ifa};
use nlsubnet::netlink::types::route::{RouteType, RtMsg, rt_table, rta};
use nlsubnet::netlink::{ChunkSource, MessageBuilder, NlMsgHdr, NlMsgType};
use nlsubnet::{Error, ResolverConfig, Result, Transport};

/// Sequence number every fresh scripted source starts with.
pub const SEQ: u32 = 1;

fn ip_octets(addr: &str) -> (u8, Vec<u8>) {
    match addr.parse::<IpAddr>().expect("test address") {
        IpAddr::V4(v4) => (libc::AF_INET as u8, v4.octets().to_vec()),
        IpAddr::V6(v6) => (libc::AF_INET6 as u8, v6.octets().to_vec()),
    }
}

/// `RTM_NEWADDR` message for `addr/prefix_len` on `index`.
pub fn newaddr(index: u32, addr: &str, prefix_len: u8, scope: Scope) -> Vec<u8> {
    let (family, octets) = ip_octets(addr);
    let header = IfAddrMsg::new()
        .with_family(family)
        .with_prefixlen(prefix_len)
        .with_scope(scope.into())
        .with_index(index);

    let mut msg = MessageBuilder::new(NlMsgType::RTM_NEWADDR, NLM_F_MULTI);
    msg.append_bytes(header.as_bytes());
    msg.append_attr(ifa::ADDRESS, &octets);
    if family == libc::AF_INET as u8 {
        msg.append_attr(ifa::LOCAL, &octets);
        msg.append_attr(ifa::LABEL, b"eth0\0");
    }
    msg.set_seq(SEQ);
    msg.finish()
}

/// `RTM_NEWROUTE` message for `default via <gateway> dev <oif>`.
pub fn default_route(oif: u32, gateway: &str) -> Vec<u8> {
    let (family, octets) = ip_octets(gateway);
    let header = RtMsg::new()
        .with_family(family)
        .with_table(rt_table::MAIN)
        .with_protocol(16)
        .with_type(RouteType::Unicast as u8);

    let mut msg = MessageBuilder::new(NlMsgType::RTM_NEWROUTE, NLM_F_MULTI);
    msg.append_bytes(header.as_bytes());
    msg.append_attr_u32(rta::TABLE, rt_table::MAIN as u32);
    msg.append_attr_u32(rta::PRIORITY, 100);
    msg.append_attr(rta::GATEWAY, &octets);
    msg.append_attr_u32(rta::OIF, oif);
    msg.set_seq(SEQ);
    msg.finish()
}

/// `RTM_NEWROUTE` message for an on-link subnet route.
pub fn subnet_route(oif: u32, dst: &str, dst_len: u8) -> Vec<u8> {
    let (family, octets) = ip_octets(dst);
    let header = RtMsg::new()
        .with_family(family)
        .with_dst_len(dst_len)
        .with_table(rt_table::MAIN)
        .with_protocol(2)
        .with_scope(Scope::Link.into())
        .with_type(RouteType::Unicast as u8);

    let mut msg = MessageBuilder::new(NlMsgType::RTM_NEWROUTE, NLM_F_MULTI);
    msg.append_bytes(header.as_bytes());
    msg.append_attr_u32(rta::TABLE, rt_table::MAIN as u32);
    msg.append_attr(rta::DST, &octets);
    msg.append_attr_u32(rta::OIF, oif);
    msg.set_seq(SEQ);
    msg.finish()
}

/// `NLMSG_DONE` terminator.
pub fn done() -> Vec<u8> {
    failed_done(0)
}

/// `NLMSG_DONE` reporting that the dump stopped with `-errno`.
pub fn failed_done(errno: i32) -> Vec<u8> {
    let mut msg = MessageBuilder::new(NlMsgType::DONE, NLM_F_MULTI);
    msg.append_bytes(&(-errno).to_ne_bytes());
    msg.set_seq(SEQ);
    msg.finish()
}

/// `NLMSG_ERROR` carrying `-errno`.
pub fn kernel_error(errno: i32) -> Vec<u8> {
    let mut orig = NlMsgHdr::new(NlMsgType::RTM_GETROUTE, 0);
    orig.nlmsg_len = 16;
    orig.nlmsg_seq = SEQ;

    let mut msg = MessageBuilder::new(NlMsgType::ERROR, 0);
    msg.append_bytes(&(-errno).to_ne_bytes());
    msg.append_bytes(orig.as_bytes());
    msg.set_seq(SEQ);
    msg.finish()
}

/// A scripted dump reply: the chunks one source hands out.
pub type Reply = Vec<Vec<u8>>;

/// Fake kernel shared between a test and the resolver under test.
#[derive(Clone, Default)]
pub struct ScriptedKernel {
    indices: HashMap<String, u32>,
    replies: Rc<RefCell<VecDeque<Reply>>>,
    sent: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl ScriptedKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interface.
    pub fn interface(mut self, name: &str, index: u32) -> Self {
        self.indices.insert(name.to_string(), index);
        self
    }

    /// Queue the reply for the next opened source.
    pub fn reply(self, chunks: Reply) -> Self {
        self.replies.borrow_mut().push_back(chunks);
        self
    }

    /// Requests sent so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.borrow().clone()
    }

    /// Message types of the requests sent so far.
    pub fn sent_types(&self) -> Vec<u16> {
        self.sent()
            .iter()
            .map(|m| NlMsgHdr::from_bytes(m).expect("request header").nlmsg_type)
            .collect()
    }
}

impl Transport for ScriptedKernel {
    type Source = ScriptedSource;

    fn resolve_index(&mut self, name: &str) -> Result<u32> {
        self.indices
            .get(name)
            .copied()
            .ok_or_else(|| Error::InterfaceNotFound {
                name: name.to_string(),
                source: io::Error::from_raw_os_error(libc::ENODEV),
            })
    }

    fn open(&mut self, _config: &ResolverConfig) -> Result<ScriptedSource> {
        let chunks = self
            .replies
            .borrow_mut()
            .pop_front()
            .ok_or(Error::InvalidState("no scripted exchange left"))?;
        Ok(ScriptedSource {
            chunks: chunks.into(),
            current: Vec::new(),
            seq: SEQ,
            sent: Rc::clone(&self.sent),
        })
    }
}

pub struct ScriptedSource {
    chunks: VecDeque<Vec<u8>>,
    current: Vec<u8>,
    seq: u32,
    sent: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl ChunkSource for ScriptedSource {
    fn next_seq(&mut self) -> u32 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    fn port_id(&self) -> u32 {
        0
    }

    async fn send(&mut self, msg: &[u8]) -> Result<()> {
        self.sent.borrow_mut().push(msg.to_vec());
        Ok(())
    }

    async fn recv_chunk(&mut self) -> Result<&[u8]> {
        self.current = self
            .chunks
            .pop_front()
            .ok_or(Error::Timeout(Duration::from_millis(10)))?;
        Ok(&self.current)
    }
}
