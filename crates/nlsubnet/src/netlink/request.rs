//! Dump requests.

use super::builder::MessageBuilder;
use super::message::{NLM_F_DUMP, NLM_F_REQUEST, NlMsgType};
use super::messages::{AddressRecord, RouteRecord};
use super::parse::FromNetlink;
use super::types::Family;

/// An rtnetlink dump request.
///
/// The body is fixed at construction. Sequence number and port id are
/// stamped by [`Request::encode`], so one request can be sent on any socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    msg_type: u16,
    flags: u16,
    body: Vec<u8>,
}

impl Request {
    /// Dump request for all records of type `T` in `family`.
    pub fn dump<T: FromNetlink>(family: Family) -> Self {
        let mut body = Vec::new();
        T::write_dump_header(&mut body, family);
        Self {
            msg_type: T::DUMP_TYPE,
            flags: NLM_F_REQUEST | NLM_F_DUMP,
            body,
        }
    }

    /// `RTM_GETADDR` dump for one family.
    pub fn address_dump(family: Family) -> Self {
        Self::dump::<AddressRecord>(family)
    }

    /// `RTM_GETROUTE` dump of the main table for one family.
    pub fn route_dump(family: Family) -> Self {
        Self::dump::<RouteRecord>(family)
    }

    /// Message type.
    pub fn msg_type(&self) -> u16 {
        self.msg_type
    }

    /// Header flags.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Family-specific body following the header.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self.msg_type {
            NlMsgType::RTM_GETADDR => "address dump",
            NlMsgType::RTM_GETROUTE => "route dump",
            _ => "request",
        }
    }

    /// Serialize with the given sequence number and port id.
    pub fn encode(&self, seq: u32, pid: u32) -> Vec<u8> {
        let mut builder = MessageBuilder::new(self.msg_type, self.flags);
        builder.append_bytes(&self.body);
        builder.set_seq(seq);
        builder.set_pid(pid);
        builder.finish()
    }
}
