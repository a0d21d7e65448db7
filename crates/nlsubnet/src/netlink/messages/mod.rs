//! Strongly-typed rtnetlink records.

mod address;
mod route;

pub use address::AddressRecord;
pub use route::{RouteAttr, RouteRecord};

use super::error::Result;
use super::parse::FromNetlink;

/// A record decoded from one dump message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedRecord {
    /// `RTM_NEWADDR`.
    Address(AddressRecord),
    /// `RTM_NEWROUTE`.
    Route(RouteRecord),
}

impl DecodedRecord {
    /// Decode a message payload by its netlink message type.
    ///
    /// Returns `None` for types that carry no record the resolver uses.
    pub fn decode(msg_type: u16, payload: &[u8]) -> Result<Option<Self>> {
        if msg_type == AddressRecord::MSG_TYPE {
            AddressRecord::from_bytes(payload).map(|r| Some(DecodedRecord::Address(r)))
        } else if msg_type == RouteRecord::MSG_TYPE {
            RouteRecord::from_bytes(payload).map(|r| Some(DecodedRecord::Route(r)))
        } else {
            Ok(None)
        }
    }

    /// Get the address record, if this is one.
    pub fn as_address(&self) -> Option<&AddressRecord> {
        match self {
            DecodedRecord::Address(a) => Some(a),
            _ => None,
        }
    }

    /// Get the route record, if this is one.
    pub fn as_route(&self) -> Option<&RouteRecord> {
        match self {
            DecodedRecord::Route(r) => Some(r),
            _ => None,
        }
    }
}
