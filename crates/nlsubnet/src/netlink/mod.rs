//! Async rtnetlink client for address and route discovery.
//!
//! The pieces, leaf first: [`socket`] moves datagrams, [`ifindex`] maps a
//! name to an index, [`request`] builds dumps, [`dump`] decodes multi-part
//! replies into [`messages::DecodedRecord`]s through the bounds-checked
//! [`cursor::ByteCursor`].
//!
//! # Quick Start
//!
//! ```ignore
//! use nlsubnet::netlink::{NetlinkSocket, Protocol, Request, run_dump};
//! use nlsubnet::{Family, ResolverConfig};
//!
//! let config = ResolverConfig::default();
//! let mut socket = NetlinkSocket::open(Protocol::Route, &config)?;
//! run_dump(&mut socket, &Request::address_dump(Family::V4), config.limits, |record| {
//!     println!("{:?}", record);
//! })
//! .await?;
//! ```

pub mod attr;
mod builder;
pub mod cursor;
pub mod dump;
pub(crate) mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod ifindex;
pub mod message;
pub mod messages;
pub mod parse;
pub mod request;
pub mod socket;
pub mod types;

pub use attr::{NlAttr, RawAttr};
pub use builder::MessageBuilder;
pub use cursor::ByteCursor;
pub use dump::{ChunkSource, DumpDecoder, DumpLimits, DumpState, DumpSummary, run_dump};
pub use error::{Error, Result};
pub use ifindex::resolve_index;
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use messages::{AddressRecord, DecodedRecord, RouteAttr, RouteRecord};
pub use parse::FromNetlink;
pub use request::Request;
pub use socket::{NetlinkSocket, Protocol};
pub use types::Family;
