//! Shared utilities for nlsubnet.

pub mod ifname;
pub mod subnet;

pub use subnet::{AddrError, ipv4_mask, ipv4_routing_prefix, ipv6_subnet};
