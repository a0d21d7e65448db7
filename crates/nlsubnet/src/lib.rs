//! Interface address, gateway and subnet discovery over rtnetlink.
//!
//! For one named interface this crate asks the kernel for its IPv4/IPv6
//! addresses and default gateways, then derives the routing prefix (IPv4)
//! or /64 subnet (IPv6).
//!
//! # Features
//!
//! - `output` - `serde::Serialize` for [`NetworkDevice`] and the CIDR types
//! - `integration` - tests that need a live kernel
//!
//! # Example
//!
//! ```ignore
//! use nlsubnet::{Family, Resolver, ResolverConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> nlsubnet::Result<()> {
//!     let device = Resolver::new(ResolverConfig::default())
//!         .resolve("eth0", Family::V4)
//!         .await?;
//!
//!     if let Some(cidr) = device.ipv4() {
//!         println!("{}", cidr);
//!         println!("{}", device.gateway_or_unspecified(Family::V4));
//!         if let Some(subnet) = cidr.subnet() {
//!             println!("{}", subnet);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod device;
pub mod netlink;
pub mod util;

// Re-export common types at crate root for convenience
pub use config::ResolverConfig;
pub use device::{KernelTransport, NetworkDevice, Resolver, Transport};
pub use netlink::{Error, Family, Protocol, Result};
pub use util::subnet::{Ipv4Cidr, Ipv4SubnetView, Ipv6Cidr, Ipv6SubnetView};
