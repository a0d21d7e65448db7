//! Per-interface result record and the resolver that fills it.
//!
//! # Example
//!
//! ```ignore
//! use nlsubnet::{Family, Resolver, ResolverConfig};
//!
//! let mut resolver = Resolver::new(ResolverConfig::default());
//! let device = resolver.resolve("eth0", Family::V4).await?;
//! if let Some(cidr) = device.ipv4() {
//!     println!("{}", cidr);
//! }
//! ```

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::{debug, trace, warn};

use crate::config::ResolverConfig;
use crate::netlink::dump::{ChunkSource, run_dump};
use crate::netlink::error::{Error, Result};
use crate::netlink::ifindex;
use crate::netlink::messages::{AddressRecord, DecodedRecord, RouteAttr, RouteRecord};
use crate::netlink::request::Request;
use crate::netlink::socket::{NetlinkSocket, Protocol};
use crate::netlink::types::Family;
use crate::netlink::types::addr::Scope;
use crate::util::subnet::{Ipv4Cidr, Ipv6Cidr};

/// Addresses and gateways discovered for one interface.
///
/// Fields are only ever set from records that belong to `index`, and the
/// first matching record wins for each field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct NetworkDevice {
    name: String,
    index: u32,
    ipv4: Option<Ipv4Cidr>,
    ipv4_gateway: Option<Ipv4Addr>,
    ipv6_global: Option<Ipv6Cidr>,
    ipv6_link_local: Option<Ipv6Addr>,
    ipv6_gateway: Option<Ipv6Addr>,
}

impl NetworkDevice {
    /// Create an empty record for an interface.
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index,
            ipv4: None,
            ipv4_gateway: None,
            ipv6_global: None,
            ipv6_link_local: None,
            ipv6_gateway: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Global IPv4 address with its prefix length.
    pub fn ipv4(&self) -> Option<&Ipv4Cidr> {
        self.ipv4.as_ref()
    }

    pub fn ipv4_gateway(&self) -> Option<Ipv4Addr> {
        self.ipv4_gateway
    }

    /// Global IPv6 address with its prefix length.
    pub fn ipv6_global(&self) -> Option<&Ipv6Cidr> {
        self.ipv6_global.as_ref()
    }

    pub fn ipv6_link_local(&self) -> Option<Ipv6Addr> {
        self.ipv6_link_local
    }

    pub fn ipv6_gateway(&self) -> Option<Ipv6Addr> {
        self.ipv6_gateway
    }

    /// Whether the address a subnet derives from is known for `family`.
    pub fn has_address(&self, family: Family) -> bool {
        match family {
            Family::V4 => self.ipv4.is_some(),
            Family::V6 => self.ipv6_global.is_some(),
        }
    }

    pub fn has_gateway(&self, family: Family) -> bool {
        self.gateway(family).is_some()
    }

    /// Default gateway for `family`, if one was found.
    pub fn gateway(&self, family: Family) -> Option<IpAddr> {
        match family {
            Family::V4 => self.ipv4_gateway.map(IpAddr::V4),
            Family::V6 => self.ipv6_gateway.map(IpAddr::V6),
        }
    }

    /// Default gateway for `family`, or the unspecified address.
    pub fn gateway_or_unspecified(&self, family: Family) -> IpAddr {
        self.gateway(family).unwrap_or(match family {
            Family::V4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            Family::V6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        })
    }

    /// Text report for `family`, one value per line.
    ///
    /// IPv4: address/cidr, gateway, routing prefix/cidr. IPv6: global
    /// address/cidr, link-local address, gateway, subnet/64. Unknown
    /// gateways and link-local addresses render as the unspecified address.
    /// Empty when no address of the family is known.
    pub fn report(&self, family: Family) -> Vec<String> {
        let gateway = self.gateway_or_unspecified(family).to_string();
        match family {
            Family::V4 => {
                let Some(cidr) = self.ipv4 else {
                    return Vec::new();
                };
                let mut lines = vec![cidr.to_string(), gateway];
                match cidr.subnet() {
                    Some(subnet) => lines.push(subnet.to_string()),
                    None => warn!(address = %cidr, "no prefix length reported"),
                }
                lines
            }
            Family::V6 => {
                let Some(cidr) = self.ipv6_global else {
                    return Vec::new();
                };
                let link_local = self.ipv6_link_local.unwrap_or(Ipv6Addr::UNSPECIFIED);
                vec![
                    cidr.to_string(),
                    link_local.to_string(),
                    gateway,
                    cidr.subnet().to_string(),
                ]
            }
        }
    }

    /// Fold one decoded record into the device.
    ///
    /// Returns true if a field was set.
    pub fn absorb(&mut self, record: &DecodedRecord) -> bool {
        match record {
            DecodedRecord::Address(addr) => self.absorb_address(addr),
            DecodedRecord::Route(route) => self.absorb_route(route),
        }
    }

    fn absorb_address(&mut self, addr: &AddressRecord) -> bool {
        if addr.ifindex() != self.index {
            return false;
        }

        match (addr.primary_address(), addr.scope()) {
            (Some(IpAddr::V4(v4)), Scope::Universe) if self.ipv4.is_none() => {
                self.ipv4 = Ipv4Cidr::new(*v4, addr.prefix_len()).ok();
                self.ipv4.is_some()
            }
            (Some(IpAddr::V6(v6)), Scope::Universe) if self.ipv6_global.is_none() => {
                self.ipv6_global = Ipv6Cidr::new(*v6, addr.prefix_len()).ok();
                self.ipv6_global.is_some()
            }
            (Some(IpAddr::V6(v6)), Scope::Link) if self.ipv6_link_local.is_none() => {
                self.ipv6_link_local = Some(*v6);
                true
            }
            _ => {
                trace!(
                    index = self.index,
                    scope = addr.scope().name(),
                    "address record not used"
                );
                false
            }
        }
    }

    fn absorb_route(&mut self, route: &RouteRecord) -> bool {
        if !route.is_default_candidate() {
            return false;
        }

        // Attribute order is not fixed: a gateway is only ours once an
        // output interface matching our index confirms it.
        let mut tentative = None;
        let mut confirmed = false;
        for attr in route.attrs() {
            match *attr {
                RouteAttr::Gateway(gw) => tentative = Some(gw),
                RouteAttr::OutputInterface(oif) if oif == self.index => confirmed = true,
                RouteAttr::OutputInterface(_) => return false,
                _ => {}
            }
        }

        let Some(gateway) = tentative.filter(|_| confirmed) else {
            return false;
        };
        match gateway {
            IpAddr::V4(v4) if self.ipv4_gateway.is_none() => {
                self.ipv4_gateway = Some(v4);
                true
            }
            IpAddr::V6(v6) if self.ipv6_gateway.is_none() => {
                self.ipv6_gateway = Some(v6);
                true
            }
            _ => false,
        }
    }
}

/// How a [`Resolver`] reaches the kernel.
pub trait Transport {
    /// Chunk source for one dump exchange.
    type Source: ChunkSource;

    /// Map an interface name to its index.
    fn resolve_index(&mut self, name: &str) -> Result<u32>;

    /// Open a fresh source for one exchange.
    fn open(&mut self, config: &ResolverConfig) -> Result<Self::Source>;
}

/// The real kernel: `SIOCGIFINDEX` plus one route netlink socket per dump.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelTransport;

impl Transport for KernelTransport {
    type Source = NetlinkSocket;

    fn resolve_index(&mut self, name: &str) -> Result<u32> {
        ifindex::resolve_index(name)
    }

    fn open(&mut self, config: &ResolverConfig) -> Result<NetlinkSocket> {
        NetlinkSocket::open(Protocol::Route, config)
    }
}

/// Resolves an interface name into a [`NetworkDevice`].
#[derive(Debug)]
pub struct Resolver<T = KernelTransport> {
    config: ResolverConfig,
    transport: T,
}

impl Resolver<KernelTransport> {
    /// Resolver talking to the running kernel.
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_transport(config, KernelTransport)
    }
}

impl<T: Transport> Resolver<T> {
    /// Resolver over a custom transport.
    pub fn with_transport(config: ResolverConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Discover the addresses and default gateway of `name` for `family`.
    ///
    /// Fails with [`Error::AddressNotFound`] when the interface has no
    /// usable address of the family; the route dump is skipped then. A
    /// missing gateway is not an error.
    pub async fn resolve(&mut self, name: &str, family: Family) -> Result<NetworkDevice> {
        let index = self.transport.resolve_index(name)?;
        let mut device = NetworkDevice::new(name, index);

        self.dump(&Request::address_dump(family), &mut device).await?;
        if !device.has_address(family) {
            return Err(Error::AddressNotFound {
                name: name.to_string(),
                family,
            });
        }

        self.dump(&Request::route_dump(family), &mut device).await?;
        if !device.has_gateway(family) {
            warn!(name, %family, "no default gateway found");
        }

        Ok(device)
    }

    async fn dump(&mut self, request: &Request, device: &mut NetworkDevice) -> Result<()> {
        let mut source = self.transport.open(&self.config)?;
        let mut accepted = 0usize;
        let summary = run_dump(&mut source, request, self.config.limits, |record| {
            if device.absorb(&record) {
                accepted += 1;
            }
        })
        .await?;
        debug!(
            kind = request.kind(),
            index = device.index(),
            records = summary.records,
            accepted,
            "records absorbed"
        );
        Ok(())
    }
}
