//! Resolver configuration.

use std::time::Duration;

use crate::netlink::dump::DumpLimits;

/// Knobs for the netlink exchanges of one resolution.
///
/// ```ignore
/// let config = ResolverConfig::default()
///     .with_recv_timeout(Duration::from_secs(1))
///     .with_recv_buffer_size(64 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// How long a single receive may wait for the kernel.
    pub recv_timeout: Duration,
    /// SO_RCVBUF and the capacity of the receive buffer.
    pub recv_buffer_size: usize,
    /// SO_SNDBUF.
    pub send_buffer_size: usize,
    /// Bounds on each dump.
    pub limits: DumpLimits,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            recv_timeout: Duration::from_secs(5),
            recv_buffer_size: 32 * 1024,
            send_buffer_size: 32 * 1024,
            limits: DumpLimits::default(),
        }
    }
}

impl ResolverConfig {
    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    pub fn with_recv_buffer_size(mut self, bytes: usize) -> Self {
        self.recv_buffer_size = bytes;
        self
    }

    pub fn with_send_buffer_size(mut self, bytes: usize) -> Self {
        self.send_buffer_size = bytes;
        self
    }

    pub fn with_limits(mut self, limits: DumpLimits) -> Self {
        self.limits = limits;
        self
    }
}
