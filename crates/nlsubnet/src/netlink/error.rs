//! Error types for netlink operations.

use std::io;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving an interface over netlink.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A system call at the OS boundary failed.
    #[error("{action}: {source}")]
    Os {
        /// What was being attempted (e.g. "cannot bind socket").
        action: &'static str,
        /// The underlying OS error, carrying the errno.
        #[source]
        source: io::Error,
    },

    /// Kernel returned an error code inside a netlink response.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// The kernel did not answer within the configured receive timeout.
    #[error("timed out after {0:?} waiting for the kernel")]
    Timeout(std::time::Duration),

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// A dump exceeded the configured sanity bounds.
    #[error("dump exceeded {limit} {what}")]
    DumpTooLarge {
        /// Which bound was hit ("chunks" or "records").
        what: &'static str,
        /// The configured bound.
        limit: usize,
    },

    /// The dump decoder was driven out of order.
    #[error("dump decoder cannot accept data in state {0}")]
    InvalidState(&'static str),

    /// Interface name does not fit the kernel's interface request buffer.
    #[error("interface name '{name}' is too long (max {max} bytes)")]
    InterfaceNameTooLong {
        /// The rejected name.
        name: String,
        /// Maximum name length, excluding the terminator.
        max: usize,
    },

    /// Interface name contains characters the kernel never accepts.
    #[error("invalid interface name '{name}': {reason}")]
    InvalidInterfaceName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Interface not found.
    #[error("failure retrieving network device index for '{name}'")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
        /// The ioctl failure.
        #[source]
        source: io::Error,
    },

    /// The interface exists but has no address of the requested family.
    #[error("network device exists but cannot find IP address ({family} on {name})")]
    AddressNotFound {
        /// The interface name.
        name: String,
        /// The requested family.
        family: crate::Family,
    },
}

impl Error {
    /// Wrap an OS error with the action that failed.
    pub fn os(action: &'static str, source: io::Error) -> Self {
        Self::Os { action, source }
    }

    /// Wrap `errno` with the action that failed.
    pub fn last_os(action: &'static str) -> Self {
        Self::os(action, io::Error::last_os_error())
    }

    /// Create a kernel error from a (negative) netlink errno value.
    ///
    /// A code that is not a negated errno yields [`Error::InvalidMessage`].
    pub fn from_errno(code: i32) -> Self {
        match code.checked_neg() {
            Some(errno) if errno > 0 => Self::Kernel {
                errno,
                message: io::Error::from_raw_os_error(errno).to_string(),
            },
            _ => Self::InvalidMessage(format!("invalid kernel error code {}", code)),
        }
    }

    /// Check if this is a semantic "not found" condition rather than a failure.
    ///
    /// Only [`Error::AddressNotFound`] qualifies: the interface is legitimately
    /// unconfigured, nothing went wrong talking to the kernel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AddressNotFound { .. })
    }

    /// Check if this is a protocol decode error.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. }
                | Self::InvalidMessage(_)
                | Self::InvalidAttribute(_)
                | Self::DumpTooLarge { .. }
                | Self::InvalidState(_)
        )
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(1 | 13)) // EPERM=1, EACCES=13
    }

    /// Get the errno value if this error came from the OS or the kernel.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } => Some(*errno),
            Self::Os { source, .. } | Self::InterfaceNotFound { source, .. } => {
                source.raw_os_error()
            }
            _ => None,
        }
    }
}
