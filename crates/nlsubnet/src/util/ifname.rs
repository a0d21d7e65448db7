//! Interface name validation.

use crate::netlink::error::{Error, Result};

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = libc::IFNAMSIZ;

/// Validate an interface name before handing it to the kernel.
pub fn validate(name: &str) -> Result<()> {
    let invalid = |reason| {
        Err(Error::InvalidInterfaceName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return invalid("empty name");
    }

    if name.len() >= IFNAMSIZ {
        return Err(Error::InterfaceNameTooLong {
            name: name.to_string(),
            max: IFNAMSIZ - 1,
        });
    }

    if name.contains('/') || name.contains('\0') {
        return invalid("name contains invalid characters");
    }

    if name.chars().any(|c| c.is_whitespace()) {
        return invalid("name contains whitespace");
    }

    Ok(())
}
