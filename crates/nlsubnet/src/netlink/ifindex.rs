//! Interface name to index resolution.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use tracing::debug;

use super::error::{Error, Result};
use crate::util::ifname;

/// Resolve an interface name to its kernel index with `SIOCGIFINDEX`.
///
/// The name is validated first. Any ioctl failure, including an unknown
/// interface, is reported as [`Error::InterfaceNotFound`].
pub fn resolve_index(name: &str) -> Result<u32> {
    ifname::validate(name)?;

    let sock = control_socket()?;

    // SAFETY: ifreq is plain old data; all-zero is a valid value.
    let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
    // validate() guarantees the name plus terminator fits ifr_name.
    for (dst, src) in ifr.ifr_name.iter_mut().zip(name.as_bytes()) {
        *dst = *src as libc::c_char;
    }

    // SAFETY: the fd is a live socket and ifr is a properly initialized
    // ifreq the kernel writes ifr_ifindex into.
    let ret = unsafe { libc::ioctl(sock.as_raw_fd(), libc::SIOCGIFINDEX as _, &mut ifr) };
    if ret < 0 {
        return Err(Error::InterfaceNotFound {
            name: name.to_string(),
            source: io::Error::last_os_error(),
        });
    }

    // SAFETY: a successful SIOCGIFINDEX fills the ifindex member of the union.
    let index = unsafe { ifr.ifr_ifru.ifru_ifindex };
    debug!(name, index, "resolved interface index");
    Ok(index as u32)
}

/// Open the AF_INET datagram socket interface ioctls are issued on.
fn control_socket() -> Result<OwnedFd> {
    // SAFETY: plain socket(2) call; the result is checked below.
    let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, 0) };
    if fd < 0 {
        return Err(Error::last_os("cannot open control socket"));
    }
    // SAFETY: fd was just returned by socket(2) and is owned by nothing else.
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}
