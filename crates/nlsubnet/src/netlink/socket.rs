//! Low-level async netlink socket operations.

use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;
use tracing::debug;

use super::dump::ChunkSource;
use super::error::{Error, Result};
use crate::config::ResolverConfig;

/// Netlink protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Routing/device hook (addresses, routes).
    Route,
    /// Generic netlink.
    Generic,
}

impl Protocol {
    fn as_isize(self) -> isize {
        match self {
            Protocol::Route => protocols::NETLINK_ROUTE,
            Protocol::Generic => protocols::NETLINK_GENERIC,
        }
    }
}

/// Async netlink socket.
///
/// The descriptor is closed when the socket is dropped.
pub struct NetlinkSocket {
    /// The underlying async file descriptor.
    fd: AsyncFd<Socket>,
    /// Sequence number counter.
    seq: u32,
    /// Local port ID (assigned by kernel).
    pid: u32,
    /// Protocol this socket uses.
    protocol: Protocol,
    /// Reused across receives.
    buf: BytesMut,
    recv_capacity: usize,
    recv_timeout: Duration,
}

impl NetlinkSocket {
    /// Open, size and bind a socket for `protocol`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(protocol: Protocol, config: &ResolverConfig) -> Result<Self> {
        let mut socket = Socket::new(protocol.as_isize())
            .map_err(|e| Error::os("cannot open netlink socket", e))?;
        socket
            .set_non_blocking(true)
            .map_err(|e| Error::os("cannot make netlink socket non-blocking", e))?;

        // Port 0: the kernel assigns our port ID on bind.
        let mut addr = SocketAddr::new(0, 0);
        socket
            .bind(&addr)
            .map_err(|e| Error::os("cannot bind socket", e))?;
        socket
            .get_address(&mut addr)
            .map_err(|e| Error::os("cannot read socket address", e))?;
        let pid = addr.port_number();

        let fd = AsyncFd::new(socket).map_err(|e| Error::os("cannot register socket", e))?;

        let mut this = Self {
            fd,
            seq: 1,
            pid,
            protocol,
            buf: BytesMut::with_capacity(config.recv_buffer_size),
            recv_capacity: config.recv_buffer_size,
            recv_timeout: config.recv_timeout,
        };
        this.set_send_buffer_size(config.send_buffer_size)?;
        this.set_recv_buffer_size(config.recv_buffer_size)?;

        debug!(?protocol, pid, "netlink socket open");
        Ok(this)
    }

    /// Set SO_SNDBUF.
    pub fn set_send_buffer_size(&mut self, bytes: usize) -> Result<()> {
        self.set_buffer_size(libc::SO_SNDBUF, bytes)
            .map_err(|e| Error::os("cannot set send buffer size", e))
    }

    /// Set SO_RCVBUF.
    pub fn set_recv_buffer_size(&mut self, bytes: usize) -> Result<()> {
        self.set_buffer_size(libc::SO_RCVBUF, bytes)
            .map_err(|e| Error::os("cannot set receive buffer size", e))
    }

    fn set_buffer_size(&self, option: libc::c_int, bytes: usize) -> std::io::Result<()> {
        let value = libc::c_int::try_from(bytes).unwrap_or(libc::c_int::MAX);
        // SAFETY: the fd is a live socket owned by self; value outlives the
        // call and its size is passed alongside.
        let ret = unsafe {
            libc::setsockopt(
                self.as_raw_fd(),
                libc::SOL_SOCKET,
                option,
                &value as *const libc::c_int as *const libc::c_void,
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    /// Get the next sequence number.
    pub fn next_seq(&mut self) -> u32 {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        seq
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Get the protocol.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Send a message, returning the number of bytes sent.
    pub async fn send(&self, msg: &[u8]) -> Result<usize> {
        loop {
            let mut guard = self
                .fd
                .ready(Interest::WRITABLE)
                .await
                .map_err(|e| Error::os("cannot send request", e))?;

            match guard.try_io(|inner| inner.get_ref().send(msg, 0)) {
                Ok(result) => return result.map_err(|e| Error::os("cannot send request", e)),
                Err(_would_block) => continue,
            }
        }
    }

    /// Receive one datagram into the reusable buffer.
    ///
    /// Fails with [`Error::Timeout`] if nothing arrives within the configured
    /// receive timeout.
    pub async fn recv(&mut self) -> Result<&[u8]> {
        let timeout = self.recv_timeout;
        self.buf.clear();
        self.buf.reserve(self.recv_capacity);

        let fd = &self.fd;
        let buf = &mut self.buf;
        let recv = async {
            loop {
                let mut guard = fd
                    .ready(Interest::READABLE)
                    .await
                    .map_err(|e| Error::os("cannot receive response", e))?;

                match guard.try_io(|inner| inner.get_ref().recv(&mut *buf, 0)) {
                    Ok(result) => {
                        return result.map_err(|e| Error::os("cannot receive response", e));
                    }
                    Err(_would_block) => continue,
                }
            }
        };

        let n = tokio::time::timeout(timeout, recv)
            .await
            .map_err(|_| Error::Timeout(timeout))??;
        Ok(&self.buf[..n])
    }
}

impl ChunkSource for NetlinkSocket {
    fn next_seq(&mut self) -> u32 {
        NetlinkSocket::next_seq(self)
    }

    fn port_id(&self) -> u32 {
        self.pid
    }

    async fn send(&mut self, msg: &[u8]) -> Result<()> {
        let sent = NetlinkSocket::send(self, msg).await?;
        if sent != msg.len() {
            return Err(Error::InvalidMessage(format!(
                "short send: {} of {} bytes",
                sent,
                msg.len()
            )));
        }
        Ok(())
    }

    async fn recv_chunk(&mut self) -> Result<&[u8]> {
        self.recv().await
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}

impl std::fmt::Debug for NetlinkSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetlinkSocket")
            .field("fd", &self.as_raw_fd())
            .field("pid", &self.pid)
            .field("protocol", &self.protocol)
            .finish()
    }
}
