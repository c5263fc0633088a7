//! Production implementations of `simplemux_core::{PacketEndpoint, UdpEndpoint}`.

use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use simplemux_core::{PacketEndpoint, UdpEndpoint};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UdpSocket;
use tun::AsyncDevice;

use crate::error::DaemonError;

/// Maximum single read, large enough for any packet under a realistic MTU
/// with headroom for compression expansion on malformed input.
const READ_BUF_SIZE: usize = 65_536;

/// A tun device driven through tokio, implementing [`PacketEndpoint`].
pub struct TunEndpoint {
    device: AsyncDevice,
}

impl TunEndpoint {
    /// Create and bring up a tun interface named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::Interface`] if the device cannot be created.
    pub fn create(name: &str, mtu: usize) -> Result<Self, DaemonError> {
        let mut config = tun::Configuration::default();
        #[allow(clippy::cast_possible_truncation)]
        config.tun_name(name).mtu(mtu as u16).up();

        let device = tun::create_as_async(&config)
            .map_err(|source| DaemonError::Interface { name: name.to_owned(), source: std::io::Error::other(source) })?;

        Ok(Self { device })
    }
}

impl PacketEndpoint for TunEndpoint {
    async fn recv(&mut self) -> std::io::Result<Bytes> {
        let mut buf = BytesMut::zeroed(READ_BUF_SIZE);
        let n = self.device.read(&mut buf).await?;
        buf.truncate(n);
        Ok(buf.freeze())
    }

    async fn send(&mut self, packet: &[u8]) -> std::io::Result<()> {
        self.device.write_all(packet).await
    }
}

/// A UDP socket driven through tokio, implementing [`UdpEndpoint`].
pub struct TokioUdpEndpoint {
    socket: UdpSocket,
}

impl TokioUdpEndpoint {
    /// Bind a UDP socket on `local_addr`, optionally restricted to
    /// `bind_iface` via `SO_BINDTODEVICE` (source's `-a`, network interface
    /// binding).
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::Socket`] if the socket cannot be bound or
    /// configured.
    pub fn bind(local_addr: SocketAddr, bind_iface: Option<&str>) -> Result<Self, DaemonError> {
        let domain = if local_addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|source| DaemonError::Socket { address: local_addr, source })?;

        socket.set_nonblocking(true).map_err(|source| DaemonError::Socket { address: local_addr, source })?;
        socket.set_reuse_address(true).map_err(|source| DaemonError::Socket { address: local_addr, source })?;

        #[cfg(target_os = "linux")]
        if let Some(iface) = bind_iface {
            socket
                .bind_device(Some(iface.as_bytes()))
                .map_err(|source| DaemonError::Socket { address: local_addr, source })?;
        }
        #[cfg(not(target_os = "linux"))]
        let _ = bind_iface;

        socket.bind(&local_addr.into()).map_err(|source| DaemonError::Socket { address: local_addr, source })?;

        let socket = UdpSocket::from_std(socket.into())
            .map_err(|source| DaemonError::Socket { address: local_addr, source })?;

        Ok(Self { socket })
    }
}

impl UdpEndpoint for TokioUdpEndpoint {
    async fn recv_from(&mut self) -> std::io::Result<(Bytes, SocketAddr)> {
        let mut buf = BytesMut::zeroed(READ_BUF_SIZE);
        let (n, peer) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(n);
        Ok((buf.freeze(), peer))
    }

    async fn send_to(&mut self, datagram: &[u8], dst: SocketAddr) -> std::io::Result<()> {
        self.socket.send_to(datagram, dst).await.map(|_| ())
    }
}
