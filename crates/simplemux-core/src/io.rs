//! The two I/O seams the event loop reads and writes through (§2 leaf
//! components 2-3, §4.7). Kept here rather than in `simplemux-daemon` so
//! that `simplemux-harness`'s fakes and the daemon's production
//! implementations satisfy the exact same contract without either depending
//! on the other.
//!
//! Both traits use `async fn` directly (no `dyn` support needed — the event
//! loop is generic over its endpoints, the same way the accumulator and
//! demultiplexer are generic-free but I/O-free).

use bytes::Bytes;
use std::future::Future;
use std::io;
use std::net::SocketAddr;

/// The virtual network interface (tun device) packets are read from and
/// written to (§2 "Packet source/sink").
pub trait PacketEndpoint: Send {
    /// Read one packet. Blocks (asynchronously) until one is available.
    fn recv(&mut self) -> impl Future<Output = io::Result<Bytes>> + Send;

    /// Write one packet.
    fn send(&mut self, packet: &[u8]) -> impl Future<Output = io::Result<()>> + Send;
}

/// The UDP socket bundles travel over (§2 "UDP tunnel transport").
pub trait UdpEndpoint: Send {
    /// Read one datagram along with the peer address it arrived from.
    fn recv_from(&mut self) -> impl Future<Output = io::Result<(Bytes, SocketAddr)>> + Send;

    /// Write one datagram to `dst`.
    fn send_to(&mut self, datagram: &[u8], dst: SocketAddr) -> impl Future<Output = io::Result<()>> + Send;
}
