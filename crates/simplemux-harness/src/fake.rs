//! Fakes for the traits `simplemux_daemon::EventLoop` is generic over.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use simplemux_core::{Clock, PacketEndpoint, TraceEvent, TraceSink, UdpEndpoint};
use tokio::sync::mpsc;

/// A clock whose value the test controls directly, rather than wall time.
#[derive(Debug)]
pub struct FakeClock {
    micros: AtomicU64,
}

impl FakeClock {
    /// Create a clock starting at `start` microseconds.
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self { micros: AtomicU64::new(start) }
    }

    /// Move the clock forward by `delta` microseconds.
    pub fn advance(&self, delta: u64) {
        self.micros.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_micros(&self) -> u64 {
        self.micros.load(Ordering::SeqCst)
    }
}

const CHANNEL_CLOSED: &str = "fake endpoint's test-side handle was dropped";

/// The [`PacketEndpoint`] side of a fake tun device.
pub struct FakeTap {
    inbound: mpsc::UnboundedReceiver<Bytes>,
    outbound: mpsc::UnboundedSender<Bytes>,
}

/// The test-side handle for a [`FakeTap`]: push packets as if they arrived
/// from the kernel, and drain packets the event loop wrote back out.
pub struct FakeTapHandle {
    /// Push a packet "arriving from the OS" on the tun device.
    pub inbound: mpsc::UnboundedSender<Bytes>,
    /// Packets the event loop wrote "to the OS" on the tun device.
    pub outbound: mpsc::UnboundedReceiver<Bytes>,
}

/// Construct a connected fake tun device and its test-side handle.
#[must_use]
pub fn fake_tap() -> (FakeTap, FakeTapHandle) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    (FakeTap { inbound: in_rx, outbound: out_tx }, FakeTapHandle { inbound: in_tx, outbound: out_rx })
}

impl PacketEndpoint for FakeTap {
    async fn recv(&mut self) -> io::Result<Bytes> {
        self.inbound.recv().await.ok_or_else(|| io::Error::other(CHANNEL_CLOSED))
    }

    async fn send(&mut self, packet: &[u8]) -> io::Result<()> {
        self.outbound.send(Bytes::copy_from_slice(packet)).map_err(|_| io::Error::other(CHANNEL_CLOSED))
    }
}

/// The [`UdpEndpoint`] side of a fake UDP socket.
pub struct FakeUdp {
    inbound: mpsc::UnboundedReceiver<(Bytes, SocketAddr)>,
    outbound: mpsc::UnboundedSender<(Bytes, SocketAddr)>,
}

/// The test-side handle for a [`FakeUdp`].
pub struct FakeUdpHandle {
    /// Push a datagram "arriving from the network", with its claimed peer
    /// address.
    pub inbound: mpsc::UnboundedSender<(Bytes, SocketAddr)>,
    /// Datagrams the event loop sent, with their destination address.
    pub outbound: mpsc::UnboundedReceiver<(Bytes, SocketAddr)>,
}

/// Construct a connected fake UDP socket and its test-side handle.
#[must_use]
pub fn fake_udp() -> (FakeUdp, FakeUdpHandle) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    (FakeUdp { inbound: in_rx, outbound: out_tx }, FakeUdpHandle { inbound: in_tx, outbound: out_rx })
}

impl UdpEndpoint for FakeUdp {
    async fn recv_from(&mut self) -> io::Result<(Bytes, SocketAddr)> {
        self.inbound.recv().await.ok_or_else(|| io::Error::other(CHANNEL_CLOSED))
    }

    async fn send_to(&mut self, datagram: &[u8], dst: SocketAddr) -> io::Result<()> {
        self.outbound
            .send((Bytes::copy_from_slice(datagram), dst))
            .map_err(|_| io::Error::other(CHANNEL_CLOSED))
    }
}

/// An in-memory [`TraceSink`] that records every event for later assertion.
#[derive(Debug, Clone, Default)]
pub struct RecordingTraceSink {
    events: Arc<Mutex<Vec<(u64, TraceEvent)>>>,
}

impl RecordingTraceSink {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every event recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned, which only happens if a
    /// prior recorder call panicked.
    #[must_use]
    pub fn events(&self) -> Vec<(u64, TraceEvent)> {
        self.events.lock().expect("trace recorder lock poisoned").clone()
    }
}

impl TraceSink for RecordingTraceSink {
    fn record(&mut self, now_micros: u64, event: TraceEvent) {
        self.events.lock().expect("trace recorder lock poisoned").push((now_micros, event));
    }
}
