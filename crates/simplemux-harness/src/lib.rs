//! Deterministic test harness for Simplemux.
//!
//! Channel-backed fakes for [`simplemux_core::Clock`],
//! [`simplemux_core::PacketEndpoint`], and [`simplemux_core::UdpEndpoint`],
//! plus an in-memory [`simplemux_core::TraceSink`] — enough to drive the
//! real [`simplemux_daemon::EventLoop`] from a test without a tun device or
//! a socket.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fake;

pub use fake::{FakeClock, FakeTap, FakeTapHandle, FakeUdp, FakeUdpHandle, RecordingTraceSink, fake_tap, fake_udp};
