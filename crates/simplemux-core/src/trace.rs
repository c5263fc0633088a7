//! Trace sink (§6.5, §9): the seam between what the core decides and how the
//! daemon records it. Kept as a trait so `simplemux-core` never depends on a
//! file handle, a clock format, or `tracing` directly — the daemon's
//! tab-separated log and the harness's in-memory recorder both implement it.

use crate::accumulator::FlushReason;
use crate::error::{AccumulatorError, DemuxError};

/// One event worth recording, named after the action or drop it describes
/// rather than after any particular log line format.
#[derive(Debug, Clone)]
pub enum TraceEvent {
    /// A bundle was flushed and handed to the UDP endpoint.
    Flushed {
        /// Which trigger caused the flush.
        reason: FlushReason,
        /// Number of packets in the bundle.
        packet_count: u32,
        /// Framed size of the bundle, in bytes.
        bundle_bytes: usize,
    },
    /// A received datagram whose source port did not match the configured
    /// multiplex port was forwarded verbatim to the virtual interface
    /// (§4.5 step 1, §6.1 "pass-through").
    Forwarded {
        /// Length of the forwarded datagram, in bytes.
        bytes: usize,
    },
    /// A payload was dropped before being accumulated or sent.
    AccumulatorDropped(AccumulatorError),
    /// Part or all of a received bundle was discarded, or one entry failed
    /// to decompress.
    DemuxDropped {
        /// The underlying framing or decompression failure.
        error: DemuxError,
        /// Length of the received datagram, in bytes.
        bytes: usize,
    },
    /// Header compression declined or failed to produce a bundle-ready
    /// payload (§4.4 step 2, §9 resolution of Open Question (a): an
    /// oversized segment is dropped, not forwarded).
    CompressDropped {
        /// Engine-reported reason, or a fixed message for a dropped segment.
        reason: String,
        /// Length of the IP packet that failed to compress, in bytes.
        bytes: usize,
    },
}

/// Receives [`TraceEvent`]s as they happen.
///
/// Implementations must not block the caller meaningfully — the event loop
/// calls this synchronously from the hot path (§4.7).
pub trait TraceSink: Send {
    /// Record one event.
    fn record(&mut self, now_micros: u64, event: TraceEvent);
}

/// A sink that discards every event, for callers that were not configured
/// with a log file (§6.4 `log_file`, §9 resolution of Open Question (c)).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn record(&mut self, _now_micros: u64, _event: TraceEvent) {}
}
