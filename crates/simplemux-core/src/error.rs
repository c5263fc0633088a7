//! Error types for the Simplemux core.
//!
//! These are the per-packet, drop-and-continue failures of §7: nothing here
//! ever tears down the event loop. The daemon converts each variant into a
//! log record (§6.5) and moves on.

use thiserror::Error;

/// Reasons the accumulator dropped or declined a payload, without producing
/// a flush.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorError {
    /// A single payload, by itself, does not fit under the MTU even with an
    /// empty accumulator (§4.2 step 4). The payload is discarded.
    #[error("payload of {payload_len} bytes (+ {sep_len}-byte separator) exceeds MTU {mtu}")]
    PayloadExceedsMtu {
        /// Length of the payload that was rejected.
        payload_len: usize,
        /// Separator length that would have been prepended.
        sep_len: usize,
        /// The configured MTU.
        mtu: usize,
    },
}

/// Reasons the demultiplexer discarded part or all of a received bundle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxError {
    /// The bundle's framing was malformed; parsing stopped at this point and
    /// the remainder of the datagram was discarded (§4.5, §7).
    #[error("malformed bundle: {source}")]
    Framing {
        /// The underlying framing failure.
        #[source]
        source: simplemux_proto::ProtoError,
    },

    /// Header decompression failed for one payload inside the bundle. Unlike
    /// [`Self::Framing`], this does *not* abort the rest of the bundle —
    /// parsing continues with the next entry (§4.5).
    #[error("decompression failed: {reason}")]
    DecompressFailed {
        /// Engine-reported reason, if any.
        reason: String,
    },
}

impl From<simplemux_proto::ProtoError> for DemuxError {
    fn from(source: simplemux_proto::ProtoError) -> Self {
        Self::Framing { source }
    }
}
