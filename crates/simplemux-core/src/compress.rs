//! The minimal interface the core consumes from a header-compression engine
//! (§6: "compress(ip) -> rohc_bytes" / "decompress(rohc) -> ip (or empty on
//! feedback-only segments)"). The engine's internals are an external
//! collaborator (§1) — `simplemux-rohc` provides a concrete implementation
//! of this trait.

use bytes::Bytes;

/// Outcome of compressing one IP packet.
#[derive(Debug, Clone)]
pub enum CompressOutcome {
    /// Compression succeeded; these are the bytes to place in the bundle.
    Compressed(Bytes),

    /// The engine produced a segment larger than the MRRU (§4.4 step 2,
    /// GLOSSARY "MRRU"). Per the spec's resolution of Open Question (a), the
    /// core drops this packet rather than forwarding an oversized segment.
    Segment,

    /// The compressor failed outright. The caller drops this packet only;
    /// the accumulator and compression context are left undisturbed.
    Failed {
        /// Engine-reported reason, for the log record.
        reason: String,
    },
}

/// Outcome of decompressing one payload recovered from a bundle.
#[derive(Debug, Clone)]
pub enum DecompressOutcome {
    /// A full IP packet was recovered.
    Ip(Bytes),

    /// The payload was feedback-only or a non-final segment: nothing to
    /// write, but not an error (§4.5 step 2).
    Empty,

    /// Decompression failed. The decompressor's internal state is preserved
    /// and parsing continues with the next payload in the bundle (§4.5, §7).
    Failed {
        /// Engine-reported reason, for the log record.
        reason: String,
    },
}

/// Per-direction header-compression adapter (§4.6).
///
/// One instance owns exactly one compressor and one decompressor context,
/// long-lived across the process and never shared between the send and
/// receive directions (§3 "Compression context").
pub trait HeaderCompressor: Send {
    /// Compress one IP packet read from the virtual interface.
    fn compress(&mut self, ip_packet: &[u8]) -> CompressOutcome;

    /// Decompress one payload recovered from a bundle.
    fn decompress(&mut self, rohc_packet: &[u8]) -> DecompressOutcome;
}
