//! Demultiplexer (§4.5): turns one received bundle into zero or more IP
//! packets to write to the tap/tun device, grounded on the teacher's
//! `ServerDriver::process_event` action-returning style.

use bytes::Bytes;

use crate::compress::{DecompressOutcome, HeaderCompressor};

/// One outcome of walking a received bundle, for the caller to log and/or
/// act on.
#[derive(Debug, Clone)]
pub enum DemuxEvent {
    /// An IP packet was recovered and should be written to the tap device.
    WriteToTap(Bytes),
    /// An entry decoded to a feedback-only or non-final segment; nothing to
    /// write (§4.5 step 2).
    FeedbackOnly,
    /// Decompression failed for one entry; the rest of the bundle is still
    /// processed.
    DecompressFailed {
        /// Engine-reported reason.
        reason: String,
    },
    /// The bundle's framing was malformed from this point on; parsing
    /// stopped and the remainder of the datagram was discarded (§4.5).
    Truncated {
        /// The framing error that stopped parsing.
        source: simplemux_proto::ProtoError,
    },
}

/// Walk a received bundle, decompressing (if `compressor` is given) or
/// passing through (if not) each entry in turn.
///
/// A malformed separator or an overrunning declared length discards the
/// remainder of the bundle but never the datagrams already parsed from it;
/// a decompression failure on one entry never aborts the rest of the bundle
/// (§4.5, §7).
pub fn demux_bundle(
    bundle: Bytes,
    mut compressor: Option<&mut dyn HeaderCompressor>,
) -> Vec<DemuxEvent> {
    let mut events = Vec::new();

    let result = simplemux_proto::for_each_entry(bundle, |entry| match compressor.as_deref_mut() {
        Some(engine) => match engine.decompress(&entry.payload) {
            DecompressOutcome::Ip(ip) => events.push(DemuxEvent::WriteToTap(ip)),
            DecompressOutcome::Empty => events.push(DemuxEvent::FeedbackOnly),
            DecompressOutcome::Failed { reason } => events.push(DemuxEvent::DecompressFailed { reason }),
        },
        None => events.push(DemuxEvent::WriteToTap(entry.payload)),
    });

    if let Err(source) = result {
        events.push(DemuxEvent::Truncated { source });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::CompressOutcome;

    struct PassThroughCompressor;

    impl HeaderCompressor for PassThroughCompressor {
        fn compress(&mut self, ip_packet: &[u8]) -> CompressOutcome {
            CompressOutcome::Compressed(Bytes::copy_from_slice(ip_packet))
        }

        fn decompress(&mut self, rohc_packet: &[u8]) -> DecompressOutcome {
            DecompressOutcome::Ip(Bytes::copy_from_slice(rohc_packet))
        }
    }

    struct AlwaysFailsCompressor;

    impl HeaderCompressor for AlwaysFailsCompressor {
        fn compress(&mut self, _ip_packet: &[u8]) -> CompressOutcome {
            CompressOutcome::Failed { reason: "test".to_owned() }
        }

        fn decompress(&mut self, _rohc_packet: &[u8]) -> DecompressOutcome {
            DecompressOutcome::Failed { reason: "bad context".to_owned() }
        }
    }

    fn bundle_of(payloads: &[&[u8]]) -> Bytes {
        let mut wire = Vec::new();
        for p in payloads {
            simplemux_proto::write_payload(&mut wire, p).unwrap();
        }
        Bytes::from(wire)
    }

    #[test]
    fn pass_through_without_compressor_writes_every_entry() {
        let bundle = bundle_of(&[b"a", b"bb", b"ccc"]);
        let events = demux_bundle(bundle, None);
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| matches!(e, DemuxEvent::WriteToTap(_))));
    }

    #[test]
    fn decompress_failure_on_one_entry_does_not_abort_the_rest() {
        let bundle = bundle_of(&[b"a", b"b", b"c"]);
        let mut engine = AlwaysFailsCompressor;
        let events = demux_bundle(bundle, Some(&mut engine));
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| matches!(e, DemuxEvent::DecompressFailed { .. })));
    }

    #[test]
    fn malformed_separator_discards_remainder_but_keeps_earlier_writes() {
        let mut wire = Vec::new();
        simplemux_proto::write_payload(&mut wire, b"first").unwrap();
        wire.push(0x80); // bad separator starts the next entry
        let bundle = Bytes::from(wire);

        let mut engine = PassThroughCompressor;
        let events = demux_bundle(bundle, Some(&mut engine));
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], DemuxEvent::WriteToTap(_)));
        assert!(matches!(events[1], DemuxEvent::Truncated { .. }));
    }
}
