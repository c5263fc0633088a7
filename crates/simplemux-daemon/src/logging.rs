//! Tab-separated trace log (§6.5), flushed after every record.
//!
//! With a single event-loop task (§4.7), flushing per record trivially
//! satisfies the spec's "flush before the next task observes the file"
//! rule — there is no other task to race against.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use simplemux_core::{AccumulatorError, DemuxError, FlushReason, TraceEvent, TraceSink};
use simplemux_proto::ProtoError;

use crate::error::DaemonError;

/// Cumulative per-direction packet counters, carried as the `<counter>`
/// field of every record (source's `net2tap`/`tap2net`).
#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    net2tap: u64,
    tap2net: u64,
}

impl Counters {
    fn format_line(&mut self, now_micros: u64, event: &TraceEvent) -> String {
        match event {
            TraceEvent::Flushed { reason, bundle_bytes, .. } => {
                self.tap2net += 1;
                format!("{now_micros}\tsent\tmuxed\t{bundle_bytes}\t{}\t{}", self.tap2net, reason_tag(*reason))
            },
            TraceEvent::Forwarded { bytes } => {
                self.net2tap += 1;
                format!("{now_micros}\tforward\tnative\t{bytes}\t{}", self.net2tap)
            },
            TraceEvent::AccumulatorDropped(err) => {
                self.tap2net += 1;
                let AccumulatorError::PayloadExceedsMtu { payload_len, .. } = err;
                format!("{now_micros}\terror\toversized_payload\t{payload_len}\t{}", self.tap2net)
            },
            TraceEvent::DemuxDropped { error, bytes } => {
                self.net2tap += 1;
                format!("{now_micros}\terror\t{}\t{bytes}\t{}", demux_kind(error), self.net2tap)
            },
            TraceEvent::CompressDropped { bytes, .. } => {
                self.tap2net += 1;
                format!("{now_micros}\terror\tcompr_failed\t{bytes}\t{}", self.tap2net)
            },
        }
    }
}

/// Writes one tab-separated line per [`TraceEvent`] to a file.
pub struct FileTraceSink {
    writer: BufWriter<File>,
    counters: Counters,
}

impl FileTraceSink {
    /// Open (creating if necessary, appending if it exists) the log file at
    /// `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::LogFile`] if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, DaemonError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| DaemonError::LogFile { path: path.display().to_string(), source })?;
        Ok(Self { writer: BufWriter::new(file), counters: Counters::default() })
    }
}

impl TraceSink for FileTraceSink {
    fn record(&mut self, now_micros: u64, event: TraceEvent) {
        let line = self.counters.format_line(now_micros, &event);
        if writeln!(self.writer, "{line}").is_err() {
            return;
        }
        let _ = self.writer.flush();
    }
}

/// Trailing tag identifying why a `sent/muxed` record's bundle was flushed.
fn reason_tag(reason: FlushReason) -> &'static str {
    match reason {
        FlushReason::Count => "numpacket_limit",
        FlushReason::Size => "size_limit",
        FlushReason::Timeout => "timeout",
        FlushReason::Period => "period",
        FlushReason::Mtu => "MTU",
    }
}

/// The `kind` column for a demultiplex-side error (§6.5).
fn demux_kind(error: &DemuxError) -> &'static str {
    match error {
        DemuxError::Framing { source: ProtoError::BadSeparator | ProtoError::TruncatedSeparator } => "bad_separator",
        DemuxError::Framing { source: ProtoError::TruncatedPayload { .. } | ProtoError::LengthOutOfRange(_) } => {
            "demux_bad_length"
        },
        DemuxError::DecompressFailed { .. } => "decomp_failed",
    }
}

#[cfg(test)]
mod tests {
    use simplemux_core::AccumulatorError;

    use super::*;

    #[test]
    fn formats_a_sent_muxed_line_with_bytes_then_counter_then_reason_tag() {
        let mut counters = Counters::default();
        let event = TraceEvent::Flushed { reason: FlushReason::Count, packet_count: 3, bundle_bytes: 120 };
        assert_eq!(counters.format_line(42, &event), "42\tsent\tmuxed\t120\t1\tnumpacket_limit");
    }

    #[test]
    fn formats_a_forward_native_line() {
        let mut counters = Counters::default();
        let event = TraceEvent::Forwarded { bytes: 64 };
        assert_eq!(counters.format_line(7, &event), "7\tforward\tnative\t64\t1");
    }

    #[test]
    fn formats_a_bad_separator_error_line() {
        let mut counters = Counters::default();
        let error = DemuxError::Framing { source: ProtoError::BadSeparator };
        let event = TraceEvent::DemuxDropped { error, bytes: 9 };
        assert_eq!(counters.format_line(10, &event), "10\terror\tbad_separator\t9\t1");
    }

    #[test]
    fn formats_a_demux_bad_length_error_line() {
        let mut counters = Counters::default();
        let error = DemuxError::Framing { source: ProtoError::TruncatedPayload { declared: 100, available: 80 } };
        let event = TraceEvent::DemuxDropped { error, bytes: 80 };
        assert_eq!(counters.format_line(11, &event), "11\terror\tdemux_bad_length\t80\t1");
    }

    #[test]
    fn counters_advance_independently_per_direction() {
        let mut counters = Counters::default();
        counters.format_line(1, &TraceEvent::Forwarded { bytes: 1 });
        counters.format_line(2, &TraceEvent::Forwarded { bytes: 1 });
        let line = counters.format_line(
            3,
            &TraceEvent::AccumulatorDropped(AccumulatorError::PayloadExceedsMtu {
                payload_len: 2000,
                sep_len: 2,
                mtu: 1500,
            }),
        );
        assert_eq!(line, "3\terror\toversized_payload\t2000\t1");
    }
}
