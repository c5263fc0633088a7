//! A bundle is the concatenation of one or more `(Separator, Payload)` pairs
//! that travels in a single UDP datagram (§3, §4.5).

use bytes::Bytes;

use crate::{
    error::ProtoError,
    separator::{self, sep_len},
};

/// Write `payload` as `(Encode(len), payload)` onto the end of `out`.
///
/// # Errors
///
/// Returns [`ProtoError::LengthOutOfRange`] if `payload` is empty or longer
/// than [`separator::MAX_LENGTH`].
pub fn write_payload(out: &mut Vec<u8>, payload: &[u8]) -> Result<(), ProtoError> {
    separator::encode(payload.len(), out)?;
    out.extend_from_slice(payload);
    Ok(())
}

/// The serialized size `write_payload` would produce for `payload_len` bytes,
/// i.e. `sep_len(payload_len) + payload_len`.
pub fn framed_len(payload_len: usize) -> Result<usize, ProtoError> {
    Ok(sep_len(payload_len)? + payload_len)
}

/// One `(separator, payload)` entry recovered while walking a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    /// The payload bytes, borrowed from the original datagram.
    pub payload: Bytes,
}

/// Outcome of decoding one step of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleStep {
    /// An entry was successfully parsed; `rest` is what follows it.
    Entry {
        /// The parsed entry.
        entry: BundleEntry,
        /// Bytes remaining in the bundle after this entry.
        rest: Bytes,
    },
    /// The bundle is fully consumed.
    Done,
}

/// Parse one `(separator, payload)` entry from the front of `bundle`.
///
/// Per §4.5: a bad separator or a declared length that overruns the
/// remaining bytes both abort parsing of the *entire remaining bundle* — the
/// caller should stop looping on `Err` rather than skip to the next byte.
///
/// # Errors
///
/// - [`ProtoError::BadSeparator`] / [`ProtoError::TruncatedSeparator`] if the
///   separator itself is malformed.
/// - [`ProtoError::TruncatedPayload`] if the declared length overruns the
///   remaining datagram.
pub fn next_entry(bundle: &Bytes) -> Result<BundleStep, ProtoError> {
    if bundle.is_empty() {
        return Ok(BundleStep::Done);
    }

    let (length, consumed) = separator::decode(bundle)?;
    let available = bundle.len() - consumed;
    if length > available {
        return Err(ProtoError::TruncatedPayload { declared: length, available });
    }

    let payload = bundle.slice(consumed..consumed + length);
    let rest = bundle.slice(consumed + length..);
    Ok(BundleStep::Entry { entry: BundleEntry { payload }, rest })
}

/// Walk an entire bundle, invoking `on_entry` for each well-formed entry.
///
/// Stops (without error) at the first malformed separator or truncated
/// payload, returning that error to the caller so it can be logged — per
/// §4.5, this never panics and never aborts the surrounding socket loop.
///
/// # Errors
///
/// Forwards the first error encountered from [`next_entry`], if any.
pub fn for_each_entry(
    mut bundle: Bytes,
    mut on_entry: impl FnMut(BundleEntry),
) -> Result<(), ProtoError> {
    loop {
        match next_entry(&bundle)? {
            BundleStep::Entry { entry, rest } => {
                on_entry(entry);
                bundle = rest;
            },
            BundleStep::Done => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_three_entries() {
        let mut wire = Vec::new();
        write_payload(&mut wire, b"a").unwrap();
        write_payload(&mut wire, &[0u8; 80]).unwrap();
        write_payload(&mut wire, b"zz").unwrap();

        let bundle = Bytes::from(wire);
        let mut seen = Vec::new();
        for_each_entry(bundle, |entry| seen.push(entry.payload)).unwrap();

        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].as_ref(), b"a");
        assert_eq!(seen[1].len(), 80);
        assert_eq!(seen[2].as_ref(), b"zz");
    }

    #[test]
    fn bad_separator_discards_remaining_bundle() {
        let mut wire = vec![0x80u8]; // bad separator
        wire.extend_from_slice(b"garbage");
        let bundle = Bytes::from(wire);

        let mut seen = 0;
        let err = for_each_entry(bundle, |_| seen += 1).unwrap_err();
        assert_eq!(err, ProtoError::BadSeparator);
        assert_eq!(seen, 0);
    }

    #[test]
    fn truncated_payload_discards_remainder() {
        let mut wire = Vec::new();
        separator::encode(100, &mut wire).unwrap();
        wire.extend_from_slice(&[0u8; 80]); // only 80 of the declared 100 bytes
        let bundle = Bytes::from(wire);

        let err = for_each_entry(bundle, |_| ()).unwrap_err();
        assert_eq!(err, ProtoError::TruncatedPayload { declared: 100, available: 80 });
    }

    #[test]
    fn partial_failure_mid_bundle_keeps_earlier_entries() {
        let mut wire = Vec::new();
        write_payload(&mut wire, b"first").unwrap();
        let good_len = wire.len();
        wire.push(0x80); // second entry starts with a bad separator

        let bundle = Bytes::from(wire);
        let mut seen = Vec::new();
        let err = for_each_entry(bundle, |entry| seen.push(entry.payload)).unwrap_err();

        assert_eq!(err, ProtoError::BadSeparator);
        assert_eq!(seen, vec![Bytes::from_static(b"first")]);
        assert!(good_len > 0);
    }

    #[test]
    fn framed_len_matches_write_payload_output() {
        let mut wire = Vec::new();
        write_payload(&mut wire, &[0u8; 200]).unwrap();
        assert_eq!(wire.len(), framed_len(200).unwrap());
    }
}
