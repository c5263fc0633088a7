//! Fuzz target for bundle parsing.
//!
//! # Invariants
//!
//! - `for_each_entry` never panics on arbitrary datagram bytes.
//! - A malformed separator or truncated payload stops parsing but does not
//!   lose or duplicate any entry already delivered to the callback.
//! - Every entry handed to the callback is fully contained within the
//!   original bundle bytes.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use simplemux_proto::for_each_entry;

fuzz_target!(|data: &[u8]| {
    let bundle = Bytes::copy_from_slice(data);
    let total_len = bundle.len();
    let mut consumed = 0usize;

    let _ = for_each_entry(bundle, |entry| {
        consumed += entry.payload.len();
        assert!(consumed <= total_len);
    });
});
