//! Fuzz target for the length-separator codec.
//!
//! # Invariants
//!
//! - `decode` never panics on any byte slice, including empty input.
//! - A validity bit set on the first byte MUST return `BadSeparator`.
//! - A successfully decoded length MUST round-trip through `encode`.

#![no_main]

use libfuzzer_sys::fuzz_target;
use simplemux_proto::separator::{decode, encode};

fuzz_target!(|data: &[u8]| {
    match decode(data) {
        Ok((length, consumed)) => {
            assert!(consumed == 1 || consumed == 2);
            assert!(consumed <= data.len());

            let mut buf = Vec::new();
            encode(length, &mut buf).expect("a decoded length must be encodable");
            assert_eq!(buf.len(), consumed);
            assert_eq!(decode(&buf), Ok((length, consumed)));
        },
        Err(_) => {},
    }
});
