//! Wire format for Simplemux.
//!
//! This crate is the self-delimiting framing layer described in the design's
//! §3/§4.1/§4.5: the one- or two-byte length separator, and the bundle
//! (concatenation of separator-prefixed payloads) that travels inside a
//! single UDP datagram. It has no knowledge of accumulation policy, header
//! compression, or I/O — those live in `simplemux-core`, `simplemux-rohc`,
//! and `simplemux-daemon` respectively.

pub mod bundle;
pub mod error;
pub mod separator;

pub use bundle::{BundleEntry, BundleStep, for_each_entry, framed_len, next_entry, write_payload};
pub use error::{ProtoError, Result};
pub use separator::{MAX_LENGTH, TWO_BYTE_THRESHOLD, sep_len};
