//! Error types for the Simplemux wire format.

use thiserror::Error;

/// Result alias used throughout `simplemux-proto`.
pub type Result<T> = std::result::Result<T, ProtoError>;

/// Errors raised while encoding or decoding the Simplemux wire format.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoError {
    /// A length separator had bit 7 (the framing-validity marker) set.
    ///
    /// Per §4.1, this aborts parsing of the *entire* remaining bundle, not
    /// just the current payload.
    #[error("bad separator: framing-validity bit set")]
    BadSeparator,

    /// A two-byte separator was signalled (PFF = 1) but the buffer ended
    /// before the second byte.
    #[error("truncated separator: expected a second byte")]
    TruncatedSeparator,

    /// The separator declared a payload length that does not fit in the
    /// remaining bytes of the datagram.
    #[error("truncated payload: declared {declared} bytes, {available} available")]
    TruncatedPayload {
        /// Length declared by the separator.
        declared: usize,
        /// Bytes actually remaining in the datagram.
        available: usize,
    },

    /// `encode`/`sep_len` was asked to frame a length outside `[1, 16383]`.
    #[error("length {0} out of encodable range [1, 16383]")]
    LengthOutOfRange(usize),
}
