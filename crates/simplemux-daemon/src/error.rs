//! Daemon-fatal error types (§7: "fatal" tier).
//!
//! Everything that can happen once the event loop is running is a per-packet
//! or per-syscall failure and becomes a [`simplemux_core::TraceEvent`]
//! instead — see [`crate::logging`]. `DaemonError` covers only the things
//! that prevent the daemon from starting at all.

use thiserror::Error;

/// Fatal startup error.
#[derive(Error, Debug)]
pub enum DaemonError {
    /// The tun/tap device could not be created or configured.
    #[error("failed to create tunnel interface {name}: {source}")]
    Interface {
        /// Name of the interface that failed to come up.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The UDP socket could not be bound or configured.
    #[error("failed to bind UDP socket on {address}: {source}")]
    Socket {
        /// Address the daemon tried to bind.
        address: std::net::SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The remote tunnel endpoint address did not parse.
    #[error("invalid remote address '{input}': {source}")]
    InvalidRemoteAddress {
        /// The offending command-line value.
        input: String,
        /// Underlying parse error.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The log file could not be opened for writing.
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        /// Path the daemon tried to open.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
