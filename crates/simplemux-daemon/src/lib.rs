//! Simplemux production daemon.
//!
//! Wires `simplemux_core`'s I/O-free accumulator and demultiplexer to a real
//! tun device and UDP socket via Tokio, the same "sans-IO core, thin async
//! glue" split the teacher uses for its server driver.
//!
//! # Components
//!
//! - [`config::Args`]: command-line configuration (§6.4)
//! - [`eventloop::EventLoop`]: the `tokio::select!` reactor (§4.7)
//! - [`io::TunEndpoint`] / [`io::TokioUdpEndpoint`]: production I/O
//! - [`logging::FileTraceSink`]: the tab-separated trace log (§6.5)
//! - [`error::DaemonError`]: fatal startup errors (§7)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod eventloop;
pub mod io;
pub mod logging;

pub use config::Args;
pub use error::DaemonError;
pub use eventloop::EventLoop;
pub use io::{TokioUdpEndpoint, TunEndpoint};
pub use logging::FileTraceSink;
