//! I/O-free core of Simplemux: the accumulator/trigger engine, the
//! demultiplexer, and the seams (`Clock`, `HeaderCompressor`, `TraceSink`)
//! that let `simplemux-daemon` drive them without this crate knowing about
//! sockets, tun devices, or wall-clock time.

pub mod accumulator;
pub mod compress;
pub mod demux;
pub mod env;
pub mod error;
pub mod io;
pub mod trace;

pub use accumulator::{Accumulator, AccumulatorAction, FlushReason, TriggerConfig};
pub use compress::{CompressOutcome, DecompressOutcome, HeaderCompressor};
pub use demux::{DemuxEvent, demux_bundle};
pub use env::{Clock, SystemClock};
pub use error::{AccumulatorError, DemuxError};
pub use io::{PacketEndpoint, UdpEndpoint};
pub use trace::{NullTraceSink, TraceEvent, TraceSink};
