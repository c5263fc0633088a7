//! Simplemux daemon binary.
//!
//! # Usage
//!
//! ```bash
//! simplemux --tun-name tun0 --remote-addr 203.0.113.9 --remote-port 55555 \
//!     --local-port 55555 --count-threshold 10 --log-file /var/log/simplemux.log
//! ```

use std::net::SocketAddr;

use clap::Parser;
use simplemux_core::{Accumulator, Clock, NullTraceSink, SystemClock, TraceSink};
use simplemux_daemon::{Args, DaemonError, EventLoop, FileTraceSink, TokioUdpEndpoint, TunEndpoint};
use simplemux_rohc::LightweightRohcEngine;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry().with(fmt::layer()).with(args.tracing_filter()).init();

    tracing::info!(tun = %args.tun_name, remote = %args.remote_socket_addr(), "simplemux starting");

    run(args).await?;
    Ok(())
}

async fn run(args: Args) -> Result<(), DaemonError> {
    let tap = TunEndpoint::create(&args.tun_name, args.mtu)?;
    let local_addr = SocketAddr::new(std::net::Ipv4Addr::UNSPECIFIED.into(), args.local_port);
    let udp = TokioUdpEndpoint::bind(local_addr, None)?;

    let clock = SystemClock::new();
    let accumulator = Accumulator::new(args.trigger_config(), clock.now_micros());

    let (send_engine, recv_engine): (Option<Box<dyn simplemux_core::HeaderCompressor>>, _) = if args.no_compress {
        (None, None)
    } else {
        (Some(Box::new(LightweightRohcEngine::new())), Some(Box::new(LightweightRohcEngine::new())))
    };

    let trace: Box<dyn TraceSink> = match &args.log_file {
        Some(path) => Box::new(FileTraceSink::open(path)?),
        None => Box::new(NullTraceSink),
    };

    let mut event_loop = EventLoop::new(
        tap,
        udp,
        clock,
        args.remote_socket_addr(),
        args.local_port,
        accumulator,
        send_engine,
        recv_engine,
        trace,
    );

    event_loop.run().await;
    tracing::info!("simplemux stopped");
    Ok(())
}
