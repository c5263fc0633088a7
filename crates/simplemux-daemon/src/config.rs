//! Command-line configuration (§6.4).
//!
//! `timeout`/`period` are microseconds, resolving Open Question (d) in favor
//! of the spec's own integer-microsecond framing rather than the source's
//! float-typed-but-integer-valued fields. `mtu` is not in the source's
//! option table but is required to honor the MTU invariant (§4.2 step 4) and
//! is present as a compile-time constant there; exposing it as a flag here
//! is a deliberate, documented addition (see `DESIGN.md`).

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use simplemux_core::TriggerConfig;
use tracing_subscriber::EnvFilter;

/// Userspace UDP-tunnel packet optimizer.
#[derive(Parser, Debug)]
#[command(name = "simplemux", about = "Accumulate and header-compress packets over a UDP tunnel", version)]
pub struct Args {
    /// Name of the tun interface to create (source's `-i`).
    #[arg(short = 'i', long, default_value = "tun0")]
    pub tun_name: String,

    /// Remote tunnel endpoint address (source's `-e`).
    #[arg(short = 'e', long)]
    pub remote_addr: IpAddr,

    /// Remote tunnel endpoint UDP port (source's `-p`).
    #[arg(short = 'p', long, default_value_t = 55_555)]
    pub remote_port: u16,

    /// Local UDP port to listen on (source's `-l`).
    #[arg(short = 'l', long, default_value_t = 55_555)]
    pub local_port: u16,

    /// Count trigger: flush after this many packets accumulate (source's
    /// `-n`). Left unset, the trigger default (§4.3) applies.
    #[arg(short = 'n', long)]
    pub count_threshold: Option<u32>,

    /// Size trigger, in bytes: flush once the bundle exceeds this (source's
    /// `-b`). Defaults to infinite (no size trigger).
    #[arg(short = 'b', long, default_value_t = usize::MAX)]
    pub size_threshold: usize,

    /// Timeout trigger, in microseconds: flush if the oldest pending packet
    /// has waited this long (source's `-t`). Defaults to infinite.
    #[arg(short = 't', long, default_value_t = u64::MAX)]
    pub timeout_micros: u64,

    /// Period trigger, in microseconds: flush on this interval regardless of
    /// pending state (source's `-P`). Defaults to infinite (no period
    /// trigger).
    #[arg(short = 'P', long, default_value_t = u64::MAX)]
    pub period_micros: u64,

    /// Maximum bundle size in bytes, inclusive of separators. Not present in
    /// the source's option table (see `DESIGN.md`).
    #[arg(short = 'm', long, default_value_t = 1500)]
    pub mtu: usize,

    /// Path to the tab-separated trace log (source's `-L`). Omitted means no
    /// logging (§9 resolution of Open Question (c)).
    #[arg(short = 'L', long)]
    pub log_file: Option<PathBuf>,

    /// Process log level for operational (non-protocol) logging.
    #[arg(short = 'd', long, default_value = "info")]
    pub debug_level: String,

    /// Disable header compression and forward bundles of raw IP packets.
    #[arg(long)]
    pub no_compress: bool,
}

impl Args {
    /// Resolve the operator's trigger flags into a [`TriggerConfig`].
    #[must_use]
    pub fn trigger_config(&self) -> TriggerConfig {
        TriggerConfig::resolve(
            self.count_threshold,
            self.size_threshold,
            self.timeout_micros,
            self.period_micros,
            self.mtu,
        )
    }

    /// Remote tunnel endpoint as a socket address.
    #[must_use]
    pub fn remote_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.remote_addr, self.remote_port)
    }

    /// `tracing` filter derived from `--debug-level`, honoring `RUST_LOG` if
    /// set (ambient stack, in addition to the §6.5 trace log).
    #[must_use]
    pub fn tracing_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.debug_level))
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use clap::Parser;

    use super::Args;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["simplemux", "-e", "203.0.113.9"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn defaults_resolve_to_a_pass_through_trigger_config() {
        let cfg = args(&[]).trigger_config();
        assert_eq!(cfg.n_max, 1);
        assert_eq!(cfg.size_threshold, usize::MAX);
        assert_eq!(cfg.mtu, 1500);
    }

    #[test]
    fn count_threshold_flag_overrides_pass_through_default() {
        let cfg = args(&["-n", "20"]).trigger_config();
        assert_eq!(cfg.n_max, 20);
    }

    #[test]
    fn remote_socket_addr_combines_address_and_port() {
        let addr = args(&["-p", "6000"]).remote_socket_addr();
        assert_eq!(addr.ip(), Ipv4Addr::new(203, 0, 113, 9));
        assert_eq!(addr.port(), 6000);
    }
}
