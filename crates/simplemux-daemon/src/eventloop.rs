//! The single-threaded reactor (§4.7): one task multiplexes the tun device,
//! the UDP socket, and the period timer, grounded on the teacher's
//! `select! { biased; ... }` event arbitration (there, over terminal input,
//! resize, and a redraw timeout; here, over the UDP socket, the tun device,
//! and the period timer).

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use simplemux_core::{
    Accumulator, AccumulatorAction, Clock, CompressOutcome, DemuxError, DemuxEvent, HeaderCompressor, PacketEndpoint,
    TraceEvent, TraceSink, UdpEndpoint, demux_bundle,
};

/// Owns every endpoint and piece of state the reactor touches.
pub struct EventLoop<P, U, C>
where
    P: PacketEndpoint,
    U: UdpEndpoint,
    C: Clock,
{
    tap: P,
    udp: U,
    clock: C,
    remote: SocketAddr,
    /// The configured multiplex port (§6.1, §6.4 `port`): a received
    /// datagram is demultiplexed iff its source port equals this value,
    /// otherwise it is pass-through (§4.5 step 1).
    multiplex_port: u16,
    accumulator: Accumulator,
    send_engine: Option<Box<dyn HeaderCompressor>>,
    recv_engine: Option<Box<dyn HeaderCompressor>>,
    trace: Box<dyn TraceSink>,
}

impl<P, U, C> EventLoop<P, U, C>
where
    P: PacketEndpoint,
    U: UdpEndpoint,
    C: Clock,
{
    /// Build a reactor. `send_engine`/`recv_engine` are `None` when header
    /// compression is disabled (`--no-compress`); bundles then carry raw IP
    /// packets.
    #[must_use]
    pub fn new(
        tap: P,
        udp: U,
        clock: C,
        remote: SocketAddr,
        multiplex_port: u16,
        accumulator: Accumulator,
        send_engine: Option<Box<dyn HeaderCompressor>>,
        recv_engine: Option<Box<dyn HeaderCompressor>>,
        trace: Box<dyn TraceSink>,
    ) -> Self {
        Self { tap, udp, clock, remote, multiplex_port, accumulator, send_engine, recv_engine, trace }
    }

    /// Run until a Ctrl-C / SIGTERM is observed (ambient process hygiene;
    /// there is no protocol-level drain to perform, §5).
    pub async fn run(&mut self) {
        loop {
            let now = self.clock.now_micros();
            let deadline_micros = self.deadline_micros(now);

            tokio::select! {
                biased;

                datagram = self.udp.recv_from() => {
                    match datagram {
                        Ok((bytes, peer)) => self.on_udp_datagram(bytes, peer).await,
                        Err(err) => tracing::warn!(%err, "UDP receive failed"),
                    }
                },

                packet = self.tap.recv() => {
                    match packet {
                        Ok(bytes) => self.on_tap_packet(bytes).await,
                        Err(err) => tracing::warn!(%err, "tun read failed"),
                    }
                },

                () = tokio::time::sleep(Duration::from_micros(deadline_micros)) => {
                    self.on_tick().await;
                },

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown signal received");
                    return;
                },
            }
        }
    }

    /// Microseconds until the period timer should next fire, per §4.7:
    /// `max(0, period - (now - last_flush_time))`. A period of `u64::MAX`
    /// (no period trigger configured) degrades to an hour-long poll so the
    /// loop still wakes occasionally without busy-spinning.
    fn deadline_micros(&self, now: u64) -> u64 {
        const NO_PERIOD_POLL: u64 = 3_600_000_000; // 1 hour
        let period = self.accumulator_period();
        if period == u64::MAX {
            return NO_PERIOD_POLL;
        }
        let elapsed = now.saturating_sub(self.accumulator.last_flush_time());
        period.saturating_sub(elapsed).max(1)
    }

    fn accumulator_period(&self) -> u64 {
        self.accumulator.period_micros()
    }

    async fn on_udp_datagram(&mut self, datagram: Bytes, peer: SocketAddr) {
        let now = self.clock.now_micros();

        if peer.port() != self.multiplex_port {
            let bytes = datagram.len();
            if let Err(err) = self.tap.send(&datagram).await {
                tracing::warn!(%err, "failed to forward pass-through packet to tun device");
            }
            self.trace.record(now, TraceEvent::Forwarded { bytes });
            return;
        }

        let bytes = datagram.len();
        let events = demux_bundle(datagram, self.recv_engine.as_deref_mut());
        for event in events {
            match event {
                DemuxEvent::WriteToTap(ip) => {
                    if let Err(err) = self.tap.send(&ip).await {
                        tracing::warn!(%err, "failed to write packet to tun device");
                    }
                },
                DemuxEvent::FeedbackOnly => {},
                DemuxEvent::DecompressFailed { reason } => {
                    self.trace.record(now, TraceEvent::DemuxDropped { error: DemuxError::DecompressFailed { reason }, bytes });
                },
                DemuxEvent::Truncated { source } => {
                    self.trace.record(now, TraceEvent::DemuxDropped { error: DemuxError::Framing { source }, bytes });
                },
            }
        }
    }

    async fn on_tap_packet(&mut self, packet: Bytes) {
        let now = self.clock.now_micros();

        let payload = match self.send_engine.as_deref_mut() {
            Some(engine) => match engine.compress(&packet) {
                CompressOutcome::Compressed(bytes) => bytes,
                CompressOutcome::Segment => {
                    self.trace.record(
                        now,
                        TraceEvent::CompressDropped { reason: "segment exceeds MRRU".to_owned(), bytes: packet.len() },
                    );
                    return;
                },
                CompressOutcome::Failed { reason } => {
                    self.trace.record(now, TraceEvent::CompressDropped { reason, bytes: packet.len() });
                    return;
                },
            },
            None => packet,
        };

        let actions = self.accumulator.offer(payload, now);
        self.handle_accumulator_actions(actions, now).await;
    }

    async fn on_tick(&mut self) {
        let now = self.clock.now_micros();
        let actions = self.accumulator.tick(now);
        self.handle_accumulator_actions(actions, now).await;
    }

    async fn handle_accumulator_actions(&mut self, actions: Vec<AccumulatorAction>, now: u64) {
        for action in actions {
            match action {
                AccumulatorAction::Flush { reason, bundle, packet_count } => {
                    self.trace.record(
                        now,
                        TraceEvent::Flushed { reason, packet_count, bundle_bytes: bundle.len() },
                    );
                    if let Err(err) = self.udp.send_to(&bundle, self.remote).await {
                        tracing::warn!(%err, "failed to send bundle");
                    }
                },
                AccumulatorAction::Drop { error } => {
                    self.trace.record(now, TraceEvent::AccumulatorDropped(error));
                },
            }
        }
    }
}
