//! Accumulator / trigger engine (§4.2, §4.3).
//!
//! A pure state machine: `offer` and `tick` take the current state plus an
//! input (a payload, or the current time) and return the actions the caller
//! should perform, grounded on the teacher's `ConnectionAction`-returning
//! `process_event` pattern. No I/O happens here — the event loop in
//! `simplemux-daemon` is the only thing that ever calls `send` on a socket.

use bytes::Bytes;

use crate::error::AccumulatorError;

/// Which trigger caused a flush (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// `pending_count` reached `n_max`.
    Count,
    /// `pending_bytes` exceeded `size_threshold`.
    Size,
    /// `now - last_flush_time` exceeded `timeout_micros` while offering a
    /// packet.
    Timeout,
    /// The period timer fired with at least one pending packet.
    Period,
    /// A new payload would overflow the MTU; the accumulator is flushed to
    /// make room for it.
    Mtu,
}

/// Resolved trigger configuration for one accumulator (§4.3, §6.4).
///
/// Each threshold uses its type's maximum value as "infinite" (no trigger),
/// matching the source's `MAXTHRESHOLD`/`MAXTIMEOUT` sentinels.
#[derive(Debug, Clone, Copy)]
pub struct TriggerConfig {
    /// Maximum number of packets per bundle before a count-triggered flush.
    pub n_max: u32,
    /// Maximum bundle size, in bytes, before a size-triggered flush.
    pub size_threshold: usize,
    /// Maximum age of the oldest pending packet, in microseconds, before a
    /// timeout-triggered flush.
    pub timeout_micros: u64,
    /// Period, in microseconds, of the background flush timer.
    pub period_micros: u64,
    /// Maximum bundle size in bytes, inclusive of all separators (§4.2 step
    /// 4). Distinct from `size_threshold`: a flush may still be *requested*
    /// below the MTU, but nothing may ever exceed it.
    pub mtu: usize,
}

impl TriggerConfig {
    /// Default bundle capacity used when at least one trigger is finite but
    /// the operator did not set `n_max` explicitly (§6.4, §9 resolution for
    /// the source's `MAXPKTS` fallback).
    pub const DEFAULT_BUNDLE_CAPACITY: u32 = 100;

    /// Resolve a full configuration from operator-supplied values.
    ///
    /// `n_max` defaults to `1` (pass-through) if every other trigger is left
    /// infinite, and to [`Self::DEFAULT_BUNDLE_CAPACITY`] otherwise (§4.3
    /// "Trigger defaults").
    #[must_use]
    pub fn resolve(
        n_max: Option<u32>,
        size_threshold: usize,
        timeout_micros: u64,
        period_micros: u64,
        mtu: usize,
    ) -> Self {
        let any_finite =
            size_threshold != usize::MAX || timeout_micros != u64::MAX || period_micros != u64::MAX;
        let n_max = n_max.unwrap_or(if any_finite { Self::DEFAULT_BUNDLE_CAPACITY } else { 1 });
        Self { n_max, size_threshold, timeout_micros, period_micros, mtu }
    }
}

/// Action produced by [`Accumulator::offer`] or [`Accumulator::tick`].
#[derive(Debug, Clone)]
pub enum AccumulatorAction {
    /// Send this bundle now.
    Flush {
        /// Which trigger caused the flush.
        reason: FlushReason,
        /// The framed bundle, ready to hand to the UDP endpoint.
        bundle: Bytes,
        /// Number of packets the bundle contains.
        packet_count: u32,
    },
    /// A payload was rejected without being accumulated.
    Drop {
        /// Why the payload was dropped.
        error: AccumulatorError,
    },
}

/// The accumulator itself: a FIFO of payloads awaiting a flush, plus the
/// running totals used to evaluate triggers without re-walking the queue.
#[derive(Debug, Clone)]
pub struct Accumulator {
    config: TriggerConfig,
    pending: Vec<Bytes>,
    pending_bytes: usize,
    last_flush_time: u64,
}

impl Accumulator {
    /// Create an empty accumulator. `now` seeds `last_flush_time` so the
    /// first timeout/period evaluation is relative to start-up, not epoch 0.
    #[must_use]
    pub fn new(config: TriggerConfig, now: u64) -> Self {
        Self { config, pending: Vec::new(), pending_bytes: 0, last_flush_time: now }
    }

    /// Number of packets currently pending.
    #[must_use]
    pub fn pending_count(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let count = self.pending.len() as u32;
        count
    }

    /// Total framed size, in bytes, of the packets currently pending.
    #[must_use]
    pub fn pending_bytes(&self) -> usize {
        self.pending_bytes
    }

    /// Time of the last flush (or of construction, if none yet).
    #[must_use]
    pub fn last_flush_time(&self) -> u64 {
        self.last_flush_time
    }

    /// Configured period trigger, in microseconds (`u64::MAX` if disabled).
    #[must_use]
    pub fn period_micros(&self) -> u64 {
        self.config.period_micros
    }

    /// Offer one packet to the accumulator (§4.2).
    ///
    /// Evaluates, in order: whether the payload can even be framed, whether
    /// accepting it would overflow the MTU (flushing first if there is
    /// something to flush, dropping otherwise), and then — once the payload
    /// is appended — the count, size, and timeout triggers, in that order,
    /// stopping at the first one that fires.
    pub fn offer(&mut self, payload: Bytes, now: u64) -> Vec<AccumulatorAction> {
        let mut actions = Vec::new();

        let sep_len = match simplemux_proto::sep_len(payload.len()) {
            Ok(len) => len,
            Err(_) => {
                actions.push(AccumulatorAction::Drop {
                    error: AccumulatorError::PayloadExceedsMtu {
                        payload_len: payload.len(),
                        sep_len: 0,
                        mtu: self.config.mtu,
                    },
                });
                return actions;
            }
        };
        let framed_len = sep_len + payload.len();

        if self.pending_bytes + framed_len > self.config.mtu {
            if self.pending.is_empty() {
                actions.push(AccumulatorAction::Drop {
                    error: AccumulatorError::PayloadExceedsMtu {
                        payload_len: payload.len(),
                        sep_len,
                        mtu: self.config.mtu,
                    },
                });
                return actions;
            }
            actions.push(self.flush(FlushReason::Mtu, now));
            if framed_len > self.config.mtu {
                actions.push(AccumulatorAction::Drop {
                    error: AccumulatorError::PayloadExceedsMtu {
                        payload_len: payload.len(),
                        sep_len,
                        mtu: self.config.mtu,
                    },
                });
                return actions;
            }
        }

        self.pending.push(payload);
        self.pending_bytes += framed_len;

        if self.pending_count() >= self.config.n_max {
            actions.push(self.flush(FlushReason::Count, now));
        } else if self.pending_bytes > self.config.size_threshold {
            actions.push(self.flush(FlushReason::Size, now));
        } else if now.saturating_sub(self.last_flush_time) > self.config.timeout_micros {
            actions.push(self.flush(FlushReason::Timeout, now));
        }

        actions
    }

    /// Advance the accumulator's notion of time (§4.2 "Period trigger").
    ///
    /// Called by the event loop each time the period deadline elapses.
    /// Flushes whatever is pending, then always resets `last_flush_time` —
    /// even when there was nothing to flush — so an idle link never
    /// accumulates one stale timeout credit (§8 Scenario 5).
    pub fn tick(&mut self, now: u64) -> Vec<AccumulatorAction> {
        let mut actions = Vec::new();
        if !self.pending.is_empty() {
            actions.push(self.flush(FlushReason::Period, now));
        } else {
            self.last_flush_time = now;
        }
        actions
    }

    fn flush(&mut self, reason: FlushReason, now: u64) -> AccumulatorAction {
        let mut buf = Vec::with_capacity(self.pending_bytes);
        for payload in &self.pending {
            simplemux_proto::write_payload(&mut buf, payload)
                .expect("payload length was validated when offered");
        }
        let packet_count = self.pending_count();
        self.pending.clear();
        self.pending_bytes = 0;
        self.last_flush_time = now;
        AccumulatorAction::Flush { reason, bundle: Bytes::from(buf), packet_count }
    }
}
