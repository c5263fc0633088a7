//! Fuzz target for the accumulator/trigger engine.
//!
//! # Strategy
//!
//! Drive `Accumulator::offer` with a sequence of arbitrary payload lengths
//! and a small, arbitrary trigger configuration, advancing a fake clock by
//! an arbitrary step between each offer.
//!
//! # Invariants
//!
//! - `offer` never panics, regardless of payload length or trigger config.
//! - A flushed bundle never exceeds the configured MTU.
//! - `pending_bytes` reported by the accumulator never exceeds the MTU.

#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use simplemux_core::{Accumulator, AccumulatorAction, TriggerConfig};

#[derive(Debug, Arbitrary)]
struct Step {
    payload_len: u16,
    time_step: u16,
}

#[derive(Debug, Arbitrary)]
struct Input {
    n_max: u32,
    size_threshold: u16,
    timeout_micros: u32,
    period_micros: u32,
    mtu: u16,
    steps: Vec<Step>,
}

fuzz_target!(|input: Input| {
    let mtu = (input.mtu as usize).max(1);
    let config = TriggerConfig {
        n_max: input.n_max.max(1),
        size_threshold: input.size_threshold as usize,
        timeout_micros: u64::from(input.timeout_micros),
        period_micros: u64::from(input.period_micros),
        mtu,
    };

    let mut now: u64 = 0;
    let mut acc = Accumulator::new(config, now);

    for step in input.steps.iter().take(200) {
        now += u64::from(step.time_step);
        let payload = Bytes::from(vec![0xAB; step.payload_len as usize]);

        for action in acc.offer(payload, now) {
            if let AccumulatorAction::Flush { bundle, .. } = action {
                assert!(bundle.len() <= mtu, "a flushed bundle must never exceed the configured MTU");
            }
        }

        assert!(acc.pending_bytes() <= mtu, "pending bytes must never exceed the configured MTU");
    }
});
