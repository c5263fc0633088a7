//! Fuzz target for the lightweight ROHC engine's decompressor.
//!
//! # Invariants
//!
//! - `decompress` never panics on arbitrary bytes, including an unknown
//!   profile tag, an unknown context id, or a truncated dynamic-fields
//!   section.

#![no_main]

use libfuzzer_sys::fuzz_target;
use simplemux_core::HeaderCompressor;
use simplemux_rohc::LightweightRohcEngine;

fuzz_target!(|data: &[u8]| {
    let mut engine = LightweightRohcEngine::new();
    let _ = engine.decompress(data);
});
