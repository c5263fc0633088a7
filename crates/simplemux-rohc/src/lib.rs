//! Header-compression adapter for Simplemux.
//!
//! Defines no public interface of its own beyond [`LightweightRohcEngine`]:
//! callers consume it exclusively through `simplemux_core::HeaderCompressor`
//! (§4.6), which keeps the real ROHC engine this stands in for an external
//! collaborator rather than a dependency of the core crate (§1).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod engine;
pub mod profile;

pub use engine::LightweightRohcEngine;
pub use profile::Profile;
