//! # taproot-synth
//!
//! Synthesis driver: runs the app's configured synth command and
//! collects the stacks it wrote.
//!
//! The rest of taproot depends only on the [`Synthesizer`] trait;
//! [`CommandSynthesizer`] is the production implementation and
//! [`SimulatedSynthesizer`] the deterministic test double.

#![deny(unsafe_code)]

pub mod command;
pub mod error;
pub mod synthesizer;

// Re-exports
pub use command::{CommandSynthesizer, DEFAULT_OUTPUT_DIR};
pub use error::{SynthError, SynthResult};
pub use synthesizer::{SimulatedSynthesizer, Synthesizer};
