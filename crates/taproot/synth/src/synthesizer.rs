//! The synthesis seam: trait and simulated implementation.

use async_trait::async_trait;
use taproot_types::Stack;

use crate::error::{SynthError, SynthResult};

// ── Synthesizer Trait ──────────────────────────────────────────────────

/// Turns an authored app into synthesized stacks.
///
/// The execution machine only ever calls [`Synthesizer::synth`]; how
/// the stacks come to exist (a real subprocess, a fixture, a test
/// double) is this trait's business.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synth(&self) -> SynthResult<Vec<Stack>>;
}

// ── Simulated Synthesizer ──────────────────────────────────────────────

/// Deterministic synthesizer for tests: yields a fixed set of stacks
/// or a fixed failure.
pub struct SimulatedSynthesizer {
    outcome: Result<Vec<Stack>, String>,
}

impl SimulatedSynthesizer {
    /// Succeeds with the given stacks.
    pub fn yielding(stacks: Vec<Stack>) -> Self {
        Self {
            outcome: Ok(stacks),
        }
    }

    /// Succeeds with one trivially-documented stack per name.
    pub fn with_stack_names(names: &[&str]) -> Self {
        let stacks = names
            .iter()
            .map(|n| Stack::new(*n, "{}", format!("/tmp/taproot-test/{n}")))
            .collect();
        Self::yielding(stacks)
    }

    /// Fails with the given diagnostic, as a broken app would.
    pub fn failing(diagnostic: impl Into<String>) -> Self {
        Self {
            outcome: Err(diagnostic.into()),
        }
    }
}

#[async_trait]
impl Synthesizer for SimulatedSynthesizer {
    async fn synth(&self) -> SynthResult<Vec<Stack>> {
        match &self.outcome {
            Ok(stacks) => Ok(stacks.clone()),
            Err(diagnostic) => Err(SynthError::CommandFailed {
                status: 1,
                stderr: diagnostic.clone(),
            }),
        }
    }
}
