//! Signals the machine emits and consumes.

use std::fmt;

use crate::context::ContextSnapshot;
use crate::state::ExecutionState;

/// Which streaming phase a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPhase {
    Deploy,
    Destroy,
}

impl fmt::Display for OutputPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deploy => f.write_str("deploy"),
            Self::Destroy => f.write_str("destroy"),
        }
    }
}

/// Everything observable about a run, in the order it happened.
///
/// Transitions and streamed engine output share one channel so
/// consumers see chunks between the entry and exit of the phase that
/// produced them, never reordered around it.
#[derive(Debug, Clone)]
pub enum ExecutionSignal {
    /// The machine moved between states; the snapshot was taken after
    /// the originating phase finished mutating the context.
    Transition {
        from: ExecutionState,
        to: ExecutionState,
        snapshot: ContextSnapshot,
    },
    /// The diff phase picked its stack. Arrives between the entry to
    /// diff and the first planning work, so observers can name the
    /// stack from here on.
    StackResolved { stack_name: String },
    /// One line of engine output from a streaming phase.
    PhaseOutput {
        stack_name: String,
        phase: OutputPhase,
        chunk: String,
    },
}

/// The external answer a run waits for after planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// Proceed with the mutating phase.
    Approved,
    /// Stop the run; not a failure.
    Aborted,
}
