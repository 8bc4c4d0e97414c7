//! Lifecycle states.

use std::fmt;

/// One run walks these states front to back. `Done` and `Error` are
/// terminal; everything else hands off exactly once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Awaiting the start request.
    Idle,
    /// Invoking the synthesizer.
    Synth,
    /// Planning against the resolved stack.
    Diff,
    /// Suspended until an external approval decision arrives.
    WaitingForApproval,
    /// Plan approved, routing to the mutating phase.
    Approved,
    /// Applying the stored plan.
    Deploy,
    /// Tearing down per the stored destroy plan.
    Destroy,
    /// Collecting engine outputs.
    GatherOutput,
    /// Terminal success.
    Done,
    /// Terminal failure, message recorded in the context.
    Error,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Synth => "synth",
            Self::Diff => "diff",
            Self::WaitingForApproval => "waitingForApproval",
            Self::Approved => "approved",
            Self::Deploy => "deploy",
            Self::Destroy => "destroy",
            Self::GatherOutput => "gatherOutput",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}
