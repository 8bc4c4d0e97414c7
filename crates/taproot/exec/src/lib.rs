//! # taproot-exec
//!
//! The lifecycle state machine. One run walks:
//!
//! ```text
//! idle → synth → diff → (waitingForApproval →) approved → deploy  ─┐
//!                  │                              └──→ destroy ───┤
//!                  │                                              ▼
//!                  └────────→ done          gatherOutput ────→ done
//! ```
//!
//! synth-only and diff-only runs exit early at their phase; any phase
//! failure lands in the terminal error state with the message recorded.
//! Observers consume [`ExecutionSignal`]s from the channel handed to
//! the machine; streamed engine output travels on the same channel so
//! ordering is preserved end to end.

#![deny(unsafe_code)]

pub mod context;
pub mod error;
pub mod machine;
pub mod signal;
pub mod state;

// Re-exports
pub use context::{ContextSnapshot, ExecutionContext};
pub use error::{ExecError, ExecResult};
pub use machine::ExecutionMachine;
pub use signal::{ApprovalDecision, ExecutionSignal, OutputPhase};
pub use state::ExecutionState;
