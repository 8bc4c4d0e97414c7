//! Failures a run can hit, folded into one type so every phase's
//! outcome records the same way.

use taproot_provision::ProvisionError;
use taproot_synth::SynthError;
use taproot_types::{ErrorKind, StackError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    /// A phase needed the resolved stack before planning recorded one.
    #[error("Trying to access a stack before it has been resolved")]
    StackUnresolved,

    /// A mutating phase started without a plan in the context.
    #[error("Trying to access the plan before it has been computed")]
    PlanUnavailable,

    /// The machine reached the approval gate with nobody to ask.
    #[error("Waiting for approval without a connected decision channel")]
    ApprovalChannelMissing,

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),
}

impl ExecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StackUnresolved | Self::PlanUnavailable | Self::ApprovalChannelMissing => {
                ErrorKind::Internal
            }
            Self::Stack(e) => e.kind(),
            Self::Synth(e) => e.kind(),
            Self::Provision(e) => e.kind(),
        }
    }
}

pub type ExecResult<T> = Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequencing_faults_are_internal() {
        assert_eq!(ExecError::StackUnresolved.kind(), ErrorKind::Internal);
        assert_eq!(ExecError::PlanUnavailable.kind(), ErrorKind::Internal);
    }

    #[test]
    fn wrapped_errors_keep_their_kind() {
        let err = ExecError::from(StackError::UnknownStack("net".into()));
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(err.to_string(), "Unknown stack: net");
    }
}
