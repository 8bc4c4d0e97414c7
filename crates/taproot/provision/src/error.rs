use taproot_types::{ErrorKind, StackError};
use thiserror::Error;

/// Errors from provisioning clients and backend selection.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to launch provisioning engine '{engine}': {source}")]
    Spawn {
        engine: String,
        source: std::io::Error,
    },

    /// An engine phase returned a non-zero result. The diagnostic is
    /// the engine's raw error stream, attached verbatim so callers can
    /// render exactly what the engine said. For the plan phase this
    /// reads "plan errored with: ...".
    #[error("{phase} errored with: \n{diagnostic}")]
    EngineFailed { phase: String, diagnostic: String },

    /// A client was handed a plan artifact without the handle its
    /// variant consumes. The machine guarantees this cannot happen.
    #[error("{phase} invoked without a usable plan handle")]
    MissingPlanHandle { phase: String },

    #[error("engine output was not a JSON object: {0}")]
    MalformedOutput(String),

    #[error("workspace service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProvisionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisionError::Spawn { .. } => ErrorKind::Usage,
            ProvisionError::EngineFailed { .. } => ErrorKind::ExternalTool,
            ProvisionError::MissingPlanHandle { .. } => ErrorKind::Internal,
            ProvisionError::MalformedOutput(_) => ErrorKind::ExternalTool,
            ProvisionError::Http(_) => ErrorKind::ExternalTool,
            ProvisionError::Stack(e) => e.kind(),
            ProvisionError::Io(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn engine_failed(phase: &str, diagnostic: impl Into<String>) -> Self {
        ProvisionError::EngineFailed {
            phase: phase.to_string(),
            diagnostic: diagnostic.into(),
        }
    }
}

/// Convenience type alias for provisioning results.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
