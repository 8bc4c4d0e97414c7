//! Error taxonomy shared across the taproot crates.
//!
//! Every failure surfaced by the core falls into one of three kinds:
//! usage errors are shown to the caller verbatim, internal errors point
//! at a sequencing fault inside taproot itself, and external-tool errors
//! carry a diagnostic produced by the provisioning engine.

use thiserror::Error;

// ── Error Kind ─────────────────────────────────────────────────────────

/// Classification of a failure, independent of which crate raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller asked for something the current state cannot satisfy.
    /// The message is safe to show verbatim.
    Usage,
    /// A sequencing fault inside taproot. If one of these surfaces, a
    /// precondition the core maintains was violated.
    Internal,
    /// The provisioning engine reported a failure; the message embeds
    /// its diagnostic output.
    ExternalTool,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Usage => write!(f, "usage"),
            ErrorKind::Internal => write!(f, "internal"),
            ErrorKind::ExternalTool => write!(f, "external-tool"),
        }
    }
}

// ── Stack Errors ───────────────────────────────────────────────────────

/// Errors raised while resolving or reading stacks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StackError {
    #[error("Trying to access a stack before it has been synthesized")]
    NotYetSynthesized,

    #[error("Unknown stack: {0}")]
    UnknownStack(String),

    #[error("Please select a stack to use")]
    StackSelectionRequired,

    #[error("stack '{name}' has an unreadable configuration document: {detail}")]
    MalformedDocument { name: String, detail: String },
}

impl StackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StackError::NotYetSynthesized => ErrorKind::Internal,
            StackError::UnknownStack(_) => ErrorKind::Usage,
            StackError::StackSelectionRequired => ErrorKind::Usage,
            StackError::MalformedDocument { .. } => ErrorKind::ExternalTool,
        }
    }
}

/// Convenience type alias for stack results.
pub type StackResult<T> = Result<T, StackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_messages_are_verbatim() {
        assert_eq!(
            StackError::NotYetSynthesized.to_string(),
            "Trying to access a stack before it has been synthesized"
        );
        assert_eq!(
            StackError::UnknownStack("web".into()).to_string(),
            "Unknown stack: web"
        );
        assert_eq!(
            StackError::StackSelectionRequired.to_string(),
            "Please select a stack to use"
        );
    }

    #[test]
    fn kinds_match_taxonomy() {
        assert_eq!(StackError::NotYetSynthesized.kind(), ErrorKind::Internal);
        assert_eq!(StackError::UnknownStack("x".into()).kind(), ErrorKind::Usage);
        assert_eq!(
            StackError::StackSelectionRequired.kind(),
            ErrorKind::Usage
        );
    }
}
