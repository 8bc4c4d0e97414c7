use std::path::PathBuf;

use taproot_types::ErrorKind;
use thiserror::Error;

/// Errors from running the synth command and collecting its output.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("failed to launch synth command '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("synth command exited with status {status}:\n{stderr}")]
    CommandFailed { status: i32, stderr: String },

    #[error("synth command succeeded but produced no output directory at {0}")]
    MissingOutputDir(PathBuf),

    #[error("stack directory {dir} has no readable document: {detail}")]
    UnreadableStack { dir: PathBuf, detail: String },

    #[error("io error while collecting stacks: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SynthError::Spawn { .. } => ErrorKind::Usage,
            SynthError::CommandFailed { .. } => ErrorKind::ExternalTool,
            SynthError::MissingOutputDir(_) => ErrorKind::ExternalTool,
            SynthError::UnreadableStack { .. } => ErrorKind::ExternalTool,
            SynthError::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience type alias for synthesis results.
pub type SynthResult<T> = Result<T, SynthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failure_carries_the_diagnostic() {
        let err = SynthError::CommandFailed {
            status: 2,
            stderr: "TypeError: app.synth is not a function".into(),
        };
        assert!(err.to_string().contains("app.synth is not a function"));
        assert_eq!(err.kind(), ErrorKind::ExternalTool);
    }

    #[test]
    fn spawn_failure_is_a_usage_error() {
        let err = SynthError::Spawn {
            command: "npx ts-node main.ts".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.to_string().contains("npx ts-node main.ts"));
    }
}
