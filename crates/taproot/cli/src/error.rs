//! CLI error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("no synth command configured; pass --synth-command or set it in taproot.toml")]
    MissingSynthCommand,

    #[error("could not read config {path}: {detail}")]
    Config { path: String, detail: String },

    #[error("{0}")]
    Run(#[from] taproot_project::RunError),
}

pub type CliResult<T> = Result<T, CliError>;
