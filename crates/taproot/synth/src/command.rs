//! Synthesis through the app's own synth command.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use taproot_types::Stack;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{SynthError, SynthResult};
use crate::synthesizer::Synthesizer;

/// Directory the synth command is expected to write stacks into,
/// relative to the app directory, unless overridden.
pub const DEFAULT_OUTPUT_DIR: &str = "taproot.out";

/// File inside each stack directory holding the configuration document.
const STACK_DOCUMENT: &str = "stack.json";

// ── Command Synthesizer ────────────────────────────────────────────────

/// Runs the configured synth command through the shell and collects the
/// stacks it wrote.
///
/// Layout contract: every immediate subdirectory of the output
/// directory containing a `stack.json` is one stack, named after the
/// subdirectory. The subdirectory doubles as the stack's working
/// directory for local provisioning. Collection is ordered by name so
/// multi-stack runs are deterministic.
pub struct CommandSynthesizer {
    command: String,
    working_dir: PathBuf,
    output_dir: PathBuf,
}

impl CommandSynthesizer {
    pub fn new(command: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        let output_dir = working_dir.join(DEFAULT_OUTPUT_DIR);
        Self {
            command: command.into(),
            working_dir,
            output_dir,
        }
    }

    /// Override where synthesized stacks are collected from. Relative
    /// paths resolve against the app directory.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        self.output_dir = if output_dir.is_absolute() {
            output_dir
        } else {
            self.working_dir.join(output_dir)
        };
        self
    }

    async fn run_command(&self) -> SynthResult<()> {
        info!(command = %self.command, dir = %self.working_dir.display(), "running synth command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&self.command)
            .current_dir(&self.working_dir)
            .kill_on_drop(true)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|source| SynthError::Spawn {
            command: self.command.clone(),
            source,
        })?;

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(SynthError::CommandFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }

    async fn collect_stacks(&self) -> SynthResult<Vec<Stack>> {
        if !self.output_dir.is_dir() {
            return Err(SynthError::MissingOutputDir(self.output_dir.clone()));
        }

        let mut stacks = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.output_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match read_stack(&path).await? {
                Some(stack) => stacks.push(stack),
                None => debug!(dir = %path.display(), "skipping directory without a stack document"),
            }
        }

        // Directory iteration order is platform-dependent.
        stacks.sort_by(|a, b| a.name.cmp(&b.name));

        if stacks.is_empty() {
            warn!(dir = %self.output_dir.display(), "synth produced no stacks");
        } else {
            info!(count = stacks.len(), "collected synthesized stacks");
        }
        Ok(stacks)
    }
}

async fn read_stack(dir: &Path) -> SynthResult<Option<Stack>> {
    let document = dir.join(STACK_DOCUMENT);
    if !document.is_file() {
        return Ok(None);
    }

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let content =
        tokio::fs::read_to_string(&document)
            .await
            .map_err(|e| SynthError::UnreadableStack {
                dir: dir.to_path_buf(),
                detail: e.to_string(),
            })?;

    Ok(Some(Stack::new(name, content, dir)))
}

#[async_trait]
impl Synthesizer for CommandSynthesizer {
    async fn synth(&self) -> SynthResult<Vec<Stack>> {
        self.run_command().await?;
        self.collect_stacks().await
    }
}
