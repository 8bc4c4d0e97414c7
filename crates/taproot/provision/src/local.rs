//! Local provisioning through the engine binary.
//!
//! Drives a plan/apply-style CLI (`terraform`-compatible) inside the
//! stack's working directory. Plan output lands in a file the apply
//! phase consumes; apply and destroy stream their stdout line by line
//! into the caller's sink.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use taproot_types::{OutputMap, PlanArtifact, Stack};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::client::{normalize_outputs, ChunkSink, Provisioner};
use crate::error::{ProvisionError, ProvisionResult};

/// Engine binary used when the caller does not configure one.
pub const DEFAULT_ENGINE: &str = "terraform";

/// Where the plan phase writes its artifact, relative to the stack's
/// working directory.
const PLAN_FILE: &str = "plan.out";

// ── Local Provisioner ──────────────────────────────────────────────────

/// One-phase client running the engine binary in the stack directory.
pub struct LocalProvisioner {
    engine: String,
    stack_name: String,
    working_dir: PathBuf,
}

impl LocalProvisioner {
    pub fn new(engine: impl Into<String>, stack: &Stack) -> Self {
        Self {
            engine: engine.into(),
            stack_name: stack.name.clone(),
            working_dir: stack.working_dir.clone(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.engine);
        cmd.args(args)
            .current_dir(&self.working_dir)
            .kill_on_drop(true)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> ProvisionError {
        ProvisionError::Spawn {
            engine: self.engine.clone(),
            source,
        }
    }

    /// Run to completion, returning captured stdout. Non-zero exit
    /// becomes an engine failure carrying stderr.
    async fn run_capturing(&self, phase: &str, args: &[&str]) -> ProvisionResult<String> {
        debug!(engine = %self.engine, stack = %self.stack_name, ?args, "running engine");
        let child = self
            .command(args)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;
        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(ProvisionError::engine_failed(
                phase,
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run to completion, forwarding each stdout line to the sink.
    async fn run_streaming(
        &self,
        phase: &str,
        args: &[&str],
        on_chunk: ChunkSink<'_>,
    ) -> ProvisionResult<()> {
        debug!(engine = %self.engine, stack = %self.stack_name, ?args, "running engine (streaming)");
        let mut child = self
            .command(args)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                on_chunk(&line);
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(ProvisionError::engine_failed(
                phase,
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Provisioner for LocalProvisioner {
    async fn init(&self) -> ProvisionResult<()> {
        self.run_capturing("init", &["init", "-input=false"])
            .await?;
        Ok(())
    }

    async fn plan(&self, destroy: bool) -> ProvisionResult<PlanArtifact> {
        let mut args = vec!["plan", "-input=false", "-out", PLAN_FILE];
        if destroy {
            args.push("-destroy");
        }
        let summary = self.run_capturing("plan", &args).await?;

        info!(stack = %self.stack_name, destroy, "plan computed");
        Ok(PlanArtifact::local(
            self.stack_name.clone(),
            summary,
            self.working_dir.join(PLAN_FILE),
            destroy,
        ))
    }

    async fn apply(&self, plan: &PlanArtifact, on_chunk: ChunkSink<'_>) -> ProvisionResult<()> {
        let plan_file = plan
            .plan_file
            .as_ref()
            .ok_or_else(|| ProvisionError::MissingPlanHandle {
                phase: "apply".into(),
            })?;
        let plan_file = plan_file.to_string_lossy().into_owned();

        self.run_streaming("apply", &["apply", "-input=false", &plan_file], on_chunk)
            .await
    }

    async fn destroy(&self, on_chunk: ChunkSink<'_>) -> ProvisionResult<()> {
        self.run_streaming(
            "destroy",
            &["destroy", "-auto-approve", "-input=false"],
            on_chunk,
        )
        .await
    }

    async fn output(&self) -> ProvisionResult<OutputMap> {
        let stdout = self.run_capturing("output", &["output", "-json"]).await?;
        let raw: serde_json::Value = serde_json::from_str(&stdout)
            .map_err(|e| ProvisionError::MalformedOutput(e.to_string()))?;
        normalize_outputs(raw)
    }
}
