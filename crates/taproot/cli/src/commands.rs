//! Request execution and the approval gate.

use std::sync::Arc;

use taproot_project::{Project, ProjectUpdate, RunError};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::CliResult;
use crate::render;

/// One parsed lifecycle request.
pub enum Request {
    Synth,
    Diff(Option<String>),
    Deploy(String),
    Destroy(String),
}

impl Request {
    fn gated(&self) -> bool {
        matches!(self, Request::Deploy(_) | Request::Destroy(_))
    }
}

/// Drive one request to completion, rendering every update and
/// prompting at the approval gate when the request mutates without
/// auto-approve.
pub async fn run(
    project: Arc<Project>,
    mut updates: mpsc::UnboundedReceiver<ProjectUpdate>,
    request: Request,
    auto_approve: bool,
) -> CliResult<()> {
    let gated = request.gated() && !auto_approve;

    let runner = Arc::clone(&project);
    let mut run = tokio::spawn(async move {
        match request {
            Request::Synth => runner.synth().await,
            Request::Diff(stack) => runner.diff(stack.as_deref()).await,
            Request::Deploy(stack) => runner.deploy(&stack).await,
            Request::Destroy(stack) => runner.destroy(&stack).await,
        }
    });

    let completion = loop {
        tokio::select! {
            Some(update) = updates.recv() => {
                let reached_gate = matches!(update, ProjectUpdate::Diffed { .. });
                render::update(&update);
                if gated && reached_gate {
                    if confirm() {
                        project.approve();
                    } else {
                        render::error("Aborted");
                        project.abort();
                    }
                }
            }
            result = &mut run => break result,
        }
    };

    // The run resolves only after every update was sent, so whatever
    // the select raced past is still buffered.
    while let Ok(update) = updates.try_recv() {
        render::update(&update);
    }

    debug!(status = %project.status(), "request finished");
    completion
        .map_err(|e| RunError::new(format!("execution task failed: {e}")))??;
    Ok(())
}

fn confirm() -> bool {
    dialoguer::Confirm::new()
        .with_prompt("Perform these actions?")
        .default(false)
        .interact()
        .unwrap_or(false)
}
