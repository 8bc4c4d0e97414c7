//! Lifecycle actions and the plan artifact that gates them.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Lifecycle Action ───────────────────────────────────────────────────

/// What a run was asked to do. The execution machine uses this to pick
/// its route after planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Synth,
    Diff,
    Deploy,
    Destroy,
}

impl LifecycleAction {
    /// Deploy and destroy mutate real infrastructure and therefore pass
    /// through the approval gate.
    pub fn mutates(&self) -> bool {
        matches!(self, LifecycleAction::Deploy | LifecycleAction::Destroy)
    }
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleAction::Synth => write!(f, "synth"),
            LifecycleAction::Diff => write!(f, "diff"),
            LifecycleAction::Deploy => write!(f, "deploy"),
            LifecycleAction::Destroy => write!(f, "destroy"),
        }
    }
}

// ── Plan Artifact ──────────────────────────────────────────────────────

/// Result of a successful plan phase.
///
/// Exactly one of `plan_file` (local engine) or `remote_run` (workspace
/// service) is populated; apply consumes whichever is present so the
/// mutation executes precisely the changes that were reviewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanArtifact {
    pub stack_name: String,
    /// Human-readable change summary, as produced by the engine.
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_run: Option<String>,
    /// Whether this plan proposes destruction rather than creation.
    pub destroy: bool,
    pub created_at: DateTime<Utc>,
}

impl PlanArtifact {
    pub fn local(
        stack_name: impl Into<String>,
        summary: impl Into<String>,
        plan_file: impl Into<PathBuf>,
        destroy: bool,
    ) -> Self {
        Self {
            stack_name: stack_name.into(),
            summary: summary.into(),
            plan_file: Some(plan_file.into()),
            remote_run: None,
            destroy,
            created_at: Utc::now(),
        }
    }

    pub fn remote(
        stack_name: impl Into<String>,
        summary: impl Into<String>,
        run_id: impl Into<String>,
        destroy: bool,
    ) -> Self {
        Self {
            stack_name: stack_name.into(),
            summary: summary.into(),
            plan_file: None,
            remote_run: Some(run_id.into()),
            destroy,
            created_at: Utc::now(),
        }
    }
}
