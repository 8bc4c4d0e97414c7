//! The closed progress vocabulary callers consume.

use serde::{Deserialize, Serialize};
use taproot_types::{OutputMap, PlanArtifact, Stack};

/// One observable milestone of a run.
///
/// Wire form is tagged by `type`. A full deploy run emits, in order:
/// `synthing`, `synthed`, `diffing`, `diffed`, `deploying`, zero or
/// more `deploy update`s, `deployed`. Destroy mirrors it with
/// `destroying`/`destroy update`/`destroyed`, and `destroyed` carries
/// no output map. Diff runs stop after `diffed`, synth runs after
/// `synthed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProjectUpdate {
    #[serde(rename = "synthing")]
    Synthing,
    #[serde(rename = "synthed", rename_all = "camelCase")]
    Synthed {
        stacks: Vec<Stack>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_message: Option<String>,
    },
    #[serde(rename = "diffing", rename_all = "camelCase")]
    Diffing { stack_name: String },
    #[serde(rename = "diffed", rename_all = "camelCase")]
    Diffed {
        stack_name: String,
        plan: PlanArtifact,
    },
    #[serde(rename = "deploying", rename_all = "camelCase")]
    Deploying { stack_name: String },
    #[serde(rename = "deploy update", rename_all = "camelCase")]
    DeployUpdate {
        stack_name: String,
        deploy_output: String,
    },
    #[serde(rename = "deployed", rename_all = "camelCase")]
    Deployed {
        stack_name: String,
        outputs: OutputMap,
        outputs_by_construct_id: OutputMap,
    },
    #[serde(rename = "destroying", rename_all = "camelCase")]
    Destroying { stack_name: String },
    #[serde(rename = "destroy update", rename_all = "camelCase")]
    DestroyUpdate {
        stack_name: String,
        destroy_output: String,
    },
    #[serde(rename = "destroyed", rename_all = "camelCase")]
    Destroyed { stack_name: String },
}

impl ProjectUpdate {
    /// The wire tag, handy for filtering and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProjectUpdate::Synthing => "synthing",
            ProjectUpdate::Synthed { .. } => "synthed",
            ProjectUpdate::Diffing { .. } => "diffing",
            ProjectUpdate::Diffed { .. } => "diffed",
            ProjectUpdate::Deploying { .. } => "deploying",
            ProjectUpdate::DeployUpdate { .. } => "deploy update",
            ProjectUpdate::Deployed { .. } => "deployed",
            ProjectUpdate::Destroying { .. } => "destroying",
            ProjectUpdate::DestroyUpdate { .. } => "destroy update",
            ProjectUpdate::Destroyed { .. } => "destroyed",
        }
    }
}
