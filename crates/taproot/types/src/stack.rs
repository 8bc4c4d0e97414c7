//! Synthesized stacks and their configuration documents.
//!
//! A stack is the unit everything downstream operates on: one synthesized
//! configuration document plus the directory it was synthesized into. The
//! core treats the document as opaque apart from two sections it reads on
//! demand: the `backend` declaration (provisioner selection) and the
//! `output` declarations (construct traceability).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{StackError, StackResult};
use crate::output::OutputDeclaration;

// ── Stack ──────────────────────────────────────────────────────────────

/// One synthesized stack: name, serialized configuration document, and
/// the working directory the document was written into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    /// Stack name, unique within one synthesis.
    pub name: String,
    /// The configuration document, serialized as JSON.
    pub content: String,
    /// Directory holding the synthesized document. Local provisioning
    /// runs the engine here.
    pub working_dir: PathBuf,
}

impl Stack {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Parse the sections of the configuration document the core reads.
    pub fn document(&self) -> StackResult<StackDocument> {
        serde_json::from_str(&self.content).map_err(|e| StackError::MalformedDocument {
            name: self.name.clone(),
            detail: e.to_string(),
        })
    }
}

impl std::fmt::Display for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

// ── Configuration Document View ────────────────────────────────────────

/// The subset of a configuration document taproot interprets. Unknown
/// sections (resources, providers, variables) pass through untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StackDocument {
    #[serde(default)]
    pub backend: Option<BackendBlock>,
    #[serde(default)]
    pub output: BTreeMap<String, OutputDeclaration>,
}

impl StackDocument {
    /// The remote backend declaration, if the document carries a
    /// complete one. Partial or unrecognized declarations select the
    /// local variant, matching the absent-backend case.
    pub fn remote_backend(&self) -> Option<RemoteBackend> {
        self.backend.as_ref().and_then(BackendBlock::remote)
    }
}

/// The `backend` section. Only the `remote` flavor is interpreted;
/// every other backend type provisions locally.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendBlock {
    #[serde(default)]
    remote: Option<serde_json::Value>,
}

impl BackendBlock {
    pub fn remote(&self) -> Option<RemoteBackend> {
        self.remote
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// A fully specified remote workspace declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBackend {
    /// Hostname of the workspace service, e.g. `runs.example.com`.
    /// The client always speaks https to it.
    pub host: String,
    pub organization: String,
    pub workspace: String,
}
