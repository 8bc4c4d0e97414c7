//! Collected stack outputs and construct traceability.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stack::StackDocument;

/// Output values keyed by output name. A `BTreeMap` keeps iteration
/// (and serialization) order stable across runs.
pub type OutputMap = BTreeMap<String, serde_json::Value>;

/// One entry of a document's `output` section. The value itself comes
/// from the engine after apply; the declaration only carries metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDeclaration {
    /// Identifier of the authoring construct that declared this output,
    /// when the synthesizer recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construct_id: Option<String>,
}

/// Re-key collected outputs by the construct that declared them.
///
/// Only outputs whose declaration names a construct appear in the
/// result; everything else stays reachable through the plain name map.
pub fn outputs_by_construct_id(document: &StackDocument, outputs: &OutputMap) -> OutputMap {
    let mut by_construct = OutputMap::new();
    for (name, declaration) in &document.output {
        if let (Some(construct_id), Some(value)) = (&declaration.construct_id, outputs.get(name)) {
            by_construct.insert(construct_id.clone(), value.clone());
        }
    }
    by_construct
}
