//! Representation nodes (`Start`, `End`): §4.4.1.

use serde::{Deserialize, Serialize};

use super::NodeBase;
use crate::context::NodeResponse;

/// A Start or End marker node. Carries only `onSuccess`; End nodes leave
/// it unset since they have no outgoing edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepresentationNode {
    /// Shared node fields.
    pub base: NodeBase,
    /// The single successor to move to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<String>,
}

impl RepresentationNode {
    /// Always completes immediately and moves to `onSuccess`, with no
    /// failure path.
    pub fn execute(&self) -> NodeResponse {
        let mut resp = NodeResponse::complete();
        resp.next_node_id = self.on_success.clone();
        resp
    }
}
