//! Decision nodes: branch purely on the caller-selected action. See §4.4.4.
//!
//! A decision node carries no executor; its successor list doubles as the
//! set of valid action ids — the action id IS the next node id.

use serde::{Deserialize, Serialize};

use super::NodeBase;
use crate::context::{Action, NodeContext, NodeResponse, NodeStatus, ResponseKind};

/// A node that offers its successors as actions and advances to whichever
/// one the caller selects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionNode {
    /// Shared node fields.
    pub base: NodeBase,
}

impl DecisionNode {
    /// Prepare-action mode on an empty `currentAction`; otherwise resolve
    /// the selected successor or fail.
    pub fn execute(&self, ctx: &NodeContext) -> crate::Result<NodeResponse> {
        if ctx.current_action.is_empty() {
            if self.base.next_node_ids.is_empty() {
                return Err(crate::FlowError::Internal(format!(
                    "decision node {} has no successors to offer",
                    self.base.id
                )));
            }

            let mut resp = NodeResponse::incomplete(ResponseKind::View);
            resp.actions = self
                .base
                .next_node_ids
                .iter()
                .map(|id| Action { ref_: id.clone(), next_node: id.clone() })
                .collect();
            return Ok(resp);
        }

        if self.base.next_node_ids.is_empty() {
            return Ok(NodeResponse::failure("No next nodes defined"));
        }

        if self.base.next_node_ids.iter().any(|id| id == &ctx.current_action) {
            let mut resp = NodeResponse::complete();
            resp.next_node_id = Some(ctx.current_action.clone());
            return Ok(resp);
        }

        Ok(NodeResponse::failure("No matching next node found for the triggered action ID."))
    }
}
