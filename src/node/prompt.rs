//! Prompt nodes: collect user input and/or offer actions. See §4.4.3.

use serde::{Deserialize, Serialize};

use super::NodeBase;
use crate::context::{Action, Input, NodeContext, NodeResponse, NodeStatus, ResponseKind};
use crate::meta::MetaStructure;

/// One prompt within a [`PromptNode`]: a set of inputs, optionally gated
/// behind a selectable action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prompt {
    /// Inputs this prompt collects.
    #[serde(default)]
    pub inputs: Vec<Input>,
    /// The action that submits this prompt's inputs, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

/// A node that returns UI-bound inputs/actions and waits for the next
/// request. Carries an ordered list of prompts and an opaque `meta` UI
/// tree surfaced only in verbose mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptNode {
    /// Shared node fields.
    pub base: NodeBase,
    /// The prompts this node offers, in declaration order.
    pub prompts: Vec<Prompt>,
    /// UI component tree, included only when `ctx.verbose` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaStructure>,
}

impl PromptNode {
    /// Run the two-predicate model: `hasAllInputs` gates entry, then a
    /// selected non-empty `currentAction` is matched or rejected
    /// independently of whatever `hasSelectedAction` reported (it only
    /// exists to surface the offered actions on an incomplete response).
    pub fn execute(&self, ctx: &mut NodeContext) -> NodeResponse {
        let mut resp = NodeResponse::default();

        if let Some(reason) = ctx.runtime_data.remove("failureReason") {
            resp.failure_reason = reason;
        }

        let has_all_inputs = self.has_all_inputs(ctx, &mut resp);
        let has_selected_action = self.has_selected_action(ctx, &mut resp);

        if has_all_inputs && ctx.current_action.is_empty() && has_selected_action {
            resp.status = Some(NodeStatus::Complete);
            resp.next_node_id = self.prompts.iter().find_map(|p| p.action.as_ref().map(|a| a.next_node.clone()));
        } else if has_all_inputs && !ctx.current_action.is_empty() {
            if let Some(action) = self.matching_action(&ctx.current_action) {
                resp.status = Some(NodeStatus::Complete);
                resp.next_node_id = Some(action.next_node.clone());
            } else {
                resp.status = Some(NodeStatus::Failure);
                resp.failure_reason = "Invalid action selected".to_string();
            }
        } else {
            resp.status = Some(NodeStatus::Incomplete);
            resp.kind = ResponseKind::View;
            if ctx.verbose {
                resp.meta = self.meta.clone();
            }
        }

        resp
    }

    fn matching_prompt(&self, action_ref: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.action.as_ref().map(|a| a.ref_ == action_ref).unwrap_or(false))
    }

    fn matching_action(&self, action_ref: &str) -> Option<&Action> {
        self.matching_prompt(action_ref).and_then(|p| p.action.as_ref())
    }

    fn has_all_inputs(&self, ctx: &NodeContext, resp: &mut NodeResponse) -> bool {
        let relevant: Vec<&Input> = if !ctx.current_action.is_empty() {
            self.matching_prompt(&ctx.current_action)
                .map(|p| p.inputs.iter().collect())
                .unwrap_or_else(|| self.prompts.iter().flat_map(|p| p.inputs.iter()).collect())
        } else {
            self.prompts.iter().flat_map(|p| p.inputs.iter()).collect()
        };

        let mut all_satisfied = true;
        for input in relevant {
            let satisfied = ctx.user_inputs.contains_key(&input.identifier)
                || ctx.runtime_data.contains_key(&input.identifier);
            if !satisfied {
                if input.required {
                    all_satisfied = false;
                }
                resp.inputs.push(input.clone());
            }
        }
        all_satisfied
    }

    fn has_selected_action(&self, ctx: &NodeContext, resp: &mut NodeResponse) -> bool {
        let actions: Vec<&Action> = self.prompts.iter().filter_map(|p| p.action.as_ref()).collect();

        if actions.is_empty() {
            return true;
        }
        if actions.iter().any(|a| a.ref_ == ctx.current_action) {
            return true;
        }

        resp.actions = actions.into_iter().cloned().collect();
        false
    }
}
