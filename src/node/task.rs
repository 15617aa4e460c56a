//! Task-execution nodes: delegate to a bound [`crate::executor::Executor`]
//! and translate its response into a [`NodeResponse`]. See §4.4.2.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::NodeBase;
use crate::context::{ExecutorStatus, NodeResponse, NodeStatus, ResponseKind};
use crate::executor::Executor;

/// A node backed by a pluggable executor (authenticators, OTP senders,
/// provisioners, the `UserTypeResolver`, …).
#[derive(Clone, Serialize, Deserialize)]
pub struct TaskExecutionNode {
    /// Shared node fields.
    pub base: NodeBase,
    /// The name this node's executor was declared under in the JSON
    /// definition; resolved against the executor registry by the loader.
    pub executor_name: String,
    /// The bound executor. Never serialized: it is re-resolved from the
    /// registry by name whenever a node is reconstructed.
    #[serde(skip)]
    pub executor: Option<Arc<dyn Executor>>,
    /// Successor on a `Complete` outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<String>,
    /// Successor a non-empty failure is forwarded to (must be a `PROMPT`
    /// node per the loader's validation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<String>,
    /// Sub-step selector passed through to the executor (e.g. `"send"` /
    /// `"verify"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl std::fmt::Debug for TaskExecutionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutionNode")
            .field("base", &self.base)
            .field("executor_name", &self.executor_name)
            .field("on_success", &self.on_success)
            .field("on_failure", &self.on_failure)
            .field("mode", &self.mode)
            .finish()
    }
}

impl TaskExecutionNode {
    /// Invoke the bound executor and translate its response.
    #[instrument(skip(self, ctx), fields(node_id = %self.base.id, executor = %self.executor_name))]
    pub async fn execute(&self, ctx: &mut crate::context::NodeContext) -> crate::Result<NodeResponse> {
        let Some(executor) = &self.executor else {
            warn!("no executor bound");
            return Err(crate::FlowError::Internal(format!(
                "node {} has no executor bound for name {}",
                self.base.id, self.executor_name
            )));
        };

        ctx.executor_mode = self.mode.clone();

        let exec_resp = executor.execute(ctx).await?;
        debug!(status = ?exec_resp.status, "executor returned");

        ctx.runtime_data.extend(exec_resp.runtime_data.clone());
        if let Some(user) = &exec_resp.authenticated_user {
            ctx.authenticated_user.merge_non_empty(user);
        }

        let mut resp = translate(&exec_resp);

        if resp.status == Some(NodeStatus::Complete) {
            if let Some(next) = &self.on_success {
                resp.next_node_id = Some(next.clone());
            }
        }

        if !resp.failure_reason.is_empty() {
            if let Some(handler) = &self.on_failure {
                debug!(failure_reason = %resp.failure_reason, handler = %handler, "forwarding failure");
                resp.status = Some(NodeStatus::Forward);
                resp.next_node_id = Some(handler.clone());
                resp.runtime_data.insert("failureReason".to_string(), resp.failure_reason.clone());
            }
        }

        Ok(resp)
    }
}

/// The fixed `ExecutorResponse.status -> NodeResponse` mapping from §4.4.2.
fn translate(exec_resp: &crate::context::ExecutorResponse) -> NodeResponse {
    let (status, kind) = match exec_resp.status {
        Some(ExecutorStatus::Complete) => (NodeStatus::Complete, ResponseKind::None),
        Some(ExecutorStatus::UserInputRequired) => (NodeStatus::Incomplete, ResponseKind::View),
        Some(ExecutorStatus::ExternalRedirection) => (NodeStatus::Incomplete, ResponseKind::Redirection),
        Some(ExecutorStatus::Retry) => (NodeStatus::Incomplete, ResponseKind::Retry),
        Some(ExecutorStatus::Failure) => (NodeStatus::Failure, ResponseKind::None),
        None => (NodeStatus::Incomplete, ResponseKind::None),
    };

    NodeResponse {
        status: Some(status),
        kind,
        next_node_id: None,
        failure_reason: exec_resp.failure_reason.clone(),
        inputs: exec_resp.inputs.clone(),
        actions: Vec::new(),
        additional_data: exec_resp.additional_data.clone(),
        runtime_data: exec_resp.runtime_data.clone(),
        redirect_url: exec_resp.redirect_url.clone(),
        authenticated_user: exec_resp.authenticated_user.clone(),
        assertion: exec_resp.assertion.clone(),
        meta: None,
    }
}
