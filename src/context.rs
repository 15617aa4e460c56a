//! Per-flow mutable state and the executor/node response envelopes.
//!
//! [`NodeContext`] is passed by mutable reference through the engine step
//! but is logically owned by the flow context store ([`crate::cache`])
//! between steps: no shared mutable state ever crosses flows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::meta::MetaStructure;

/// An input a node or prompt declares it needs from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// Stable UI anchor for this input.
    #[serde(rename = "ref")]
    pub ref_: String,
    /// Context key this input is stored under once supplied.
    pub identifier: String,
    /// Input kind (free-form, interpreted by the caller's UI layer).
    #[serde(rename = "type")]
    pub input_type: String,
    /// Whether the input must be supplied before the node completes.
    pub required: bool,
    /// Enumerated choices, for select-style inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// A user-selectable choice at a prompt node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Stable UI anchor for this action.
    #[serde(rename = "ref")]
    pub ref_: String,
    /// Node id to transition to when this action is selected.
    pub next_node: String,
}

/// Guards whether a node executes on a given tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCondition {
    /// A `{{ context.KEY }}` template (or bare key) resolved against the
    /// flow context.
    pub key: String,
    /// Value the resolved key must equal for the node to execute.
    pub value: String,
    /// Node to jump to when the condition does not hold.
    pub on_skip: String,
}

/// The kind of graph a flow instance is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlowType {
    /// An authentication (login) journey.
    Authentication,
    /// A registration (sign-up) journey.
    Registration,
}

/// The authenticated principal resolved so far during a flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Resolved user id, empty until an executor sets one.
    #[serde(default)]
    pub user_id: String,
    /// Resolved organization unit id.
    #[serde(default)]
    pub organization_unit_id: String,
    /// Whether the flow has fully authenticated this user.
    #[serde(default)]
    pub is_authenticated: bool,
}

impl AuthenticatedUser {
    /// Replace this value field-by-field with `other`, but only for fields
    /// `other` actually set (non-empty / non-default). `is_authenticated`
    /// is OR'd in since it only ever moves from false to true within a flow.
    pub fn merge_non_empty(&mut self, other: &AuthenticatedUser) {
        if !other.user_id.is_empty() {
            self.user_id = other.user_id.clone();
        }
        if !other.organization_unit_id.is_empty() {
            self.organization_unit_id = other.organization_unit_id.clone();
        }
        if other.is_authenticated {
            self.is_authenticated = true;
        }
    }
}

/// Outcome status of an [`crate::executor::Executor`] invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutorStatus {
    /// The executor's unit of work is done.
    Complete,
    /// The executor needs more input from the caller.
    UserInputRequired,
    /// The caller must be redirected to an external URL.
    ExternalRedirection,
    /// The caller should retry the same step.
    Retry,
    /// The executor's unit of work failed.
    Failure,
}

/// The response a pluggable [`crate::executor::Executor`] returns from
/// `execute`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutorResponse {
    /// Outcome status. Absent (`None`) only ever appears transiently while
    /// a response is being assembled; a fully-built response always sets it.
    pub status: Option<ExecutorStatus>,
    /// Machine-readable failure reason; empty string means "no failure".
    #[serde(default)]
    pub failure_reason: String,
    /// Inputs still required from the caller.
    #[serde(default)]
    pub inputs: Vec<Input>,
    /// Executor-specific data to surface to the caller.
    #[serde(default)]
    pub additional_data: HashMap<String, Value>,
    /// Redirect target, set when status is `ExternalRedirection`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// Key/value state the executor wants carried forward in the flow.
    #[serde(default)]
    pub runtime_data: HashMap<String, String>,
    /// Authenticated-user fields resolved by this executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticated_user: Option<AuthenticatedUser>,
    /// Opaque assertion data (e.g. a signed token) produced by the executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion: Option<String>,
}

/// Outcome status of a [`crate::node::Node::execute`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    /// The node is done; the engine should move to its successor.
    Complete,
    /// The node needs more from the caller before it can proceed.
    Incomplete,
    /// The node completed but is handing control to another node within
    /// the same tick (used for `onFailure` forwarding).
    Forward,
    /// The node failed with no handler to recover to.
    Failure,
}

/// The presentation hint accompanying an `Incomplete` [`NodeResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseKind {
    /// No presentation hint.
    None,
    /// The caller should render a view (inputs/actions).
    View,
    /// The caller should redirect the end user.
    Redirection,
    /// The caller should retry the in-flight request.
    Retry,
}

impl Default for ResponseKind {
    fn default() -> Self {
        ResponseKind::None
    }
}

/// What a node's `execute` call (and therefore each engine step) returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeResponse {
    /// Outcome status.
    pub status: Option<NodeStatus>,
    /// Presentation hint for `Incomplete` responses.
    #[serde(default)]
    pub kind: ResponseKind,
    /// Node to move to next, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node_id: Option<String>,
    /// Machine-readable failure reason; empty string means "no failure".
    #[serde(default)]
    pub failure_reason: String,
    /// Inputs still required from the caller.
    #[serde(default)]
    pub inputs: Vec<Input>,
    /// Actions the caller may select from.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Arbitrary data to surface to the caller.
    #[serde(default)]
    pub additional_data: HashMap<String, Value>,
    /// Key/value state accumulated so far in the flow.
    #[serde(default)]
    pub runtime_data: HashMap<String, String>,
    /// Redirect target, set when kind is `Redirection`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// Authenticated-user fields resolved so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticated_user: Option<AuthenticatedUser>,
    /// Opaque assertion data carried through from an executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion: Option<String>,
    /// UI component tree, included only when the flow runs in verbose mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaStructure>,
}

impl NodeResponse {
    /// Build a terminal `Complete` response with no presentation hint.
    pub fn complete() -> Self {
        Self {
            status: Some(NodeStatus::Complete),
            ..Default::default()
        }
    }

    /// Build an `Incomplete` response carrying the given kind.
    pub fn incomplete(kind: ResponseKind) -> Self {
        Self {
            status: Some(NodeStatus::Incomplete),
            kind,
            ..Default::default()
        }
    }

    /// Build a `Failure` response with the given machine-readable reason.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            status: Some(NodeStatus::Failure),
            failure_reason: reason.into(),
            ..Default::default()
        }
    }
}

/// A record of the last response a node produced, kept in
/// [`NodeContext::execution_history`] for introspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// The response the node last produced.
    pub response: NodeResponse,
    /// Monotonic step counter at which this record was written.
    pub step: u64,
}

/// Per-flow mutable state threaded through every engine step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeContext {
    /// The flow this context belongs to.
    pub flow_id: String,
    /// The kind of graph this flow is executing.
    pub flow_type: FlowType,
    /// The application this flow was started for.
    pub app_id: String,
    /// The node the engine will resume at on the next step. Not part of
    /// the original data model's explicit field list, but required to
    /// resume a suspended flow at the right node across requests — see
    /// DESIGN.md.
    #[serde(default)]
    pub current_node_id: String,
    /// The action selected on this tick, if any. Cleared after the first
    /// node executes within a tick.
    #[serde(default)]
    pub current_action: String,
    /// Properties copied from the node currently being executed.
    #[serde(default)]
    pub node_properties: HashMap<String, Value>,
    /// Required inputs declared by the node currently being executed.
    #[serde(default)]
    pub node_inputs: Vec<Input>,
    /// The user-supplied batch for this tick. Not accumulated across ticks.
    #[serde(default)]
    pub user_inputs: HashMap<String, String>,
    /// Engine/executor-written state carried across steps.
    #[serde(default)]
    pub runtime_data: HashMap<String, String>,
    /// The authenticated principal resolved so far.
    #[serde(default)]
    pub authenticated_user: AuthenticatedUser,
    /// The last response produced at each node id visited so far.
    #[serde(default)]
    pub execution_history: HashMap<String, ExecutionRecord>,
    /// Sub-step selector passed to the executor (e.g. "send" / "verify").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor_mode: Option<String>,
    /// Whether prompt nodes should include their `meta` UI tree.
    #[serde(default)]
    pub verbose: bool,
}

impl NodeContext {
    /// Start a fresh context for a new flow instance at its start node.
    pub fn new(flow_id: impl Into<String>, flow_type: FlowType, app_id: impl Into<String>) -> Self {
        Self {
            flow_id: flow_id.into(),
            flow_type,
            app_id: app_id.into(),
            current_node_id: String::new(),
            current_action: String::new(),
            node_properties: HashMap::new(),
            node_inputs: Vec::new(),
            user_inputs: HashMap::new(),
            runtime_data: HashMap::new(),
            authenticated_user: AuthenticatedUser::default(),
            execution_history: HashMap::new(),
            executor_mode: None,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_non_empty_only_overwrites_set_fields() {
        let mut user = AuthenticatedUser {
            user_id: "42".to_string(),
            organization_unit_id: "ou-1".to_string(),
            is_authenticated: false,
        };

        user.merge_non_empty(&AuthenticatedUser {
            user_id: String::new(),
            organization_unit_id: "ou-2".to_string(),
            is_authenticated: true,
        });

        assert_eq!(user.user_id, "42");
        assert_eq!(user.organization_unit_id, "ou-2");
        assert!(user.is_authenticated);
    }

    #[test]
    fn node_response_kind_defaults_to_none() {
        let resp = NodeResponse::complete();
        assert_eq!(resp.kind, ResponseKind::None);
        assert_eq!(resp.status, Some(NodeStatus::Complete));
    }

    #[test]
    fn node_context_starts_with_empty_state() {
        let ctx = NodeContext::new("flow-1", FlowType::Authentication, "app-1");
        assert!(ctx.user_inputs.is_empty());
        assert!(ctx.runtime_data.is_empty());
        assert!(ctx.execution_history.is_empty());
        assert!(!ctx.authenticated_user.is_authenticated);
    }
}
