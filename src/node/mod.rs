//! The four node kinds and the contract shared by all of them.
//!
//! A [`Node`] is a closed tagged sum, not an inheritance hierarchy: the
//! four variants share a [`NodeBase`] record (id, flags, adjacency,
//! inputs, condition) and carry a variant-specific payload. Capability
//! queries ("is this node executor-backed?") match on the tag rather than
//! probing a trait object, per the spec's design note preferring sum
//! types over polymorphism for this closed set.

pub mod decision;
pub mod prompt;
pub mod representation;
pub mod task;

pub use decision::DecisionNode;
pub use prompt::{Prompt, PromptNode};
pub use representation::RepresentationNode;
pub use task::TaskExecutionNode;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{Input, NodeCondition, NodeContext, NodeResponse};
use crate::resolver;

/// Fields common to every node variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeBase {
    /// Stable id, unique within a graph.
    pub id: String,
    /// The JSON type string this node was declared with (e.g. `"PROMPT"`,
    /// `"AUTH_SUCCESS"`). Kept verbatim for serialization and for the
    /// loader's default-executor rules, even where it doesn't map
    /// one-to-one onto a [`Node`] variant.
    pub node_type: String,
    /// Whether this node is the graph's designated start node.
    #[serde(default)]
    pub is_start: bool,
    /// Whether this node has no outgoing edges.
    #[serde(default)]
    pub is_final: bool,
    /// Successor node ids, in edge-addition order.
    #[serde(default)]
    pub next_node_ids: Vec<String>,
    /// Predecessor node ids, mirroring the graph's reverse adjacency.
    #[serde(default)]
    pub previous_node_ids: Vec<String>,
    /// Required inputs declared on this node.
    #[serde(default)]
    pub inputs: Vec<Input>,
    /// Guard evaluated before this node executes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<NodeCondition>,
    /// Free-form properties copied into `ctx.nodeProperties` on execution.
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

impl NodeBase {
    /// Start a bare base record for a node of the given id/type.
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            is_start: false,
            is_final: false,
            next_node_ids: Vec::new(),
            previous_node_ids: Vec::new(),
            inputs: Vec::new(),
            condition: None,
            properties: HashMap::new(),
        }
    }

    /// Append `id` to the successor list unless already present.
    pub fn add_next(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.next_node_ids.contains(&id) {
            self.next_node_ids.push(id);
        }
    }

    /// Append `id` to the predecessor list unless already present.
    pub fn add_previous(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.previous_node_ids.contains(&id) {
            self.previous_node_ids.push(id);
        }
    }

    /// Remove `id` from the successor list; a no-op when absent.
    pub fn remove_next(&mut self, id: &str) {
        self.next_node_ids.retain(|n| n != id);
    }

    /// Remove `id` from the predecessor list; a no-op when absent.
    pub fn remove_previous(&mut self, id: &str) {
        self.previous_node_ids.retain(|n| n != id);
    }
}

/// One node in a flow graph: a closed sum over the four node kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Node {
    /// A Start or End marker node.
    Representation(RepresentationNode),
    /// A node backed by a pluggable [`crate::executor::Executor`].
    TaskExecution(TaskExecutionNode),
    /// A node that collects user input and/or offers actions.
    Prompt(PromptNode),
    /// A node that branches purely on the caller-selected action.
    Decision(DecisionNode),
}

impl Node {
    /// The shared base record, regardless of variant.
    pub fn base(&self) -> &NodeBase {
        match self {
            Node::Representation(n) => &n.base,
            Node::TaskExecution(n) => &n.base,
            Node::Prompt(n) => &n.base,
            Node::Decision(n) => &n.base,
        }
    }

    /// The shared base record, mutably.
    pub fn base_mut(&mut self) -> &mut NodeBase {
        match self {
            Node::Representation(n) => &mut n.base,
            Node::TaskExecution(n) => &mut n.base,
            Node::Prompt(n) => &mut n.base,
            Node::Decision(n) => &mut n.base,
        }
    }

    /// This node's stable id.
    pub fn id(&self) -> &str {
        &self.base().id
    }

    /// The JSON type string this node was declared with.
    pub fn node_type(&self) -> &str {
        &self.base().node_type
    }

    /// Whether this is the graph's designated start node.
    pub fn is_start(&self) -> bool {
        self.base().is_start
    }

    /// Whether this node has no outgoing edges.
    pub fn is_final(&self) -> bool {
        self.base().is_final
    }

    /// Successor node ids.
    pub fn successors(&self) -> &[String] {
        &self.base().next_node_ids
    }

    /// Predecessor node ids.
    pub fn predecessors(&self) -> &[String] {
        &self.base().previous_node_ids
    }

    /// Required inputs declared on this node.
    pub fn inputs(&self) -> &[Input] {
        &self.base().inputs
    }

    /// This node's execution guard, if any.
    pub fn condition(&self) -> Option<&NodeCondition> {
        self.base().condition.as_ref()
    }

    /// Add a successor, deduplicating.
    pub fn add_next(&mut self, id: impl Into<String>) {
        self.base_mut().add_next(id);
    }

    /// Add a predecessor, deduplicating.
    pub fn add_previous(&mut self, id: impl Into<String>) {
        self.base_mut().add_previous(id);
    }

    /// Remove a successor; a no-op when absent.
    pub fn remove_next(&mut self, id: &str) {
        self.base_mut().remove_next(id);
    }

    /// Remove a predecessor; a no-op when absent.
    pub fn remove_previous(&mut self, id: &str) {
        self.base_mut().remove_previous(id);
    }

    /// `true` when there is no condition, or the condition's key resolves
    /// to its expected value.
    pub fn should_execute(&self, ctx: &NodeContext) -> bool {
        match self.condition() {
            None => true,
            Some(cond) => resolver::resolve(Some(ctx), &cond.key) == cond.value,
        }
    }

    /// Run this node against `ctx`, dispatching to the variant's own
    /// execution logic.
    pub async fn execute(&self, ctx: &mut NodeContext) -> crate::Result<NodeResponse> {
        ctx.node_properties = self.base().properties.clone();
        ctx.node_inputs = self.base().inputs.clone();

        match self {
            Node::Representation(n) => Ok(n.execute()),
            Node::TaskExecution(n) => n.execute(ctx).await,
            Node::Prompt(n) => Ok(n.execute(ctx)),
            Node::Decision(n) => n.execute(ctx),
        }
    }
}
