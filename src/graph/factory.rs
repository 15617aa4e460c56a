//! Node/graph construction and deep-clone (C6).

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::{Graph, GraphError};
use crate::context::FlowType;
use crate::executor::Executor;
use crate::node::{DecisionNode, Node, NodeBase, Prompt, PromptNode, RepresentationNode, TaskExecutionNode};

/// A coarse capability class used to detect clone mismatches: whether a
/// node carries executor-backed fields, representation fields, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capability {
    Representation,
    TaskExecution,
    Prompt,
    Decision,
}

impl Capability {
    fn label(self) -> &'static str {
        match self {
            Capability::Representation => "representation",
            Capability::TaskExecution => "task-execution",
            Capability::Prompt => "prompt",
            Capability::Decision => "decision",
        }
    }
}

/// Builds nodes, graphs, and executor-bound clones.
pub struct Factory;

impl Factory {
    /// Map a JSON type string to the node variant it constructs.
    fn capability_for(type_str: &str) -> Result<Capability, GraphError> {
        match type_str {
            "START" | "END" => Ok(Capability::Representation),
            "TASK_EXECUTION" | "AUTH_SUCCESS" => Ok(Capability::TaskExecution),
            "PROMPT" => Ok(Capability::Prompt),
            "DECISION" => Ok(Capability::Decision),
            other => Err(GraphError::UnknownNodeType(other.to_string())),
        }
    }

    /// Construct a node of the given type. Rejects empty or unknown type
    /// strings.
    pub fn create_node(
        id: impl Into<String>,
        type_str: &str,
        properties: HashMap<String, serde_json::Value>,
        is_start: bool,
        is_final: bool,
    ) -> Result<Node, GraphError> {
        if type_str.is_empty() {
            return Err(GraphError::UnknownNodeType(String::new()));
        }

        let id = id.into();
        let capability = Self::capability_for(type_str)?;

        let mut base = NodeBase::new(id, type_str);
        base.is_start = is_start;
        base.is_final = is_final;
        base.properties = properties;

        Ok(match capability {
            Capability::Representation => {
                Node::Representation(RepresentationNode { base, on_success: None })
            }
            Capability::TaskExecution => Node::TaskExecution(TaskExecutionNode {
                base,
                executor_name: String::new(),
                executor: None,
                on_success: None,
                on_failure: None,
                mode: None,
            }),
            Capability::Prompt => Node::Prompt(PromptNode { base, prompts: Vec::new(), meta: None }),
            Capability::Decision => Node::Decision(DecisionNode { base }),
        })
    }

    /// Construct an empty graph. Assigns a fresh id when `id` is empty and
    /// defaults `graph_type` to `Authentication` — callers pass an already
    /// resolved [`FlowType`], so the latter default lives in the loader.
    pub fn create_graph(id: &str, graph_type: FlowType) -> Graph {
        let id = if id.is_empty() { Uuid::new_v4().to_string() } else { id.to_string() };
        Graph::new(id, graph_type)
    }

    /// Deep-clone a node into a fresh copy under the same id: properties,
    /// inputs, successor/predecessor lists, condition, and variant-specific
    /// fields. The clone and the source share no mutable state.
    pub fn clone_node(node: &Node) -> Result<Node, GraphError> {
        let source_capability = match node {
            Node::Representation(_) => Capability::Representation,
            Node::TaskExecution(_) => Capability::TaskExecution,
            Node::Prompt(_) => Capability::Prompt,
            Node::Decision(_) => Capability::Decision,
        };

        let target_capability = Self::capability_for(node.node_type())?;
        if target_capability != source_capability {
            return Err(GraphError::CloneCapabilityMismatch {
                id: node.id().to_string(),
                source_kind: source_capability.label().to_string(),
                target_kind: target_capability.label().to_string(),
            });
        }

        Ok(node.clone())
    }

    /// Clone every node in `nodes`. An empty map clones to an empty map.
    pub fn clone_nodes(nodes: &HashMap<String, Node>) -> Result<HashMap<String, Node>, GraphError> {
        nodes
            .iter()
            .map(|(id, node)| Self::clone_node(node).map(|cloned| (id.clone(), cloned)))
            .collect()
    }

    /// Bind a resolved executor onto a task-execution node in place.
    pub fn bind_executor(node: &mut Node, executor_name: &str, executor: Arc<dyn Executor>) {
        if let Node::TaskExecution(t) = node {
            t.executor_name = executor_name.to_string();
            t.executor = Some(executor);
        }
    }
}
