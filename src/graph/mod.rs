//! The in-memory flow graph (C5): a node map plus adjacency and reverse
//! adjacency keyed by plain node ids — never embedded pointers between
//! nodes, so cloning, serialization, and cache snapshotting stay trivial
//! and cycle-safe (see spec design notes).

pub mod factory;

pub use factory::Factory;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::context::FlowType;
use crate::node::Node;

/// Errors raised while building or mutating a [`Graph`].
#[derive(Error, Debug)]
pub enum GraphError {
    /// An edge referenced an id not present in the node map.
    #[error("edge endpoint not found: {0}")]
    NodeNotFound(String),
    /// The graph has no designated start node.
    #[error("graph has no start node")]
    NoStartNode,
    /// The graph has no node with an empty successor list.
    #[error("graph has no terminal node")]
    NoTerminalNode,
    /// `createNode` was asked for an unrecognized type string.
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),
    /// `cloneNode` was asked to clone into a capability class the source
    /// doesn't support (e.g. an executor-backed node into a representation
    /// node).
    #[error("clone capability mismatch for node {id}: source is {source_kind}, target maps to {target_kind}")]
    CloneCapabilityMismatch {
        /// The node id being cloned.
        id: String,
        /// The source node's capability class.
        source_kind: String,
        /// The capability class the target type string maps to.
        target_kind: String,
    },
}

/// An in-memory flow graph: immutable once installed in a registry, but
/// mutable during construction by the loader/factory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Unique id for this graph.
    pub id: String,
    /// Whether this is an authentication or registration graph.
    #[serde(rename = "type")]
    pub graph_type: FlowType,
    /// All nodes, keyed by id.
    pub nodes: HashMap<String, Node>,
    /// Forward adjacency: source id -> ordered target ids.
    pub adjacency: HashMap<String, Vec<String>>,
    /// Reverse adjacency: target id -> ordered source ids.
    pub reverse_adjacency: HashMap<String, Vec<String>>,
    /// The designated start node's id.
    pub start_node_id: Option<String>,
}

impl Graph {
    /// An empty graph with no nodes.
    pub fn new(id: impl Into<String>, graph_type: FlowType) -> Self {
        Self {
            id: id.into(),
            graph_type,
            nodes: HashMap::new(),
            adjacency: HashMap::new(),
            reverse_adjacency: HashMap::new(),
            start_node_id: None,
        }
    }

    /// Insert a node, replacing any existing node with the same id.
    pub fn add_node(&mut self, node: Node) {
        self.adjacency.entry(node.id().to_string()).or_default();
        self.nodes.insert(node.id().to_string(), node);
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a node by id, mutably.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Add a directed edge, maintaining forward adjacency, reverse
    /// adjacency, and both endpoints' `nextNodeIds`/`previousNodeIds`.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        if !self.nodes.contains_key(from) {
            return Err(GraphError::NodeNotFound(from.to_string()));
        }
        if !self.nodes.contains_key(to) {
            return Err(GraphError::NodeNotFound(to.to_string()));
        }

        let forward = self.adjacency.entry(from.to_string()).or_default();
        if !forward.contains(&to.to_string()) {
            forward.push(to.to_string());
        }
        let backward = self.reverse_adjacency.entry(to.to_string()).or_default();
        if !backward.contains(&from.to_string()) {
            backward.push(from.to_string());
        }

        self.nodes.get_mut(from).unwrap().add_next(to);
        self.nodes.get_mut(to).unwrap().add_previous(from);
        Ok(())
    }

    /// Remove a directed edge, mirroring [`Graph::add_edge`]'s bookkeeping.
    /// A no-op if the edge doesn't exist.
    pub fn remove_edge(&mut self, from: &str, to: &str) {
        if let Some(forward) = self.adjacency.get_mut(from) {
            forward.retain(|id| id != to);
        }
        if let Some(backward) = self.reverse_adjacency.get_mut(to) {
            backward.retain(|id| id != from);
        }
        if let Some(node) = self.nodes.get_mut(from) {
            node.remove_next(to);
        }
        if let Some(node) = self.nodes.get_mut(to) {
            node.remove_previous(from);
        }
    }

    /// Mark `id` as the designated start node. Does not validate that the
    /// id exists; callers are expected to call this only after `add_node`.
    pub fn set_start_node(&mut self, id: impl Into<String>) {
        self.start_node_id = Some(id.into());
    }

    /// The designated start node, if set and present.
    pub fn start_node(&self) -> Option<&Node> {
        self.start_node_id.as_ref().and_then(|id| self.nodes.get(id))
    }

    /// All nodes with no outgoing edges.
    pub fn terminal_nodes(&self) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.is_final()).collect()
    }

    /// Validate the graph invariants from spec §3: every adjacency
    /// endpoint exists, every node's predecessor list mirrors incoming
    /// edges, exactly one start node, at least one terminal node.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (from, targets) in &self.adjacency {
            if !self.nodes.contains_key(from) {
                return Err(GraphError::NodeNotFound(from.clone()));
            }
            for to in targets {
                if !self.nodes.contains_key(to) {
                    return Err(GraphError::NodeNotFound(to.clone()));
                }
            }
        }

        if self.start_node().is_none() {
            return Err(GraphError::NoStartNode);
        }

        if self.terminal_nodes().is_empty() {
            return Err(GraphError::NoTerminalNode);
        }

        Ok(())
    }

    /// Emit the stable debug/audit shape from §4.5.
    pub fn to_debug_json(&self) -> Value {
        let mut node_entries = serde_json::Map::new();
        for (id, node) in &self.nodes {
            let mut entry = serde_json::Map::new();
            entry.insert("type".to_string(), Value::String(node.node_type().to_string()));
            if node.is_start() {
                entry.insert("isStartNode".to_string(), Value::Bool(true));
            }
            if node.is_final() {
                entry.insert("isFinalNode".to_string(), Value::Bool(true));
            }
            entry.insert(
                "nextNodeIds".to_string(),
                Value::Array(node.successors().iter().cloned().map(Value::String).collect()),
            );
            entry.insert(
                "previousNodeIds".to_string(),
                Value::Array(node.predecessors().iter().cloned().map(Value::String).collect()),
            );
            if !node.inputs().is_empty() {
                entry.insert("inputs".to_string(), serde_json::to_value(node.inputs()).unwrap_or(Value::Null));
            }
            if let Node::TaskExecution(t) = node {
                entry.insert("executor".to_string(), Value::String(t.executor_name.clone()));
            }
            if let Some(cond) = node.condition() {
                entry.insert("condition".to_string(), serde_json::to_value(cond).unwrap_or(Value::Null));
            }
            node_entries.insert(id.clone(), Value::Object(entry));
        }

        serde_json::json!({
            "id": self.id,
            "nodes": Value::Object(node_entries),
            "edges": self.adjacency,
            "startNodeId": self.start_node_id,
        })
    }
}
