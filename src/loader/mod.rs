//! The flow definition loader (C8): parses declarative JSON graph
//! definitions, resolves executors, wires edges, and synthesizes
//! registration graphs from authentication graphs.

pub mod synthesis;

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::context::{Action, FlowType, Input, NodeCondition};
use crate::executor::ExecutorRegistry;
use crate::graph::{Factory, Graph, GraphError};
use crate::meta::MetaStructure;
use crate::node::{Node, Prompt};

/// Errors raised while loading or validating flow definitions.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// The definitions directory could not be read.
    #[error("could not read definitions directory: {0}")]
    DirectoryUnreadable(String),
    /// A `*.json` file failed to parse.
    #[error("{file}: {source}")]
    Parse {
        /// The offending file name.
        file: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// A node's `onFailure` target is not a `PROMPT` node.
    #[error("{graph_id}: node {node_id}'s onFailure target {target} is not a PROMPT node")]
    OnFailureTargetNotPrompt {
        /// The graph being loaded.
        graph_id: String,
        /// The node declaring the bad `onFailure`.
        node_id: String,
        /// The invalid target id.
        target: String,
    },
    /// An executor name referenced by a node is not in the registry.
    #[error("{graph_id}: node {node_id} references unknown executor {name}")]
    UnknownExecutor {
        /// The graph being loaded.
        graph_id: String,
        /// The node declaring the executor.
        node_id: String,
        /// The unresolved executor name.
        name: String,
    },
    /// An edge referenced a node id absent from the file.
    #[error("{graph_id}: edge references unknown node {node_id}")]
    UnknownNodeReference {
        /// The graph being loaded.
        graph_id: String,
        /// The dangling node id.
        node_id: String,
    },
    /// No unique start node could be determined.
    #[error("{0}: could not determine a unique start node")]
    AmbiguousStartNode(String),
    /// The configured default flow id was never loaded successfully.
    #[error("default flow graph {0} was not found among loaded definitions")]
    DefaultFlowMissing(String),
    /// Graph construction failed downstream.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

/// The raw JSON shape of one `*.json` graph definition file (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDefinition {
    /// Graph id.
    pub id: String,
    /// `"AUTHENTICATION"` or `"REGISTRATION"`.
    #[serde(rename = "type")]
    pub graph_type: FlowType,
    /// The nodes making up this graph.
    pub nodes: Vec<NodeDefinition>,
}

/// The raw JSON shape of one node within a [`GraphDefinition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Node id, unique within the file.
    pub id: String,
    /// JSON type string (`"START"`, `"PROMPT"`, `"AUTH_SUCCESS"`, …).
    #[serde(rename = "type")]
    pub node_type: String,
    /// Free-form properties copied into `ctx.nodeProperties`.
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
    /// Successor on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<String>,
    /// Successor a non-empty failure is forwarded to. Must reference a
    /// `PROMPT` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<String>,
    /// Required inputs declared on this node.
    #[serde(default)]
    pub inputs: Vec<Input>,
    /// Prompt actions (`PROMPT` nodes only).
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Execution guard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<NodeCondition>,
    /// Executor reference (`TASK_EXECUTION`/`AUTH_SUCCESS` nodes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<ExecutorRef>,
    /// Prompt UI tree (`PROMPT` nodes only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaStructure>,
}

/// `{"name": "<executorName>"}` within a node definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorRef {
    /// The name to resolve against the [`ExecutorRegistry`].
    pub name: String,
}

/// Non-fatal problems noticed while loading, surfaced for operators
/// instead of aborting the whole load (D5).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The file the diagnostic concerns.
    pub file: String,
    /// Human-readable description.
    pub message: String,
}

/// The result of loading a definitions directory: every graph that parsed
/// and validated, plus diagnostics for files that didn't.
pub struct LoadResult {
    /// Successfully loaded (and registration-synthesized) graphs, keyed by
    /// graph id.
    pub graphs: HashMap<String, Graph>,
    /// Problems noticed with skipped files.
    pub diagnostics: Vec<Diagnostic>,
}

/// Prefix substituted to derive a registration graph id from its source
/// authentication graph id (§6 registry id conventions).
pub const AUTH_FLOW_GRAPH_PREFIX: &str = "AUTH_";
/// See [`AUTH_FLOW_GRAPH_PREFIX`].
pub const REGISTRATION_FLOW_GRAPH_PREFIX: &str = "REGISTRATION_";

/// Derive a registration graph id from an authentication graph id by
/// prefix substitution.
pub fn registration_graph_id(auth_graph_id: &str) -> String {
    match auth_graph_id.strip_prefix(AUTH_FLOW_GRAPH_PREFIX) {
        Some(rest) => format!("{REGISTRATION_FLOW_GRAPH_PREFIX}{rest}"),
        None => format!("{REGISTRATION_FLOW_GRAPH_PREFIX}{auth_graph_id}"),
    }
}

/// Load every `*.json` file in `dir`, validate it, wire it into a [`Graph`],
/// then synthesize registration variants for every authentication graph
/// lacking one. `default_flow_id` must name a graph that loaded
/// successfully, or the whole load fails (startup is fatal without it).
pub fn load_dir(
    dir: &Path,
    registry: &ExecutorRegistry,
    default_flow_id: &str,
) -> Result<LoadResult, LoaderError> {
    let entries = fs::read_dir(dir).map_err(|e| LoaderError::DirectoryUnreadable(e.to_string()))?;

    let mut graphs = HashMap::new();
    let mut diagnostics = Vec::new();

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    paths.sort();

    for path in paths {
        let file_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

        match load_file(&path, registry) {
            Ok(graph) => {
                debug!(graph_id = %graph.id, file = %file_name, "loaded flow graph");
                graphs.insert(graph.id.clone(), graph);
            }
            Err(err) => {
                warn!(file = %file_name, error = %err, "skipping flow definition");
                diagnostics.push(Diagnostic { file: file_name, message: err.to_string() });
            }
        }
    }

    if !graphs.contains_key(default_flow_id) {
        return Err(LoaderError::DefaultFlowMissing(default_flow_id.to_string()));
    }

    let auth_graph_ids: Vec<String> = graphs
        .values()
        .filter(|g| g.graph_type == FlowType::Authentication)
        .map(|g| g.id.clone())
        .collect();

    for auth_id in auth_graph_ids {
        let reg_id = registration_graph_id(&auth_id);
        if graphs.contains_key(&reg_id) {
            continue;
        }
        let auth_graph = graphs.get(&auth_id).expect("just collected id").clone();
        match synthesis::synthesize_registration_graph(&auth_graph, &reg_id) {
            Ok(reg_graph) => {
                debug!(graph_id = %reg_id, source = %auth_id, "synthesized registration graph");
                graphs.insert(reg_id, reg_graph);
            }
            Err(err) => {
                warn!(source = %auth_id, error = %err, "registration synthesis failed");
                diagnostics.push(Diagnostic { file: auth_id, message: err.to_string() });
            }
        }
    }

    Ok(LoadResult { graphs, diagnostics })
}

fn load_file(path: &Path, registry: &ExecutorRegistry) -> Result<Graph, LoaderError> {
    let contents = fs::read_to_string(path).map_err(|e| LoaderError::DirectoryUnreadable(e.to_string()))?;
    let file_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

    let def: GraphDefinition =
        serde_json::from_str(&contents).map_err(|source| LoaderError::Parse { file: file_name, source })?;

    build_graph(def, registry)
}

fn build_graph(def: GraphDefinition, registry: &ExecutorRegistry) -> Result<Graph, LoaderError> {
    let graph_id = def.id.clone();
    let mut graph = Factory::create_graph(&def.id, def.graph_type);

    for node_def in &def.nodes {
        let mut node = Factory::create_node(
            node_def.id.clone(),
            &node_def.node_type,
            node_def.properties.clone(),
            false,
            false,
        )?;

        node.base_mut().inputs = node_def.inputs.clone();
        node.base_mut().condition = node_def.condition.clone();

        match &mut node {
            Node::Representation(rep) => {
                rep.on_success = node_def.on_success.clone();
            }
            Node::TaskExecution(task) => {
                task.on_success = node_def.on_success.clone();
                task.on_failure = node_def.on_failure.clone();

                if let Some(target) = &task.on_failure {
                    let target_is_prompt = def
                        .nodes
                        .iter()
                        .any(|n| &n.id == target && n.node_type == "PROMPT");
                    if !target_is_prompt {
                        return Err(LoaderError::OnFailureTargetNotPrompt {
                            graph_id,
                            node_id: node_def.id.clone(),
                            target: target.clone(),
                        });
                    }
                }

                let executor_name = resolve_executor_name(node_def, &def.graph_type);
                if let Some(name) = executor_name {
                    let executor = registry.get(&name).ok_or_else(|| LoaderError::UnknownExecutor {
                        graph_id: graph_id.clone(),
                        node_id: node_def.id.clone(),
                        name: name.clone(),
                    })?;
                    Factory::bind_executor(&mut node, &name, executor);
                }
            }
            Node::Prompt(prompt) => {
                prompt.meta = node_def.meta.clone();
                if node_def.actions.is_empty() {
                    prompt.prompts = vec![Prompt { inputs: node_def.inputs.clone(), action: None }];
                } else {
                    prompt.prompts = node_def
                        .actions
                        .iter()
                        .map(|action| Prompt { inputs: node_def.inputs.clone(), action: Some(action.clone()) })
                        .collect();
                }
            }
            Node::Decision(_) => {}
        }

        graph.add_node(node);
    }

    let mut edges: Vec<(String, String)> = Vec::new();
    for node_def in &def.nodes {
        if let Some(target) = &node_def.on_success {
            edges.push((node_def.id.clone(), target.clone()));
        }
        if let Some(target) = &node_def.on_failure {
            edges.push((node_def.id.clone(), target.clone()));
        }
        for action in &node_def.actions {
            edges.push((node_def.id.clone(), action.next_node.clone()));
        }
    }

    for (from, to) in edges {
        graph.add_edge(&from, &to).map_err(|_| LoaderError::UnknownNodeReference {
            graph_id: graph_id.clone(),
            node_id: to,
        })?;
    }

    let terminal_ids: Vec<String> = graph
        .nodes
        .iter()
        .filter(|(id, _)| graph.adjacency.get(id.as_str()).map(|v| v.is_empty()).unwrap_or(true))
        .map(|(id, _)| id.clone())
        .collect();
    for id in terminal_ids {
        graph.node_mut(&id).expect("id came from this graph's own nodes").base_mut().is_final = true;
    }

    let start_id = determine_start_node(&def, &graph_id)?;
    graph.node_mut(&start_id).expect("start id came from this graph's own nodes").base_mut().is_start = true;
    graph.set_start_node(start_id);

    Ok(graph)
}

/// Default-executor rule (§4.8): `AUTH_SUCCESS` nodes default to
/// `AuthAssert`. The `UserTypeResolver` default belongs to registration
/// synthesis, not this per-node rule — `START` nodes are representation
/// nodes with no executor field to resolve one into; see
/// `synthesis::splice_user_type_resolver`, which splices a
/// `UserTypeResolver`-bound task node after the start node directly.
fn resolve_executor_name(node_def: &NodeDefinition, _graph_type: &FlowType) -> Option<String> {
    if let Some(ExecutorRef { name }) = &node_def.executor {
        return Some(name.clone());
    }
    if node_def.node_type == "AUTH_SUCCESS" {
        return Some("AuthAssert".to_string());
    }
    None
}

/// Prefer the unique typed `START` node; fall back to the unique node with
/// an empty predecessor list when no typed start node exists (resolved
/// Open Question 1 — see DESIGN.md).
fn determine_start_node(def: &GraphDefinition, graph_id: &str) -> Result<String, LoaderError> {
    let typed_starts: Vec<&NodeDefinition> = def.nodes.iter().filter(|n| n.node_type == "START").collect();
    if typed_starts.len() == 1 {
        return Ok(typed_starts[0].id.clone());
    }

    let incoming: HashMap<&str, usize> = def
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), 0usize))
        .collect();
    let mut incoming = incoming;
    for node in &def.nodes {
        if let Some(target) = &node.on_success {
            *incoming.entry(target.as_str()).or_insert(0) += 1;
        }
        if let Some(target) = &node.on_failure {
            *incoming.entry(target.as_str()).or_insert(0) += 1;
        }
        for action in &node.actions {
            *incoming.entry(action.next_node.as_str()).or_insert(0) += 1;
        }
    }

    let roots: Vec<&String> = def
        .nodes
        .iter()
        .filter(|n| incoming.get(n.id.as_str()).copied().unwrap_or(0) == 0)
        .map(|n| &n.id)
        .collect();

    if roots.len() == 1 {
        Ok(roots[0].clone())
    } else {
        Err(LoaderError::AmbiguousStartNode(graph_id.to_string()))
    }
}
