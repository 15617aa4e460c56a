//! The flow execution engine (C9): a resumable, step-wise interpreter.
//! Given a persisted [`NodeContext`] and one batch of user input, it
//! advances the graph as far as it can in a single request and returns
//! either an intermediate directive or a terminal response.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::cache::{CacheError, ContextStore, GraphCache};
use crate::context::{ExecutionRecord, NodeContext, NodeResponse, NodeStatus};
use crate::graph::{Graph, GraphError};

/// Errors raised while stepping a flow.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The requested graph id is not registered.
    #[error("graph not found: {0}")]
    GraphNotFound(String),
    /// The flow id does not correspond to a live, in-progress flow.
    #[error("flow not found: {0}")]
    FlowNotFound(String),
    /// The current node id is not present in its graph.
    #[error("node not found: {0}")]
    NodeNotFound(String),
    /// A per-flow store operation failed.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    /// Graph construction/mutation failed.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

/// Input to one engine step (§4.9).
#[derive(Debug, Clone, Default)]
pub struct StepRequest {
    /// An in-progress flow's id. Absent on the first request for a graph.
    pub flow_id: Option<String>,
    /// The graph to run, when starting a new flow. Ignored when `flow_id`
    /// resolves to an existing flow.
    pub graph_id: String,
    /// This tick's user-supplied batch.
    pub user_inputs: HashMap<String, String>,
    /// The action selected on this tick, if any.
    pub current_action: String,
    /// Whether prompt nodes should include their `meta` UI tree.
    pub verbose: bool,
}

/// Output of one engine step: the response plus the flow id the caller
/// must echo back on the next request.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Assigned or continued flow id.
    pub flow_id: String,
    /// The node response produced by this step.
    pub response: NodeResponse,
}

/// The resumable, step-wise interpreter. Holds the frozen graph registry
/// and the two mutable per-flow stores; carries no other state.
pub struct FlowEngine {
    graphs: HashMap<String, Graph>,
    graph_cache: GraphCache,
    context_store: ContextStore,
}

impl FlowEngine {
    /// Build an engine over an already-loaded set of graphs.
    pub fn new(graphs: HashMap<String, Graph>, graph_cache: GraphCache, context_store: ContextStore) -> Self {
        Self { graphs, graph_cache, context_store }
    }

    /// The per-flow context store backing this engine, for callers that
    /// need to inspect flow state outside of a step (e.g. diagnostics, or
    /// driving [`FlowEngine::sweep_expired`] on a schedule).
    pub fn context_store(&self) -> &ContextStore {
        &self.context_store
    }

    /// The per-flow graph snapshot cache backing this engine.
    pub fn graph_cache(&self) -> &GraphCache {
        &self.graph_cache
    }

    /// Reclaim abandoned flows (D6): sweep expired contexts, then drop the
    /// matching graph snapshot for each one. Intended to run periodically
    /// on the host process, not from within a step. Returns the flow ids
    /// reclaimed.
    pub fn sweep_expired(&self) -> Vec<String> {
        let expired = self.context_store.sweep_expired();
        for flow_id in &expired {
            self.graph_cache.invalidate(flow_id);
        }
        expired
    }

    /// Run one step of the per-request algorithm from §4.9.
    #[instrument(skip(self, request), fields(graph_id = %request.graph_id))]
    pub async fn step(&self, request: StepRequest) -> crate::Result<StepOutcome> {
        let (flow_id, mut ctx, mut graph) = self.resolve_context(&request)?;

        ctx.user_inputs = request.user_inputs;
        ctx.current_action = request.current_action;
        ctx.verbose = request.verbose;

        let mut current_id = ctx.current_node_id.clone();
        let mut step_counter = ctx.execution_history.len() as u64;
        let mut terminated = false;

        let response = loop {
            let node = graph
                .node(&current_id)
                .ok_or_else(|| ExecutionError::NodeNotFound(current_id.clone()))?
                .clone();

            if !node.should_execute(&ctx) {
                let Some(skip_to) = node.condition().map(|c| c.on_skip.clone()) else {
                    break NodeResponse::failure("No skip target defined for unmet condition");
                };
                debug!(node_id = %current_id, skip_to = %skip_to, "condition unmet, skipping node");
                current_id = skip_to;
                continue;
            }

            let resp = node.execute(&mut ctx).await?;

            ctx.runtime_data.extend(resp.runtime_data.clone());
            for (key, value) in &resp.additional_data {
                ctx.node_properties.insert(key.clone(), value.clone());
            }
            if let Some(user) = &resp.authenticated_user {
                ctx.authenticated_user.merge_non_empty(user);
            }

            step_counter += 1;
            ctx.execution_history
                .insert(current_id.clone(), ExecutionRecord { response: resp.clone(), step: step_counter });

            let is_complete = resp.status == Some(NodeStatus::Complete);
            let is_forward = resp.status == Some(NodeStatus::Forward);

            if is_complete && node.is_final() {
                terminated = true;
                break resp;
            }

            if (is_complete || is_forward) && resp.next_node_id.is_some() {
                current_id = resp.next_node_id.clone().unwrap();
                ctx.current_action = String::new();
                continue;
            }

            break resp;
        };

        ctx.current_node_id = current_id;

        // The node that produced `response` only reports the fields it
        // itself resolved (an End node reports none); the caller needs the
        // principal accumulated over the whole tick, not just this node's.
        let mut response = response;
        if ctx.authenticated_user != crate::context::AuthenticatedUser::default() {
            response.authenticated_user = Some(ctx.authenticated_user.clone());
        }

        if terminated {
            self.graph_cache.invalidate(&flow_id);
            self.context_store.invalidate(&flow_id);
        } else {
            self.graph_cache.set(&flow_id, graph)?;
            self.context_store.set(&flow_id, ctx)?;
        }

        Ok(StepOutcome { flow_id, response })
    }

    fn resolve_context(&self, request: &StepRequest) -> crate::Result<(String, NodeContext, Graph)> {
        if let Some(flow_id) = &request.flow_id {
            let ctx = self
                .context_store
                .get(flow_id)?
                .ok_or_else(|| ExecutionError::FlowNotFound(flow_id.clone()))?;
            let graph = self
                .graph_cache
                .get(flow_id)?
                .ok_or_else(|| ExecutionError::GraphNotFound(flow_id.clone()))?;
            return Ok((flow_id.clone(), ctx, graph));
        }

        let graph = self
            .graphs
            .get(&request.graph_id)
            .cloned()
            .ok_or_else(|| ExecutionError::GraphNotFound(request.graph_id.clone()))?;

        let start_id = graph.start_node_id.clone().ok_or_else(|| ExecutionError::GraphNotFound(graph.id.clone()))?;

        let flow_id = Uuid::new_v4().to_string();
        let mut ctx = NodeContext::new(flow_id.clone(), graph.graph_type, String::new());
        ctx.current_node_id = start_id;
        Ok((flow_id, ctx, graph))
    }
}
