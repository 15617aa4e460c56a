//! Mutable per-flow stores: the graph cache (C7) and the flow context
//! store (D4). Both are many-writer/many-reader, keyed by `flowID`,
//! backed by [`dashmap::DashMap`] — unlike the frozen
//! [`crate::executor::ExecutorRegistry`], these are genuinely mutated
//! throughout a flow's lifetime, so a sharded concurrent map is the right
//! tool (grounded on the teacher's `MemoryCheckpointer`).

use std::time::{Duration, Instant};

use dashmap::DashMap;
use thiserror::Error;

use crate::context::NodeContext;
use crate::graph::Graph;

/// Errors raised by the per-flow stores.
#[derive(Error, Debug)]
pub enum CacheError {
    /// `get`/`set` was called with an empty flow id.
    #[error("flow id must not be empty")]
    EmptyFlowId,
}

/// Per-flow graph snapshot keyed by flow id (C7).
///
/// `get`/`set` reject an empty `flowID` with [`CacheError::EmptyFlowId`];
/// `invalidate` is a no-op on an empty or absent id.
#[derive(Clone, Default)]
pub struct GraphCache {
    snapshots: DashMap<String, Graph>,
}

impl GraphCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self { snapshots: DashMap::new() }
    }

    /// Look up the graph snapshot for `flow_id`.
    pub fn get(&self, flow_id: &str) -> Result<Option<Graph>, CacheError> {
        if flow_id.is_empty() {
            return Err(CacheError::EmptyFlowId);
        }
        Ok(self.snapshots.get(flow_id).map(|entry| entry.value().clone()))
    }

    /// Store a graph snapshot for `flow_id`, replacing any prior value.
    pub fn set(&self, flow_id: &str, graph: Graph) -> Result<(), CacheError> {
        if flow_id.is_empty() {
            return Err(CacheError::EmptyFlowId);
        }
        self.snapshots.insert(flow_id.to_string(), graph);
        Ok(())
    }

    /// Remove the snapshot for `flow_id`, if any. A no-op when absent.
    pub fn invalidate(&self, flow_id: &str) {
        self.snapshots.remove(flow_id);
    }
}

/// An entry in the [`ContextStore`], carrying the expiry deadline
/// alongside the context itself so [`ContextStore::sweep_expired`] can
/// reclaim abandoned flows without a separate index.
struct ContextEntry {
    context: NodeContext,
    expires_at: Instant,
}

/// Per-flow mutable [`NodeContext`] store, keyed by flow id (D4).
///
/// Parallel in shape to [`GraphCache`] — both are many-writer/many-reader
/// DashMap-backed stores that own per-flow state between engine steps, per
/// spec §9's "shared resources" note on the graph cache.
#[derive(Clone)]
pub struct ContextStore {
    entries: DashMap<String, ContextEntry>,
    ttl: Duration,
}

impl ContextStore {
    /// A store whose entries expire `ttl` after their last write.
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl }
    }

    /// Look up the context for `flow_id`.
    pub fn get(&self, flow_id: &str) -> Result<Option<NodeContext>, CacheError> {
        if flow_id.is_empty() {
            return Err(CacheError::EmptyFlowId);
        }
        Ok(self.entries.get(flow_id).map(|entry| entry.context.clone()))
    }

    /// Store a context for `flow_id`, refreshing its expiry deadline.
    pub fn set(&self, flow_id: &str, context: NodeContext) -> Result<(), CacheError> {
        if flow_id.is_empty() {
            return Err(CacheError::EmptyFlowId);
        }
        self.entries.insert(flow_id.to_string(), ContextEntry { context, expires_at: Instant::now() + self.ttl });
        Ok(())
    }

    /// Remove the context for `flow_id`, if any. A no-op when absent.
    pub fn invalidate(&self, flow_id: &str) {
        self.entries.remove(flow_id);
    }

    /// Remove every entry whose expiry deadline has passed. Returns the
    /// removed flow ids so callers can also drop the matching graph
    /// snapshot; invoked periodically by the host process (D6), not by the
    /// engine itself.
    pub fn sweep_expired(&self) -> Vec<String> {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.expires_at <= now)
            .map(|entry| entry.key().clone())
            .collect();

        for id in &expired {
            self.entries.remove(id);
        }
        expired
    }
}
