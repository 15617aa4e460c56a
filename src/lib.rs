//! # flowcraft
//!
//! A declarative flow execution runtime for multi-step authentication and
//! registration journeys (password + OTP, federated login, progressive
//! registration, conditional branching, failure recovery).
//!
//! ## Overview
//!
//! The engine is driven by a typed directed graph of nodes — start/end
//! representation nodes, task-execution nodes backed by a pluggable
//! [`Executor`](executor::Executor), prompt nodes that collect user input,
//! and decision nodes for branching. A [`loader`] builds graphs from
//! declarative JSON and can synthesize a registration graph from an
//! authentication graph by structural rewriting. A resumable
//! [`engine::FlowEngine`] advances the graph one request-batch at a time,
//! returning a view/redirect/retry directive or a terminal completion or
//! failure.
//!
//! ## Key properties
//!
//! - **Graph-based flows**: declarative JSON compiles into an in-memory DAG
//! - **Resumable execution**: flow state is loaded, advanced, and persisted
//!   one HTTP request at a time — no long-lived process per flow
//! - **Pluggable executors**: authentication, OTP, provisioning are external
//!   implementations of a small async trait
//! - **Type safety**: node kinds are a closed sum type, not open inheritance

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use thiserror::Error;

/// Result type for flowcraft operations.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Top-level error type aggregating every subsystem's error enum.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Graph structure error (missing node, duplicate start, dangling edge).
    #[error("graph error: {0}")]
    Graph(#[from] graph::GraphError),

    /// Flow definition loading/validation error.
    #[error("loader error: {0}")]
    Loader(#[from] loader::LoaderError),

    /// Graph cache / flow context store error.
    #[error("cache error: {0}")]
    Cache(#[from] cache::CacheError),

    /// Error raised while stepping a flow through the engine.
    #[error("execution error: {0}")]
    Execution(#[from] engine::ExecutionError),

    /// JSON (de)serialization error surfaced from definition loading.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error for conditions that should not occur in practice.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Placeholder template resolution (`{{ context.key }}`).
pub mod resolver;

/// UI component tree construction for prompt nodes.
pub mod meta;

/// Per-flow mutable state and the executor/node response envelopes.
pub mod context;

/// The executor contract, required-input negotiation, and built-in executors.
pub mod executor;

/// The four node kinds and their shared contract.
pub mod node;

/// The in-memory flow graph and node/graph/executor factory.
pub mod graph;

/// Graph cache and flow context store.
pub mod cache;

/// Flow definition loader and registration-graph synthesis.
pub mod loader;

/// The step-wise flow execution engine.
pub mod engine;

/// Engine configuration: flow definitions directory, default graph id,
/// graph id prefixes, and flow TTL.
pub mod config;
