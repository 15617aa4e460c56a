//! Engine configuration (C12).
//!
//! A plain, serializable settings struct — not a config-file framework.
//! Shaped after the teacher's `ContextConfig`/`RetryConfig` pair: a flat
//! struct of primitives with a hand-written [`Default`], overridable by
//! environment variables at process start.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::loader::{AUTH_FLOW_GRAPH_PREFIX, REGISTRATION_FLOW_GRAPH_PREFIX};

/// Top-level settings for loading flow definitions and running the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory scanned for `*.json` flow definitions at startup.
    pub flow_definitions_dir: String,

    /// Graph id served when a request names no graph explicitly.
    pub default_graph_id: String,

    /// Prefix identifying an authentication graph's id.
    pub auth_flow_graph_prefix: String,

    /// Prefix identifying a synthesized registration graph's id.
    pub registration_flow_graph_prefix: String,

    /// How long an idle flow's context survives before [`crate::engine::FlowEngine::sweep_expired`]
    /// reclaims it.
    pub flow_ttl_secs: u64,
}

impl EngineConfig {
    /// The configured flow time-to-live as a [`Duration`].
    pub fn flow_ttl(&self) -> Duration {
        Duration::from_secs(self.flow_ttl_secs)
    }

    /// Apply `FLOWCRAFT_*` environment overrides on top of `self`, returning
    /// the merged configuration. Unset variables leave the existing value
    /// untouched; a present but unparsable `FLOWCRAFT_FLOW_TTL_SECS` is
    /// ignored rather than failing startup.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("FLOWCRAFT_FLOW_DEFINITIONS_DIR") {
            self.flow_definitions_dir = dir;
        }
        if let Ok(id) = std::env::var("FLOWCRAFT_DEFAULT_GRAPH_ID") {
            self.default_graph_id = id;
        }
        if let Ok(ttl) = std::env::var("FLOWCRAFT_FLOW_TTL_SECS") {
            if let Ok(secs) = ttl.parse() {
                self.flow_ttl_secs = secs;
            }
        }
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flow_definitions_dir: "flows".to_string(),
            default_graph_id: "AUTH_default".to_string(),
            auth_flow_graph_prefix: AUTH_FLOW_GRAPH_PREFIX.to_string(),
            registration_flow_graph_prefix: REGISTRATION_FLOW_GRAPH_PREFIX.to_string(),
            flow_ttl_secs: 1800,
        }
    }
}
