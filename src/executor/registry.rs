//! A read-only `name -> executor` mapping, frozen after startup.
//!
//! Built once while the loader walks flow definitions and resolves
//! `executor.name` references; never mutated afterward (see spec design
//! note on global state — the loader eager-binds at load time).

use std::collections::HashMap;
use std::sync::Arc;

use super::Executor;

/// The frozen registry consulted by the loader to resolve executor names.
#[derive(Clone)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl ExecutorRegistry {
    /// Start building a registry.
    pub fn builder() -> ExecutorRegistryBuilder {
        ExecutorRegistryBuilder::new()
    }

    /// Look up an executor by the name it was registered under.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Executor>> {
        self.executors.get(name).cloned()
    }

    /// Whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.executors.contains_key(name)
    }
}

/// Accumulates executors before freezing them into an [`ExecutorRegistry`].
#[derive(Default)]
pub struct ExecutorRegistryBuilder {
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl ExecutorRegistryBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self { executors: HashMap::new() }
    }

    /// Register an executor under its own [`Executor::name`].
    pub fn register(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executors.insert(executor.name().to_string(), executor);
        self
    }

    /// Freeze the registry.
    pub fn build(self) -> ExecutorRegistry {
        ExecutorRegistry { executors: self.executors }
    }
}
