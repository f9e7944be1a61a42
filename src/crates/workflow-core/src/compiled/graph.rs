//! CompiledGraph struct and builder methods

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::interrupt::InterruptConfig;
use std::sync::Arc;
use workflow_checkpoint::{CheckpointStore, ThreadLocks};

/// An executable, validated graph bound to a checkpoint store
///
/// Cloning is cheap; clones share the topology, the store, and the
/// per-thread locks.
pub struct CompiledGraph<S> {
    pub(crate) graph: Arc<Graph<S>>,
    pub(crate) store: Option<Arc<dyn CheckpointStore<S>>>,
    pub(crate) interrupt_config: InterruptConfig,
    pub(crate) locks: ThreadLocks,
}

impl<S> Clone for CompiledGraph<S> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            store: self.store.clone(),
            interrupt_config: self.interrupt_config.clone(),
            locks: self.locks.clone(),
        }
    }
}

impl<S: Send + Sync + 'static> CompiledGraph<S> {
    pub(crate) fn new(graph: Graph<S>, interrupt_config: InterruptConfig) -> Self {
        Self {
            graph: Arc::new(graph),
            store: None,
            interrupt_config,
            locks: ThreadLocks::new(),
        }
    }

    /// Attach the checkpoint store every operation reads and writes
    pub fn with_checkpointer(mut self, store: Arc<dyn CheckpointStore<S>>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn graph(&self) -> &Graph<S> {
        &self.graph
    }

    pub fn interrupt_config(&self) -> &InterruptConfig {
        &self.interrupt_config
    }

    pub(crate) fn checkpointer(&self) -> Result<Arc<dyn CheckpointStore<S>>> {
        self.store.clone().ok_or_else(|| {
            GraphError::Configuration("No checkpoint store configured".to_string())
        })
    }
}

impl<S> std::fmt::Debug for CompiledGraph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("graph", &self.graph)
            .field("has_checkpointer", &self.store.is_some())
            .field("interrupt_config", &self.interrupt_config)
            .finish()
    }
}
