//! The advance loop: run steps, route, persist, stop at interrupts or the end
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!   current = pending ──► None? ──► Completed               │
//!            │                                              │
//!            ├─ interrupt node and not resuming through it  │
//!            │     ──► persist (state, current) ──► Interrupted
//!            │                                              │
//!            └─ run step ──► choose next ──► persist (state, next)
//! ```
//!
//! A checkpoint is written only after a step has fully returned and its
//! successor has been chosen. A failing step, an illegal routing value, or a
//! cancelled call therefore leaves the last good checkpoint in place.

use super::types::{RunStatus, StateSnapshot};
use super::CompiledGraph;
use crate::error::{GraphError, Result};
use crate::graph::{NodeId, END};
use workflow_checkpoint::{Checkpoint, CheckpointMetadata, CheckpointSource, CheckpointStore};

impl<S> CompiledGraph<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Start a new thread or resume an existing one.
    ///
    /// - `Some(state)`: begins thread `thread_id` at the entry node. The id
    ///   must not already exist.
    /// - `None`: loads the thread's checkpoint and continues from its pending
    ///   node.
    ///
    /// Runs until the end node (`Completed`) or until an interrupt node is
    /// reached from an incoming transition (`Interrupted`). When the loaded
    /// checkpoint was parked at an interrupt node, that node's step runs
    /// first instead of pausing again.
    ///
    /// # Errors
    ///
    /// - [`GraphError::ThreadNotFound`] when resuming an unknown thread
    /// - [`GraphError::InvalidState`] when starting under an existing id
    /// - [`GraphError::Routing`] / [`GraphError::NodeExecution`] stop the run;
    ///   the last persisted checkpoint stays intact
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use workflow_checkpoint::InMemoryCheckpointStore;
    /// use workflow_core::{step_fn, RunStatus, StateGraph, END};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> workflow_core::Result<()> {
    /// let mut graph = StateGraph::<u32>::new();
    /// graph
    ///     .add_node("inc", step_fn(|n: u32| async move { Ok(n + 1) }))
    ///     .add_node("approve", step_fn(|n: u32| async move { Ok(n * 10) }))
    ///     .set_entry_point("inc")
    ///     .add_edge("inc", "approve")
    ///     .add_edge("approve", END)
    ///     .interrupt_before(["approve"]);
    ///
    /// let app = graph
    ///     .compile()?
    ///     .with_checkpointer(Arc::new(InMemoryCheckpointStore::new()));
    ///
    /// let paused = app.advance("t-1", Some(1)).await?;
    /// assert_eq!(paused.status, RunStatus::Interrupted);
    /// assert_eq!(paused.values, 2);
    ///
    /// let done = app.advance("t-1", None).await?;
    /// assert_eq!(done.status, RunStatus::Completed);
    /// assert_eq!(done.values, 20);
    /// # Ok(())
    /// # }
    /// ```
    #[tracing::instrument(skip(self, input), fields(thread_id = %thread_id, node_count = self.graph.node_count()))]
    pub async fn advance(&self, thread_id: &str, input: Option<S>) -> Result<StateSnapshot<S>> {
        let store = self.checkpointer()?;
        let _guard = self.locks.lock(thread_id).await;

        let checkpoint = match input {
            Some(state) => {
                if store.get(thread_id).await?.is_some() {
                    return Err(GraphError::InvalidState(format!(
                        "thread '{}' already exists",
                        thread_id
                    )));
                }
                let checkpoint = Checkpoint::new(thread_id, state, Some(self.graph.entry.clone()))
                    .with_metadata(CheckpointMetadata::new(CheckpointSource::Input));
                store.put(checkpoint.clone()).await?;
                tracing::info!(entry = %self.graph.entry, "Started thread");
                checkpoint
            }
            None => store
                .get(thread_id)
                .await?
                .ok_or_else(|| GraphError::ThreadNotFound(thread_id.to_string()))?,
        };

        self.run_from(store.as_ref(), checkpoint).await
    }

    /// Drive execution from a loaded checkpoint. The caller holds the
    /// thread's lock.
    pub(crate) async fn run_from(
        &self,
        store: &dyn CheckpointStore<S>,
        checkpoint: Checkpoint<S>,
    ) -> Result<StateSnapshot<S>> {
        let thread_id = checkpoint.thread_id;
        let mut state = checkpoint.state;
        let mut current = checkpoint.pending_node;
        let mut metadata = checkpoint.metadata;
        // A thread that was explicitly parked runs its pending node even if
        // it is an interrupt node. A loop checkpoint naming an interrupt
        // node was written before the park and must still pause.
        let mut resume_through = metadata.source.is_parked();

        loop {
            let Some(node) = current else {
                tracing::info!(steps = metadata.step, "Thread completed");
                return Ok(StateSnapshot {
                    thread_id,
                    values: state,
                    next: None,
                    status: RunStatus::Completed,
                    metadata,
                });
            };

            if !resume_through && self.interrupt_config.should_interrupt_before(&node) {
                metadata = CheckpointMetadata::new(CheckpointSource::Interrupt).with_step(metadata.step);
                store
                    .put(
                        Checkpoint::new(thread_id.clone(), state.clone(), Some(node.clone()))
                            .with_metadata(metadata.clone()),
                    )
                    .await?;
                tracing::info!(node = %node, "Interrupted before node");
                return Ok(StateSnapshot {
                    thread_id,
                    values: state,
                    next: Some(node),
                    status: RunStatus::Interrupted,
                    metadata,
                });
            }
            resume_through = false;

            let step = self.graph.step(&node)?;
            tracing::debug!(node = %node, "Executing step");
            let state_after = match step.run(state).await {
                Ok(produced) => produced,
                Err(e) => {
                    let e = match e {
                        e @ GraphError::NodeExecution { .. } => e,
                        other => GraphError::node_execution(node.as_str(), other.to_string()),
                    };
                    tracing::error!(node = %node, error = %e, "Step failed; keeping last checkpoint");
                    return Err(e);
                }
            };

            let next = self.next_after(&node, &state_after)?;
            metadata = CheckpointMetadata::new(CheckpointSource::Loop)
                .with_step(metadata.step + 1)
                .with_writer(node.as_str());
            store
                .put(
                    Checkpoint::new(thread_id.clone(), state_after.clone(), next.clone())
                        .with_metadata(metadata.clone()),
                )
                .await?;
            tracing::debug!(
                node = %node,
                next = next.as_deref().unwrap_or(END),
                step = metadata.step,
                "Step persisted"
            );

            state = state_after;
            current = next;
        }
    }

    /// Resolve the successor of `node`; `None` means the end node.
    fn next_after(&self, node: &str, state: &S) -> Result<Option<NodeId>> {
        match self.graph.next_node(node, state) {
            Ok(next) if next == END => Ok(None),
            Ok(next) => Ok(Some(next)),
            Err(e) => {
                tracing::error!(node = %node, error = %e, "Routing failed; keeping last checkpoint");
                Err(e)
            }
        }
    }

    /// Snapshot for an already loaded checkpoint
    pub(crate) fn snapshot_of(&self, checkpoint: Checkpoint<S>) -> StateSnapshot<S> {
        let status = match checkpoint.pending_node.as_deref() {
            None => RunStatus::Completed,
            Some(node) if self.interrupt_config.should_interrupt_before(node) => {
                RunStatus::Interrupted
            }
            Some(_) => RunStatus::Pending,
        };
        StateSnapshot {
            thread_id: checkpoint.thread_id,
            values: checkpoint.state,
            next: checkpoint.pending_node,
            status,
            metadata: checkpoint.metadata,
        }
    }
}
