//! State inspection and external updates (get_state, update_state, resume_with)

use super::{CompiledGraph, StateSnapshot};
use crate::error::{GraphError, Result};
use crate::graph::NodeId;
use workflow_checkpoint::{Checkpoint, CheckpointMetadata, CheckpointSource};

impl<S> CompiledGraph<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Read the latest persisted state of a thread.
    ///
    /// Never runs a step and never writes. Calling it any number of times
    /// returns the same snapshot until another operation persists.
    ///
    /// # Errors
    ///
    /// [`GraphError::ThreadNotFound`] if the thread has no checkpoint.
    pub async fn get_state(&self, thread_id: &str) -> Result<StateSnapshot<S>> {
        let store = self.checkpointer()?;
        let checkpoint = store
            .get(thread_id)
            .await?
            .ok_or_else(|| GraphError::ThreadNotFound(thread_id.to_string()))?;
        Ok(self.snapshot_of(checkpoint))
    }

    /// Rewrite a thread's state in place without running anything.
    ///
    /// The pending node and step count are kept; the checkpoint is
    /// re-stamped with source `update`. A thread updated while parked at an
    /// interrupt node runs that node on the next [`advance`](Self::advance).
    ///
    /// # Errors
    ///
    /// [`GraphError::ThreadNotFound`] if the thread has no checkpoint.
    pub async fn update_state<F>(&self, thread_id: &str, update: F) -> Result<StateSnapshot<S>>
    where
        F: FnOnce(&mut S) + Send,
    {
        let store = self.checkpointer()?;
        let _guard = self.locks.lock(thread_id).await;

        let checkpoint = store
            .get(thread_id)
            .await?
            .ok_or_else(|| GraphError::ThreadNotFound(thread_id.to_string()))?;

        let updated = Self::restamp(checkpoint, |state| {
            update(state);
            Ok(())
        })?;
        store.put(updated.clone()).await?;
        tracing::info!(thread_id = %thread_id, next = ?updated.pending_node, "State updated");

        Ok(self.snapshot_of(updated))
    }

    /// Apply an external update to a thread parked at an interrupt node,
    /// then resume it.
    ///
    /// Checking the position, writing the update, and the resumed run all
    /// happen under the thread's lock, so two concurrent calls for the same
    /// thread cannot both pass the check. The closure receives the parked
    /// node's name and may reject the update by returning an error, in which
    /// case nothing is written.
    ///
    /// # Errors
    ///
    /// - [`GraphError::ThreadNotFound`] if the thread has no checkpoint
    /// - [`GraphError::InvalidState`] if the thread is completed or its
    ///   pending node is not an interrupt node
    /// - any error from the closure or from the resumed run
    #[tracing::instrument(skip(self, update), fields(thread_id = %thread_id))]
    pub async fn resume_with<F>(&self, thread_id: &str, update: F) -> Result<StateSnapshot<S>>
    where
        F: FnOnce(&mut S, &NodeId) -> Result<()> + Send,
    {
        let store = self.checkpointer()?;
        let _guard = self.locks.lock(thread_id).await;

        let checkpoint = store
            .get(thread_id)
            .await?
            .ok_or_else(|| GraphError::ThreadNotFound(thread_id.to_string()))?;

        let parked_at = match checkpoint.pending_node.clone() {
            None => {
                return Err(GraphError::InvalidState(format!(
                    "thread '{}' has already completed",
                    thread_id
                )))
            }
            Some(node) if !self.interrupt_config.should_interrupt_before(&node) => {
                return Err(GraphError::InvalidState(format!(
                    "thread '{}' is not waiting at an interrupt (next node: '{}')",
                    thread_id, node
                )))
            }
            Some(node) => node,
        };

        let updated = Self::restamp(checkpoint, |state| update(state, &parked_at))?;
        store.put(updated.clone()).await?;
        tracing::info!(node = %parked_at, "Update applied; resuming");

        self.run_from(store.as_ref(), updated).await
    }

    fn restamp<F>(checkpoint: Checkpoint<S>, update: F) -> Result<Checkpoint<S>>
    where
        F: FnOnce(&mut S) -> Result<()>,
    {
        let step = checkpoint.metadata.step;
        let mut state = checkpoint.state;
        update(&mut state)?;
        Ok(Checkpoint::new(checkpoint.thread_id, state, checkpoint.pending_node).with_metadata(
            CheckpointMetadata::new(CheckpointSource::Update).with_step(step),
        ))
    }
}
