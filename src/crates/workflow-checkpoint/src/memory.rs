//! In-memory checkpoint storage for development and testing
//!
//! [`InMemoryCheckpointStore`] keeps one checkpoint per thread in a
//! `tokio::sync::RwLock<HashMap>`. Replacing a map entry under the write lock
//! is atomic with respect to every reader, and readers receive clones, so a
//! caller can never mutate a stored checkpoint in place.
//!
//! Data is lost when the process exits; use
//! [`FileCheckpointStore`](crate::FileCheckpointStore) for runs that must
//! survive restarts.

use crate::checkpoint::Checkpoint;
use crate::error::{CheckpointError, Result};
use crate::traits::CheckpointStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory checkpoint store
#[derive(Debug)]
pub struct InMemoryCheckpointStore<S> {
    storage: Arc<RwLock<HashMap<String, Checkpoint<S>>>>,
}

impl<S> InMemoryCheckpointStore<S> {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of threads currently stored
    pub async fn thread_count(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Drop every stored thread (useful for test isolation)
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

impl<S> Clone for InMemoryCheckpointStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S> Default for InMemoryCheckpointStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> CheckpointStore<S> for InMemoryCheckpointStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>> {
        let storage = self.storage.read().await;
        Ok(storage.get(thread_id).cloned())
    }

    async fn put(&self, checkpoint: Checkpoint<S>) -> Result<()> {
        if checkpoint.thread_id.is_empty() {
            return Err(CheckpointError::Invalid("thread_id is required".to_string()));
        }

        let mut storage = self.storage.write().await;
        storage.insert(checkpoint.thread_id.clone(), checkpoint);
        Ok(())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.storage.write().await.remove(thread_id);
        Ok(())
    }

    async fn list_threads(&self) -> Result<Vec<String>> {
        Ok(self.storage.read().await.keys().cloned().collect())
    }
}
