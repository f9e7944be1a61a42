//! Storage abstraction for thread checkpoints
//!
//! The [`CheckpointStore`] trait is the seam between the execution engine and
//! whatever durability backend a deployment chooses. The engine relies on two
//! guarantees only:
//!
//! - **Atomic replacement** - `put` either leaves the previous checkpoint in
//!   place or installs the new one; a reader never observes a torn mix.
//! - **Read-your-writes** - a `get` issued after a successful `put` on the same
//!   store returns the value just written.
//!
//! Serializing concurrent get-then-put sequences on one thread is the caller's
//! job; see [`ThreadLocks`](crate::ThreadLocks).
//!
//! ```text
//! ┌──────────────┐   get(thread)    ┌──────────────────────────┐
//! │  Execution   │ ───────────────▶ │  CheckpointStore<S>      │
//! │  engine      │ ◀─────────────── │   InMemoryCheckpointStore│
//! │              │   put(ckpt)      │   FileCheckpointStore    │
//! └──────────────┘ ───────────────▶ └──────────────────────────┘
//! ```
//!
//! # Implementing a backend
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use workflow_checkpoint::{Checkpoint, CheckpointStore, Result};
//!
//! struct RedisStore { /* ... */ }
//!
//! #[async_trait]
//! impl<S> CheckpointStore<S> for RedisStore
//! where
//!     S: serde::Serialize + serde::de::DeserializeOwned + Send + Sync + 'static,
//! {
//!     async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>> {
//!         // GET key, deserialize
//!         # unimplemented!()
//!     }
//!
//!     async fn put(&self, checkpoint: Checkpoint<S>) -> Result<()> {
//!         // SET key value (single-key writes are atomic)
//!         # unimplemented!()
//!     }
//!
//!     async fn list_threads(&self) -> Result<Vec<String>> {
//!         # unimplemented!()
//!     }
//! }
//! ```

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use async_trait::async_trait;

/// Durable, keyed storage of the latest checkpoint of each thread.
#[async_trait]
pub trait CheckpointStore<S>: Send + Sync {
    /// Load the checkpoint for `thread_id`, or `None` if the thread is unknown.
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>>;

    /// Atomically replace the checkpoint of `checkpoint.thread_id`.
    async fn put(&self, checkpoint: Checkpoint<S>) -> Result<()>;

    /// Remove a thread. Unknown threads are not an error.
    async fn delete_thread(&self, _thread_id: &str) -> Result<()> {
        Ok(())
    }

    /// Ids of every stored thread, in no particular order.
    async fn list_threads(&self) -> Result<Vec<String>>;
}
