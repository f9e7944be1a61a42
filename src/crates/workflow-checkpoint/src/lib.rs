//! # workflow-checkpoint - Durable thread state for resumable workflows
//!
//! A workflow *thread* is one execution of a step graph. After every step the
//! engine persists a [`Checkpoint`]: the full state plus the name of the next
//! node to run. A thread parked at a human-review step may sit for days and
//! across process restarts; reloading its checkpoint resumes it without
//! re-running any completed step.
//!
//! ## Core pieces
//!
//! - [`Checkpoint`] / [`CheckpointMetadata`] - the persisted record
//! - [`CheckpointStore`] - async storage trait (`get`, `put`, `delete_thread`, `list_threads`)
//! - [`InMemoryCheckpointStore`] - process-local store for tests and development
//! - [`FileCheckpointStore`] - one file per thread, atomic temp-file-and-rename writes
//! - [`ThreadLocks`] - per-thread async mutexes that serialize read-modify-write cycles
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use workflow_checkpoint::{Checkpoint, CheckpointStore, InMemoryCheckpointStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryCheckpointStore::new();
//!     store.put(Checkpoint::new("thread-123", 0u64, Some("fetch".to_string()))).await?;
//!
//!     let cp = store.get("thread-123").await?.expect("just written");
//!     assert_eq!(cp.pending_node.as_deref(), Some("fetch"));
//!     Ok(())
//! }
//! ```

pub mod checkpoint;
pub mod error;
pub mod file;
pub mod lock;
pub mod memory;
pub mod serializer;
pub mod traits;

pub use checkpoint::{Checkpoint, CheckpointMetadata, CheckpointSource, CHECKPOINT_VERSION};
pub use error::{CheckpointError, Result};
pub use file::FileCheckpointStore;
pub use lock::{ThreadGuard, ThreadLocks};
pub use memory::InMemoryCheckpointStore;
pub use serializer::{JsonSerializer, SerializerProtocol};
pub use traits::CheckpointStore;
