//! The checkpoint record persisted for every workflow thread.
//!
//! A thread has exactly one live [`Checkpoint`]: the most recently completed
//! state plus the name of the node scheduled to run next. Stores replace it
//! wholesale; there is no partial update and no history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current checkpoint format version.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Where a checkpoint came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSource {
    /// First checkpoint of a new thread, written before any node runs
    Input,
    /// Written after a node finished and the next node was chosen
    Loop,
    /// Written when execution parked in front of an interrupt node
    Interrupt,
    /// Written by an external state update (e.g. human feedback)
    Update,
}

impl CheckpointSource {
    /// Whether the thread was explicitly parked and may be resumed through
    /// its pending node.
    pub fn is_parked(self) -> bool {
        matches!(self, CheckpointSource::Interrupt | CheckpointSource::Update)
    }
}

/// Metadata associated with a checkpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckpointMetadata {
    /// The source of the checkpoint
    pub source: CheckpointSource,

    /// Number of node executions completed on this thread so far
    pub step: u64,

    /// Node whose execution produced the stored state, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<String>,

    /// When the checkpoint was written
    pub ts: DateTime<Utc>,
}

impl CheckpointMetadata {
    /// Create metadata for the given source at step 0
    pub fn new(source: CheckpointSource) -> Self {
        Self {
            source,
            step: 0,
            writer: None,
            ts: Utc::now(),
        }
    }

    /// Set the step number
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    /// Set the node that produced the state
    pub fn with_writer(mut self, writer: impl Into<String>) -> Self {
        self.writer = Some(writer.into());
        self
    }
}

impl Default for CheckpointMetadata {
    fn default() -> Self {
        Self::new(CheckpointSource::Input)
    }
}

/// Snapshot of one thread: its state and the next node to run.
///
/// `pending_node == None` marks a terminal thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint<S> {
    /// Format version
    pub v: u32,

    /// Thread the checkpoint belongs to
    pub thread_id: String,

    /// Full state after the last completed node
    pub state: S,

    /// Node scheduled to run next, or `None` once the thread has finished
    pub pending_node: Option<String>,

    /// Bookkeeping for inspection and resume decisions
    pub metadata: CheckpointMetadata,
}

impl<S> Checkpoint<S> {
    /// Create the initial checkpoint of a thread.
    pub fn new(thread_id: impl Into<String>, state: S, pending_node: Option<String>) -> Self {
        Self {
            v: CHECKPOINT_VERSION,
            thread_id: thread_id.into(),
            state,
            pending_node,
            metadata: CheckpointMetadata::default(),
        }
    }

    /// Replace the metadata
    pub fn with_metadata(mut self, metadata: CheckpointMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the thread has run to its end node
    pub fn is_terminal(&self) -> bool {
        self.pending_node.is_none()
    }
}
