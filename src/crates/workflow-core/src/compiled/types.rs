//! Type definitions for compiled graph execution

use crate::graph::NodeId;
use serde::Serialize;
use workflow_checkpoint::CheckpointMetadata;

/// Where a thread stands after an engine call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Parked in front of an interrupt node, waiting for external input
    Interrupted,
    /// Reached the end node
    Completed,
    /// Persisted mid-run (a step failed, or the process stopped) and resumable
    Pending,
}

/// Snapshot of a thread's persisted position
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot<S> {
    /// Thread the snapshot describes
    pub thread_id: String,

    /// Full state as of the last completed node
    pub values: S,

    /// Node that runs next; `None` once completed
    pub next: Option<NodeId>,

    /// Interrupted, completed, or pending
    pub status: RunStatus,

    /// Metadata of the checkpoint the snapshot was taken from
    pub metadata: CheckpointMetadata,
}

impl<S> StateSnapshot<S> {
    /// Whether the thread is waiting at an interrupt node
    pub fn is_interrupted(&self) -> bool {
        self.status == RunStatus::Interrupted
    }

    /// Whether the thread has finished
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}
