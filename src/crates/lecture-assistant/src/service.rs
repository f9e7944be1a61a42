//! Run lifecycle: start a run, feed reviewer decisions into it, inspect it.
//!
//! Thin layer over [`CompiledGraph`]; every call maps onto one engine
//! operation and converts its snapshot into a [`RunReport`].

use crate::state::{FinalBrief, HumanFeedback, RunState};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use workflow_checkpoint::CheckpointStore;
use workflow_core::{CompiledGraph, GraphError, RunStatus, StateSnapshot};

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Run not found: {0}")]
    ThreadNotFound(String),

    /// The run is not waiting for a review decision
    #[error("Invalid run state: {0}")]
    InvalidState(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The run has not produced the requested artifact yet
    #[error("Not ready: {0}")]
    NotReady(String),

    #[error(transparent)]
    Graph(GraphError),
}

impl From<GraphError> for ServiceError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::ThreadNotFound(id) => ServiceError::ThreadNotFound(id),
            GraphError::InvalidState(msg) => ServiceError::InvalidState(msg),
            other => ServiceError::Graph(other),
        }
    }
}

/// Where a run stands, returned by every service call
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub thread_id: String,
    pub status: RunStatus,
    /// Node the run is parked at or will run next; `None` once completed
    pub checkpoint: Option<String>,
    pub state: RunState,
}

impl From<StateSnapshot<RunState>> for RunReport {
    fn from(snapshot: StateSnapshot<RunState>) -> Self {
        Self {
            thread_id: snapshot.thread_id,
            status: snapshot.status,
            checkpoint: snapshot.next,
            state: snapshot.values,
        }
    }
}

/// Entry point for callers of the research pipeline
#[derive(Clone)]
pub struct ResearchService {
    graph: CompiledGraph<RunState>,
}

impl ResearchService {
    /// Wrap a graph that already has a checkpoint store attached
    pub fn new(graph: CompiledGraph<RunState>) -> Self {
        Self { graph }
    }

    pub fn with_store(graph: CompiledGraph<RunState>, store: Arc<dyn CheckpointStore<RunState>>) -> Self {
        Self::new(graph.with_checkpointer(store))
    }

    /// Begin a new run and advance it to its first review point
    #[tracing::instrument(skip(self))]
    pub async fn start(&self, topic: &str) -> Result<RunReport> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ServiceError::InvalidInput("topic must not be empty".to_string()));
        }

        let thread_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(thread_id = %thread_id, "Starting research run");
        let snapshot = self.graph.advance(&thread_id, Some(RunState::new(topic))).await?;
        Ok(snapshot.into())
    }

    /// Record a reviewer decision on a parked run and resume it
    ///
    /// # Errors
    ///
    /// - [`ServiceError::ThreadNotFound`] for an unknown run
    /// - [`ServiceError::InvalidState`] if the run is not parked at a review point
    #[tracing::instrument(skip(self, notes))]
    pub async fn submit_feedback(&self, thread_id: &str, decision: &str, notes: &str) -> Result<RunReport> {
        let decision = decision.trim().to_string();
        let notes = notes.to_string();
        let snapshot = self
            .graph
            .resume_with(thread_id, move |state, node| {
                state.human_feedback = HumanFeedback {
                    decision,
                    notes,
                    checkpoint: Some(node.clone()),
                };
                Ok(())
            })
            .await?;
        Ok(snapshot.into())
    }

    /// Current position of a run; never advances it
    pub async fn get_status(&self, thread_id: &str) -> Result<RunReport> {
        Ok(self.graph.get_state(thread_id).await?.into())
    }

    pub async fn final_brief(&self, thread_id: &str) -> Result<FinalBrief> {
        let report = self.get_status(thread_id).await?;
        report
            .state
            .final_brief
            .ok_or_else(|| ServiceError::NotReady(format!("run {thread_id} has no final brief yet")))
    }
}
