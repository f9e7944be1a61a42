//! Error types for graph construction and execution
//!
//! ```text
//! GraphError
//! ├── Validation       - graph structure rejected at compile time
//! ├── ThreadNotFound   - no checkpoint for the requested thread
//! ├── InvalidState     - operation not allowed in the thread's current position
//! ├── Routing          - router produced a value outside its legal targets
//! ├── NodeExecution    - a step returned an error
//! ├── Configuration    - engine used without a required component
//! └── Checkpoint       - persistence failure
//! ```
//!
//! `ThreadNotFound` and `InvalidState` are caller errors and are never retried
//! by the engine. `Routing` is a configuration bug: execution for the thread
//! halts and the last good checkpoint stays in place so the thread can be
//! resumed once the router is fixed.

use thiserror::Error;
use workflow_checkpoint::CheckpointError;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised while building or running a graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// Graph structure validation failed
    ///
    /// Raised by [`StateGraph::compile`](crate::StateGraph::compile) for
    /// undeclared nodes, a missing entry point, nodes without exactly one
    /// outgoing transition, unreachable nodes, or non-exhaustive routers.
    #[error("Graph validation failed: {0}")]
    Validation(String),

    /// No checkpoint exists for the thread
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    /// The thread is not in a position where the operation applies
    ///
    /// For example, feedback submitted while the thread is not parked at an
    /// interrupt node, or a new run started under an id that already exists.
    #[error("Invalid thread state: {0}")]
    InvalidState(String),

    /// A router returned a value outside its declared legal set
    #[error("Router after node '{node}' returned illegal target '{value}'")]
    Routing {
        /// Node whose router was consulted
        node: String,
        /// The unrecognized value
        value: String,
    },

    /// A step returned an error
    ///
    /// Nothing the step produced is persisted.
    #[error("Node '{node}' execution failed: {error}")]
    NodeExecution {
        /// Name of the node that failed
        node: String,
        /// Error message from node execution
        error: String,
    },

    /// Engine misconfiguration, such as running without a checkpoint store
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Checkpoint persistence error
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl GraphError {
    /// Create a node execution error with context
    ///
    /// ```rust
    /// use workflow_core::GraphError;
    ///
    /// let err = GraphError::node_execution("search", "upstream timeout");
    /// assert_eq!(err.to_string(), "Node 'search' execution failed: upstream timeout");
    /// ```
    pub fn node_execution(node: impl Into<String>, error: impl Into<String>) -> Self {
        Self::NodeExecution {
            node: node.into(),
            error: error.into(),
        }
    }

    /// Create a routing error
    pub fn routing(node: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Routing {
            node: node.into(),
            value: value.into(),
        }
    }

    /// Whether the error is the caller's fault rather than the engine's
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GraphError::ThreadNotFound(_) | GraphError::InvalidState(_)
        )
    }
}
