//! # workflow-core - Checkpointed step graphs with human-in-the-loop pauses
//!
//! A workflow is a directed graph of named **steps**. Each step takes the full
//! state and returns the full state. After it returns, the node's outgoing
//! transition (a fixed edge or a router over the new state) picks the next
//! node, and `(state, next node)` is persisted before anything else runs.
//! Some nodes are marked as **interrupt points**: execution stops in front of
//! them and waits for an external call.
//!
//! ```text
//!   StateGraph ──compile()──▶ CompiledGraph ──with_checkpointer(store)
//!                                  │
//!            advance(id, Some(s))  │  new thread at the entry node
//!            advance(id, None)     │  continue a persisted thread
//!            resume_with(id, f)    │  update a parked thread, then continue
//!            get_state(id)         │  read-only
//!                                  ▼
//!                         StateSnapshot { values, next, status }
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use workflow_checkpoint::InMemoryCheckpointStore;
//! use workflow_core::{step_fn, RunStatus, StateGraph, END};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> workflow_core::Result<()> {
//! let mut graph = StateGraph::<Vec<String>>::new();
//! graph
//!     .add_node("outline", step_fn(|mut s: Vec<String>| async move {
//!         s.push("outline".into());
//!         Ok(s)
//!     }))
//!     .add_node("publish", step_fn(|mut s: Vec<String>| async move {
//!         s.push("publish".into());
//!         Ok(s)
//!     }))
//!     .set_entry_point("outline")
//!     .add_edge("outline", "publish")
//!     .add_edge("publish", END)
//!     .interrupt_before(["publish"]);
//!
//! let app = graph
//!     .compile()?
//!     .with_checkpointer(Arc::new(InMemoryCheckpointStore::new()));
//!
//! let parked = app.advance("thread-1", Some(Vec::new())).await?;
//! assert_eq!(parked.status, RunStatus::Interrupted);
//!
//! let done = app
//!     .resume_with("thread-1", |s, _node| {
//!         s.push("approved".into());
//!         Ok(())
//!     })
//!     .await?;
//! assert_eq!(done.values, vec!["outline", "approved", "publish"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - A thread id is only ever advanced by one call at a time.
//! - A failing step or an illegal routing value leaves the previous checkpoint
//!   untouched; the thread can be resumed from it.
//! - Restarting after a crash between two steps reruns at most the step that
//!   was in flight, and never runs a step that had already been persisted.

pub mod builder;
pub mod compiled;
pub mod error;
pub mod graph;
pub mod interrupt;
pub mod step;

pub use builder::StateGraph;
pub use compiled::{CompiledGraph, RunStatus, StateSnapshot};
pub use error::{GraphError, Result};
pub use graph::{Graph, NodeId, RouteKey, Router, Transition, END};
pub use interrupt::InterruptConfig;
pub use step::{step_fn, FnStep, Step};
