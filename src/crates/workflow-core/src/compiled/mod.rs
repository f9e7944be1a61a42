//! CompiledGraph execution engine for resumable, checkpointed runs
//!
//! A [`CompiledGraph`] is produced by [`StateGraph::compile`](crate::StateGraph::compile).
//! It runs one thread at a time per thread id. Each step is executed, its
//! successor chosen, and `(new state, next node)` persisted before the next
//! step begins. Execution stops at the end node or in front of an interrupt
//! node.
//!
//! # Key Types
//!
//! - [`CompiledGraph`] - The executable graph runtime
//! - [`StateSnapshot`] - What a thread looks like after a call returns
//! - [`RunStatus`] - Interrupted, completed, or pending
//!
//! # Operations
//!
//! - [`advance`](CompiledGraph::advance) - start a new thread or resume an existing one
//! - [`get_state`](CompiledGraph::get_state) - read-only inspection
//! - [`update_state`](CompiledGraph::update_state) - rewrite a parked thread's state in place
//! - [`resume_with`](CompiledGraph::resume_with) - update a thread parked at an interrupt, then resume it

mod execution;
mod graph;
mod state;
mod types;
#[cfg(test)]
mod tests;

pub use graph::CompiledGraph;
pub use types::{RunStatus, StateSnapshot};
