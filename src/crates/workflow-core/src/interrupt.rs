//! Human-in-the-loop interrupt points
//!
//! Nodes listed in [`InterruptConfig::interrupt_before`] pause execution
//! *before* their step runs. The engine persists the thread with that node
//! pending and returns control to the caller. Nothing resumes the thread
//! except an explicit external call.
//!
//! # Two-phase behavior
//!
//! ```text
//!   ... ──► synthesize ──► [plan_review]          (interrupt node)
//!
//!   advance(new state)   runs up to plan_review, persists
//!                        (state, pending = plan_review), returns Interrupted
//!
//!   resume_with(update)  writes the update at the same pending node, then
//!                        runs plan_review's own step first and continues;
//!                        later interrupt nodes pause again
//! ```
//!
//! An interrupt only takes effect when the node is reached from an incoming
//! transition. The resume call that releases a parked thread always runs the
//! parked node.

use crate::graph::NodeId;
use std::collections::HashSet;

/// Which nodes pause execution before running
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterruptConfig {
    /// Nodes to interrupt before executing
    pub interrupt_before: HashSet<NodeId>,
}

impl InterruptConfig {
    /// No interrupts
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupt before each of the given nodes
    pub fn before<I, N>(nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
    {
        Self {
            interrupt_before: nodes.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if should interrupt before a node
    pub fn should_interrupt_before(&self, node: &str) -> bool {
        self.interrupt_before.contains(node)
    }

    /// Whether any interrupt is configured
    pub fn is_empty(&self) -> bool {
        self.interrupt_before.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_before_membership() {
        let config = InterruptConfig::before(["plan_review", "fact_verification"]);
        assert!(config.should_interrupt_before("plan_review"));
        assert!(config.should_interrupt_before("fact_verification"));
        assert!(!config.should_interrupt_before("refine"));
    }

    #[test]
    fn test_default_has_no_interrupts() {
        let config = InterruptConfig::new();
        assert!(config.is_empty());
        assert!(!config.should_interrupt_before("anything"));
    }
}
