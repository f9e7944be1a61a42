//! Fluent builder for step graphs
//!
//! [`StateGraph`] collects nodes, edges, routers, and interrupt points, then
//! [`compile`](StateGraph::compile) validates the whole topology at once.
//! Nothing is checked while building, so declarations may appear in any
//! order. Every structural mistake surfaces from `compile`, before the first
//! execution.
//!
//! # Example
//!
//! ```rust
//! use workflow_core::{step_fn, StateGraph, END};
//!
//! # fn main() -> workflow_core::Result<()> {
//! let mut graph = StateGraph::<Vec<String>>::new();
//! graph
//!     .add_node("draft", step_fn(|mut s: Vec<String>| async move {
//!         s.push("draft".into());
//!         Ok(s)
//!     }))
//!     .add_node("review", step_fn(|s: Vec<String>| async move { Ok(s) }))
//!     .set_entry_point("draft")
//!     .add_edge("draft", "review")
//!     .add_router(
//!         "review",
//!         |s: &Vec<String>| if s.len() > 3 { END.to_string() } else { "draft".to_string() },
//!         ["draft", END],
//!     )
//!     .interrupt_before(["review"]);
//!
//! let compiled = graph.compile()?;
//! assert_eq!(compiled.graph().entry(), "draft");
//! # Ok(())
//! # }
//! ```

use crate::compiled::CompiledGraph;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeId, RouteKey, Router, Transition, END};
use crate::interrupt::InterruptConfig;
use crate::step::Step;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Builder for a [`CompiledGraph`] over state type `S`
pub struct StateGraph<S> {
    nodes: Vec<(NodeId, Arc<dyn Step<S>>)>,
    transitions: Vec<(NodeId, Transition<S>)>,
    entry: Option<NodeId>,
    interrupt_before: Vec<NodeId>,
}

impl<S: Send + Sync + 'static> StateGraph<S> {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            transitions: Vec::new(),
            entry: None,
            interrupt_before: Vec::new(),
        }
    }

    /// Declare a node and the step it runs
    pub fn add_node(&mut self, id: impl Into<NodeId>, step: impl Step<S> + 'static) -> &mut Self {
        self.nodes.push((id.into(), Arc::new(step)));
        self
    }

    /// Declare a node from an already shared step
    pub fn add_shared_node(&mut self, id: impl Into<NodeId>, step: Arc<dyn Step<S>>) -> &mut Self {
        self.nodes.push((id.into(), step));
        self
    }

    /// Unconditional transition `from -> to`; `to` may be [`END`]
    pub fn add_edge(&mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> &mut Self {
        self.transitions
            .push((from.into(), Transition::Edge(to.into())));
        self
    }

    /// Conditional transition driven by a closed [`RouteKey`] enum
    ///
    /// `compile` fails unless every variant of `K` has a branch.
    pub fn add_conditional_edge<K, F, I, N>(
        &mut self,
        from: impl Into<NodeId>,
        router: F,
        branches: I,
    ) -> &mut Self
    where
        K: RouteKey,
        F: Fn(&S) -> K + Send + Sync + 'static,
        I: IntoIterator<Item = (K, N)>,
        N: Into<NodeId>,
    {
        let branches: HashMap<K, NodeId> = branches
            .into_iter()
            .map(|(key, node)| (key, node.into()))
            .collect();
        self.transitions.push((
            from.into(),
            Transition::Conditional(Router::keyed(router, branches)),
        ));
        self
    }

    /// Conditional transition driven by a function returning node names
    ///
    /// A returned name outside `legal_targets` fails the run with
    /// [`GraphError::Routing`].
    pub fn add_router<F, I, N>(
        &mut self,
        from: impl Into<NodeId>,
        router: F,
        legal_targets: I,
    ) -> &mut Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
    {
        let legal: BTreeSet<NodeId> = legal_targets.into_iter().map(Into::into).collect();
        self.transitions.push((
            from.into(),
            Transition::Conditional(Router::named(router, legal)),
        ));
        self
    }

    /// Set the node every new thread starts at
    pub fn set_entry_point(&mut self, node: impl Into<NodeId>) -> &mut Self {
        self.entry = Some(node.into());
        self
    }

    /// Pause before each of these nodes
    pub fn interrupt_before<I, N>(&mut self, nodes: I) -> &mut Self
    where
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
    {
        self.interrupt_before
            .extend(nodes.into_iter().map(Into::into));
        self
    }

    /// Validate the topology and produce an executable graph
    ///
    /// # Errors
    ///
    /// [`GraphError::Validation`] if:
    /// - no entry point is set, or it is not a declared node
    /// - a node is declared twice or uses the reserved [`END`] name
    /// - an edge or router references an undeclared node
    /// - a node does not have exactly one outgoing transition
    /// - a keyed router leaves a variant without a branch
    /// - a node is unreachable from the entry point
    /// - an interrupt names an undeclared node
    pub fn compile(self) -> Result<CompiledGraph<S>> {
        let entry = self
            .entry
            .ok_or_else(|| GraphError::Validation("No entry point set".to_string()))?;

        let mut order = Vec::with_capacity(self.nodes.len());
        let mut steps = HashMap::with_capacity(self.nodes.len());
        for (id, step) in self.nodes {
            if id == END {
                return Err(GraphError::Validation(format!(
                    "'{}' is reserved and cannot be declared as a node",
                    END
                )));
            }
            if steps.insert(id.clone(), step).is_some() {
                return Err(GraphError::Validation(format!("Node {} declared twice", id)));
            }
            order.push(id);
        }

        if !steps.contains_key(&entry) {
            return Err(GraphError::Validation(format!(
                "Entry point {} does not exist",
                entry
            )));
        }

        let mut transitions: HashMap<NodeId, Transition<S>> = HashMap::new();
        for (from, transition) in self.transitions {
            if !steps.contains_key(&from) {
                return Err(GraphError::Validation(format!(
                    "Edge source {} does not exist",
                    from
                )));
            }
            for to in transition.targets() {
                if to != END && !steps.contains_key(to) {
                    return Err(GraphError::Validation(format!(
                        "Edge target {} (from {}) does not exist",
                        to, from
                    )));
                }
            }
            if let Transition::Conditional(router) = &transition {
                if !router.unmapped().is_empty() {
                    return Err(GraphError::Validation(format!(
                        "Router after {} has no branch for: {}",
                        from,
                        router.unmapped().join(", ")
                    )));
                }
            }
            if transitions.insert(from.clone(), transition).is_some() {
                return Err(GraphError::Validation(format!(
                    "Node {} has more than one outgoing transition",
                    from
                )));
            }
        }

        for id in &order {
            if !transitions.contains_key(id) {
                return Err(GraphError::Validation(format!(
                    "Node {} has no outgoing transition",
                    id
                )));
            }
        }

        let reachable = reachable_from(&entry, &transitions);
        let unreachable: Vec<&str> = order
            .iter()
            .filter(|id| !reachable.contains(id.as_str()))
            .map(String::as_str)
            .collect();
        if !unreachable.is_empty() {
            return Err(GraphError::Validation(format!(
                "Unreachable from {}: {}",
                entry,
                unreachable.join(", ")
            )));
        }

        for node in &self.interrupt_before {
            if !steps.contains_key(node) {
                return Err(GraphError::Validation(format!(
                    "Interrupt node {} does not exist",
                    node
                )));
            }
        }

        let graph = Graph {
            entry,
            order,
            steps,
            transitions,
        };
        Ok(CompiledGraph::new(
            graph,
            InterruptConfig::before(self.interrupt_before),
        ))
    }
}

impl<S: Send + Sync + 'static> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Breadth-first walk over every edge and router target
fn reachable_from<'a, S>(
    entry: &'a str,
    transitions: &'a HashMap<NodeId, Transition<S>>,
) -> HashSet<&'a str> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    seen.insert(entry);
    queue.push_back(entry);

    while let Some(node) = queue.pop_front() {
        if let Some(transition) = transitions.get(node) {
            for to in transition.targets() {
                if to != END && seen.insert(to.as_str()) {
                    queue.push_back(to.as_str());
                }
            }
        }
    }
    seen
}
