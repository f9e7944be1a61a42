//! Static graph topology: nodes, edges, and routers
//!
//! A [`Graph`] is immutable once compiled. Each declared node has exactly one
//! outgoing transition:
//!
//! - an unconditional edge to another node (or [`END`]), or
//! - a [`Router`] that inspects the state after the node ran and picks the
//!   next node from a declared set of legal targets.
//!
//! Routers are built either from a closed [`RouteKey`] enum, which is checked
//! for exhaustiveness at compile time, or from a string-returning function
//! whose values are checked against the legal set on every call.

use crate::error::{GraphError, Result};
use crate::step::Step;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Node identifier
pub type NodeId = String;

/// Terminal marker; routing to it completes the thread
pub const END: &str = "__end__";

/// A closed set of routing decisions
///
/// Implemented by the enum a router returns. `variants` must list every value
/// so the graph can verify at construction that each one maps to a node.
///
/// ```rust
/// use workflow_core::RouteKey;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Review {
///     Accept,
///     Revise,
/// }
///
/// impl RouteKey for Review {
///     fn variants() -> &'static [Self] {
///         &[Review::Accept, Review::Revise]
///     }
/// }
/// ```
pub trait RouteKey: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every value the router can return
    fn variants() -> &'static [Self];
}

/// Outcome of consulting a router
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RouteChoice {
    Node(NodeId),
    Unrecognized(String),
}

type RouteFn<S> = Arc<dyn Fn(&S) -> RouteChoice + Send + Sync>;

/// A data-dependent transition out of one node
pub struct Router<S> {
    route: RouteFn<S>,
    targets: BTreeSet<NodeId>,
    unmapped: Vec<String>,
}

impl<S> Router<S> {
    /// Router over a closed enum with an explicit branch table
    pub(crate) fn keyed<K, F>(router: F, branches: HashMap<K, NodeId>) -> Self
    where
        K: RouteKey,
        F: Fn(&S) -> K + Send + Sync + 'static,
    {
        let targets = branches.values().cloned().collect();
        let unmapped = K::variants()
            .iter()
            .filter(|k| !branches.contains_key(*k))
            .map(|k| format!("{:?}", k))
            .collect();

        let route: RouteFn<S> = Arc::new(move |state| {
            let key = router(state);
            match branches.get(&key) {
                Some(node) => RouteChoice::Node(node.clone()),
                None => RouteChoice::Unrecognized(format!("{:?}", key)),
            }
        });

        Self {
            route,
            targets,
            unmapped,
        }
    }

    /// Router returning node names, validated against `legal` at run time
    pub(crate) fn named<F>(router: F, legal: BTreeSet<NodeId>) -> Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
    {
        let allowed = legal.clone();
        let route: RouteFn<S> = Arc::new(move |state| {
            let value = router(state);
            if allowed.contains(&value) {
                RouteChoice::Node(value)
            } else {
                RouteChoice::Unrecognized(value)
            }
        });

        Self {
            route,
            targets: legal,
            unmapped: Vec::new(),
        }
    }

    /// Every node this router may send execution to
    pub fn targets(&self) -> &BTreeSet<NodeId> {
        &self.targets
    }

    /// Route keys that have no branch
    pub(crate) fn unmapped(&self) -> &[String] {
        &self.unmapped
    }

    pub(crate) fn choose(&self, state: &S) -> RouteChoice {
        (self.route)(state)
    }
}

impl<S> fmt::Debug for Router<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("route", &"<function>")
            .field("targets", &self.targets)
            .finish()
    }
}

/// Outgoing transition of a node
pub enum Transition<S> {
    /// Always continue to the given node
    Edge(NodeId),
    /// Consult a router
    Conditional(Router<S>),
}

impl<S> fmt::Debug for Transition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Edge(to) => f.debug_tuple("Edge").field(to).finish(),
            Transition::Conditional(router) => f.debug_tuple("Conditional").field(router).finish(),
        }
    }
}

impl<S> Transition<S> {
    /// Every node this transition may lead to
    pub fn targets(&self) -> Vec<&NodeId> {
        match self {
            Transition::Edge(to) => vec![to],
            Transition::Conditional(router) => router.targets().iter().collect(),
        }
    }
}

/// Validated topology produced by [`StateGraph::compile`](crate::StateGraph::compile)
pub struct Graph<S> {
    pub(crate) entry: NodeId,
    pub(crate) order: Vec<NodeId>,
    pub(crate) steps: HashMap<NodeId, Arc<dyn Step<S>>>,
    pub(crate) transitions: HashMap<NodeId, Transition<S>>,
}

impl<S> Graph<S> {
    /// The entry node
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Node names in declaration order
    pub fn node_names(&self) -> &[NodeId] {
        &self.order
    }

    /// Number of declared nodes
    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Whether `node` is declared
    pub fn contains(&self, node: &str) -> bool {
        self.steps.contains_key(node)
    }

    /// Outgoing transition of `node`
    pub fn transition(&self, node: &str) -> Option<&Transition<S>> {
        self.transitions.get(node)
    }

    pub(crate) fn step(&self, node: &str) -> Result<Arc<dyn Step<S>>> {
        self.steps
            .get(node)
            .cloned()
            .ok_or_else(|| GraphError::InvalidState(format!("node '{}' is not part of the graph", node)))
    }

    /// Pick the node that follows `node`, given the state it produced.
    pub(crate) fn next_node(&self, node: &str, state: &S) -> Result<NodeId> {
        match self.transitions.get(node) {
            Some(Transition::Edge(to)) => Ok(to.clone()),
            Some(Transition::Conditional(router)) => match router.choose(state) {
                RouteChoice::Node(next) => Ok(next),
                RouteChoice::Unrecognized(value) => Err(GraphError::routing(node, value)),
            },
            None => Err(GraphError::InvalidState(format!(
                "node '{}' has no outgoing transition",
                node
            ))),
        }
    }
}

impl<S> fmt::Debug for Graph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("entry", &self.entry)
            .field("nodes", &self.order)
            .field("transitions", &self.transitions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Lane {
        Left,
        Right,
        Stop,
    }

    impl RouteKey for Lane {
        fn variants() -> &'static [Self] {
            &[Lane::Left, Lane::Right, Lane::Stop]
        }
    }

    #[test]
    fn test_keyed_router_reports_unmapped_variants() {
        let mut branches = HashMap::new();
        branches.insert(Lane::Left, "left".to_string());
        let router: Router<i32> = Router::keyed(|_: &i32| Lane::Left, branches);

        let mut unmapped = router.unmapped().to_vec();
        unmapped.sort();
        assert_eq!(unmapped, vec!["Right".to_string(), "Stop".to_string()]);
        assert_eq!(router.choose(&0), RouteChoice::Node("left".to_string()));
    }

    #[test]
    fn test_keyed_router_unmapped_value_is_unrecognized() {
        let mut branches = HashMap::new();
        branches.insert(Lane::Left, "left".to_string());
        let router: Router<i32> = Router::keyed(
            |n: &i32| if *n > 0 { Lane::Left } else { Lane::Stop },
            branches,
        );
        assert_eq!(
            router.choose(&-1),
            RouteChoice::Unrecognized("Stop".to_string())
        );
    }

    #[test]
    fn test_named_router_checks_legal_set() {
        let legal: BTreeSet<NodeId> = ["a".to_string(), END.to_string()].into_iter().collect();
        let router: Router<String> = Router::named(|s: &String| s.clone(), legal);

        assert_eq!(router.choose(&"a".to_string()), RouteChoice::Node("a".to_string()));
        assert_eq!(router.choose(&END.to_string()), RouteChoice::Node(END.to_string()));
        assert_eq!(
            router.choose(&"zzz".to_string()),
            RouteChoice::Unrecognized("zzz".to_string())
        );
    }

    #[test]
    fn test_transition_debug_hides_function() {
        let legal: BTreeSet<NodeId> = ["x".to_string()].into_iter().collect();
        let t: Transition<u8> = Transition::Conditional(Router::named(|_: &u8| "x".to_string(), legal));
        assert!(format!("{:?}", t).contains("<function>"));
    }
}
