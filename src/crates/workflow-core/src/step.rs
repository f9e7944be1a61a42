//! Step functions: the opaque units of work a graph node runs
//!
//! A step receives the **full** state and returns the full state. It never
//! returns a partial patch, so omitting a field cannot clear it. Steps that
//! talk to external services are expected to contain their own failures and
//! degrade gracefully. Returning `Err` aborts the current `advance` call with
//! [`GraphError::NodeExecution`](crate::GraphError::NodeExecution), and nothing
//! the step produced is persisted.

use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;

/// A unit of work bound to a graph node
///
/// Implement this on a struct when the step needs injected collaborators:
///
/// ```rust
/// use async_trait::async_trait;
/// use workflow_core::{Result, Step};
///
/// struct Greet {
///     greeting: String,
/// }
///
/// #[async_trait]
/// impl Step<Vec<String>> for Greet {
///     async fn run(&self, mut state: Vec<String>) -> Result<Vec<String>> {
///         state.push(self.greeting.clone());
///         Ok(state)
///     }
/// }
/// ```
#[async_trait]
pub trait Step<S>: Send + Sync {
    /// Transform the state
    async fn run(&self, state: S) -> Result<S>;
}

/// Adapter that turns an async closure into a [`Step`]
pub struct FnStep<F> {
    f: F,
}

/// Wrap an async closure as a step
///
/// ```rust
/// use workflow_core::step_fn;
///
/// let double = step_fn(|n: u64| async move { Ok(n * 2) });
/// ```
pub fn step_fn<S, F, Fut>(f: F) -> FnStep<F>
where
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<S>> + Send,
{
    FnStep { f }
}

#[async_trait]
impl<S, F, Fut> Step<S> for FnStep<F>
where
    S: Send + 'static,
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<S>> + Send,
{
    async fn run(&self, state: S) -> Result<S> {
        (self.f)(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    #[tokio::test]
    async fn test_fn_step_runs_closure() {
        let step = step_fn(|mut v: Vec<u8>| async move {
            v.push(1);
            Ok(v)
        });
        assert_eq!(step.run(vec![0]).await.unwrap(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_fn_step_propagates_error() {
        let step = step_fn(|_: u8| async { Err::<u8, _>(GraphError::node_execution("boom", "failed")) });
        assert!(step.run(0).await.is_err());
    }
}
