//! Tests for CompiledGraph

use crate::error::GraphError;
use crate::{step_fn, RunStatus, StateGraph, END};
use std::sync::Arc;
use workflow_checkpoint::{CheckpointSource, CheckpointStore, InMemoryCheckpointStore};

type Trace = Vec<String>;

fn push(name: &'static str) -> impl crate::Step<Trace> {
    step_fn(move |mut s: Trace| async move {
        s.push(name.to_string());
        Ok(s)
    })
}

/// draft -> review (interrupt) -> draft | END
fn review_loop() -> (crate::CompiledGraph<Trace>, Arc<InMemoryCheckpointStore<Trace>>) {
    let mut graph = StateGraph::new();
    graph
        .add_node("draft", push("draft"))
        .add_node("review", push("review"))
        .set_entry_point("draft")
        .add_edge("draft", "review")
        .add_router(
            "review",
            |s: &Trace| {
                if s.iter().any(|e| e == "approved") {
                    END.to_string()
                } else {
                    "draft".to_string()
                }
            },
            ["draft", END],
        )
        .interrupt_before(["review"]);

    let store = Arc::new(InMemoryCheckpointStore::<Trace>::new());
    let compiled = graph.compile().unwrap().with_checkpointer(store.clone());
    (compiled, store)
}

#[tokio::test]
async fn test_advance_without_checkpointer_is_configuration_error() {
    let mut graph = StateGraph::<Trace>::new();
    graph
        .add_node("only", push("only"))
        .set_entry_point("only")
        .add_edge("only", END);
    let compiled = graph.compile().unwrap();

    let err = compiled.advance("t", Some(Vec::new())).await.unwrap_err();
    assert!(matches!(err, GraphError::Configuration(_)));
}

#[tokio::test]
async fn test_linear_run_completes() {
    let mut graph = StateGraph::<Trace>::new();
    graph
        .add_node("a", push("a"))
        .add_node("b", push("b"))
        .set_entry_point("a")
        .add_edge("a", "b")
        .add_edge("b", END);
    let store = Arc::new(InMemoryCheckpointStore::<Trace>::new());
    let compiled = graph.compile().unwrap().with_checkpointer(store.clone());

    let snapshot = compiled.advance("t", Some(Vec::new())).await.unwrap();
    assert_eq!(snapshot.status, RunStatus::Completed);
    assert_eq!(snapshot.values, vec!["a", "b"]);
    assert_eq!(snapshot.next, None);
    assert_eq!(snapshot.metadata.step, 2);
    assert_eq!(snapshot.metadata.writer.as_deref(), Some("b"));

    let stored = store.get("t").await.unwrap().unwrap();
    assert!(stored.is_terminal());
}

#[tokio::test]
async fn test_interrupt_parks_before_node() {
    let (compiled, store) = review_loop();

    let snapshot = compiled.advance("t", Some(Vec::new())).await.unwrap();
    assert!(snapshot.is_interrupted());
    assert_eq!(snapshot.next.as_deref(), Some("review"));
    assert_eq!(snapshot.values, vec!["draft"]);

    let stored = store.get("t").await.unwrap().unwrap();
    assert_eq!(stored.metadata.source, CheckpointSource::Interrupt);
    assert_eq!(stored.pending_node.as_deref(), Some("review"));
}

#[tokio::test]
async fn test_plain_resume_runs_parked_node_then_parks_again() {
    let (compiled, _store) = review_loop();
    compiled.advance("t", Some(Vec::new())).await.unwrap();

    let snapshot = compiled.advance("t", None).await.unwrap();
    assert!(snapshot.is_interrupted());
    assert_eq!(snapshot.values, vec!["draft", "review", "draft"]);
}

#[tokio::test]
async fn test_resume_with_applies_update_and_completes() {
    let (compiled, _store) = review_loop();
    compiled.advance("t", Some(Vec::new())).await.unwrap();

    let snapshot = compiled
        .resume_with("t", |s, node| {
            assert_eq!(node, "review");
            s.push("approved".to_string());
            Ok(())
        })
        .await
        .unwrap();

    assert!(snapshot.is_completed());
    assert_eq!(snapshot.values, vec!["draft", "approved", "review"]);
}

#[tokio::test]
async fn test_resume_with_rejects_completed_thread() {
    let (compiled, _store) = review_loop();
    compiled.advance("t", Some(Vec::new())).await.unwrap();
    compiled
        .resume_with("t", |s, _| {
            s.push("approved".to_string());
            Ok(())
        })
        .await
        .unwrap();

    let err = compiled.resume_with("t", |_, _| Ok(())).await.unwrap_err();
    assert!(matches!(err, GraphError::InvalidState(_)));
}

#[tokio::test]
async fn test_resume_with_closure_error_writes_nothing() {
    let (compiled, store) = review_loop();
    compiled.advance("t", Some(Vec::new())).await.unwrap();
    let before = store.get("t").await.unwrap().unwrap();

    let err = compiled
        .resume_with("t", |s, _| {
            s.push("half-applied".to_string());
            Err(GraphError::InvalidState("rejected".to_string()))
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidState(_)));

    let after = store.get("t").await.unwrap().unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_unknown_thread() {
    let (compiled, _store) = review_loop();

    assert!(matches!(
        compiled.advance("missing", None).await.unwrap_err(),
        GraphError::ThreadNotFound(_)
    ));
    assert!(matches!(
        compiled.get_state("missing").await.unwrap_err(),
        GraphError::ThreadNotFound(_)
    ));
    assert!(matches!(
        compiled.resume_with("missing", |_, _| Ok(())).await.unwrap_err(),
        GraphError::ThreadNotFound(_)
    ));
}

#[tokio::test]
async fn test_starting_existing_thread_is_invalid_state() {
    let (compiled, _store) = review_loop();
    compiled.advance("t", Some(Vec::new())).await.unwrap();

    let err = compiled.advance("t", Some(Vec::new())).await.unwrap_err();
    assert!(matches!(err, GraphError::InvalidState(_)));
}

#[tokio::test]
async fn test_update_state_keeps_pending_node() {
    let (compiled, store) = review_loop();
    compiled.advance("t", Some(Vec::new())).await.unwrap();

    let snapshot = compiled
        .update_state("t", |s| s.push("note".to_string()))
        .await
        .unwrap();
    assert_eq!(snapshot.next.as_deref(), Some("review"));
    assert_eq!(snapshot.status, RunStatus::Interrupted);

    let stored = store.get("t").await.unwrap().unwrap();
    assert_eq!(stored.metadata.source, CheckpointSource::Update);
    assert_eq!(stored.state, vec!["draft", "note"]);
}

#[tokio::test]
async fn test_get_state_reports_pending_after_failed_step() {
    let mut graph = StateGraph::<Trace>::new();
    graph
        .add_node("ok", push("ok"))
        .add_node(
            "broken",
            step_fn(|_: Trace| async { Err::<Trace, _>(GraphError::node_execution("broken", "nope")) }),
        )
        .set_entry_point("ok")
        .add_edge("ok", "broken")
        .add_edge("broken", END);
    let compiled = graph
        .compile()
        .unwrap()
        .with_checkpointer(Arc::new(InMemoryCheckpointStore::<Trace>::new()));

    let err = compiled.advance("t", Some(Vec::new())).await.unwrap_err();
    assert!(matches!(err, GraphError::NodeExecution { ref node, .. } if node == "broken"));

    let snapshot = compiled.get_state("t").await.unwrap();
    assert_eq!(snapshot.status, RunStatus::Pending);
    assert_eq!(snapshot.next.as_deref(), Some("broken"));
    assert_eq!(snapshot.values, vec!["ok"]);
}

#[tokio::test]
async fn test_step_error_is_wrapped_with_node_name() {
    let mut graph = StateGraph::<Trace>::new();
    graph
        .add_node(
            "fails",
            step_fn(|_: Trace| async { Err::<Trace, _>(GraphError::Configuration("missing key".into())) }),
        )
        .set_entry_point("fails")
        .add_edge("fails", END);
    let compiled = graph
        .compile()
        .unwrap()
        .with_checkpointer(Arc::new(InMemoryCheckpointStore::<Trace>::new()));

    match compiled.advance("t", Some(Vec::new())).await.unwrap_err() {
        GraphError::NodeExecution { node, error } => {
            assert_eq!(node, "fails");
            assert!(error.contains("missing key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_clones_share_store_and_locks() {
    let (compiled, _store) = review_loop();
    let other = compiled.clone();

    compiled.advance("t", Some(Vec::new())).await.unwrap();
    let snapshot = other.get_state("t").await.unwrap();
    assert_eq!(snapshot.values, vec!["draft"]);
}

#[tokio::test]
async fn test_resume_with_rejects_thread_pending_at_plain_node() {
    let mut graph = StateGraph::<Trace>::new();
    graph
        .add_node("ok", push("ok"))
        .add_node(
            "broken",
            step_fn(|_: Trace| async { Err::<Trace, _>(GraphError::node_execution("broken", "nope")) }),
        )
        .add_node("review", push("review"))
        .set_entry_point("ok")
        .add_edge("ok", "broken")
        .add_edge("broken", "review")
        .add_edge("review", END)
        .interrupt_before(["review"]);
    let store = Arc::new(InMemoryCheckpointStore::<Trace>::new());
    let compiled = graph.compile().unwrap().with_checkpointer(store.clone());

    compiled.advance("t", Some(Vec::new())).await.unwrap_err();
    let before = store.get("t").await.unwrap().unwrap();
    assert_eq!(before.pending_node.as_deref(), Some("broken"));

    let err = compiled
        .resume_with("t", |s, _| {
            s.push("feedback".to_string());
            Ok(())
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidState(_)));

    let after = store.get("t").await.unwrap().unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_thread_locks_released_after_calls() {
    let (compiled, _store) = review_loop();

    for i in 0..50 {
        let id = format!("missing-{i}");
        compiled.resume_with(&id, |_, _| Ok(())).await.unwrap_err();
        compiled.advance(&id, None).await.unwrap_err();
    }
    for i in 0..50 {
        let id = format!("run-{i}");
        compiled.advance(&id, Some(Vec::new())).await.unwrap();
        compiled
            .resume_with(&id, |s, _| {
                s.push("approved".to_string());
                Ok(())
            })
            .await
            .unwrap();
        compiled.update_state(&id, |s| s.push("note".to_string())).await.unwrap();
    }

    assert!(compiled.locks.is_empty());
}
