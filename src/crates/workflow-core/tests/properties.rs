//! Property tests over randomly shaped linear pipelines.

use proptest::prelude::*;
use std::sync::Arc;
use workflow_checkpoint::InMemoryCheckpointStore;
use workflow_core::{step_fn, CompiledGraph, RunStatus, StateGraph, END};

fn chain(len: usize, interrupts: &[usize]) -> CompiledGraph<Vec<usize>> {
    let mut graph = StateGraph::<Vec<usize>>::new();
    for i in 0..len {
        graph.add_node(
            format!("n{i}"),
            step_fn(move |mut s: Vec<usize>| async move {
                s.push(i);
                Ok(s)
            }),
        );
        let next = if i + 1 == len {
            END.to_string()
        } else {
            format!("n{}", i + 1)
        };
        graph.add_edge(format!("n{i}"), next);
    }
    graph
        .set_entry_point("n0")
        .interrupt_before(interrupts.iter().map(|i| format!("n{i}")));
    graph
        .compile()
        .unwrap()
        .with_checkpointer(Arc::new(InMemoryCheckpointStore::<Vec<usize>>::new()))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    /// Every node runs exactly once, in order, and the thread pauses once per
    /// interrupt node no matter where the interrupts sit.
    #[test]
    fn each_node_runs_once_and_pauses_once_per_interrupt(
        mask in proptest::collection::vec(any::<bool>(), 1..8)
    ) {
        let len = mask.len();
        let interrupts: Vec<usize> = (0..len).filter(|i| mask[*i]).collect();
        let app = chain(len, &interrupts);

        let (values, pauses) = runtime().block_on(async {
            let mut pauses = 0;
            let mut snapshot = app.advance("p", Some(Vec::new())).await.unwrap();
            while snapshot.status == RunStatus::Interrupted {
                pauses += 1;
                // Inspection between pauses must not move the thread.
                let seen = app.get_state("p").await.unwrap();
                assert_eq!(seen.values, snapshot.values);
                snapshot = app.advance("p", None).await.unwrap();
            }
            (snapshot.values, pauses)
        });

        prop_assert_eq!(values, (0..len).collect::<Vec<_>>());
        prop_assert_eq!(pauses, interrupts.len());
    }

    /// Resuming a completed thread is a no-op that reports completion.
    #[test]
    fn completed_threads_stay_completed(len in 1usize..6) {
        let app = chain(len, &[]);
        let (first, again) = runtime().block_on(async {
            let first = app.advance("p", Some(Vec::new())).await.unwrap();
            let again = app.advance("p", None).await.unwrap();
            (first, again)
        });
        prop_assert!(first.is_completed());
        prop_assert!(again.is_completed());
        prop_assert_eq!(first.values, again.values);
    }
}
