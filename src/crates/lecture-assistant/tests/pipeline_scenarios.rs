//! End-to-end runs of the research graph against in-process fakes

use lecture_assistant::pipeline::nodes;
use lecture_assistant::service::{ResearchService, ServiceError};
use lecture_assistant::steps::StepContext;
use lecture_assistant::testing::{FakeFetcher, FakeModel, FakeSearch};
use lecture_assistant::{build_graph, RunState};
use std::sync::Arc;
use workflow_checkpoint::{Checkpoint, CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore};
use workflow_core::RunStatus;

fn service_with(model: FakeModel, search: Arc<FakeSearch>, store: Arc<dyn CheckpointStore<RunState>>) -> ResearchService {
    let ctx = StepContext::new(Arc::new(model), search, Arc::new(FakeFetcher::empty()));
    let graph = build_graph(&ctx, None).unwrap();
    ResearchService::with_store(graph, store)
}

fn service() -> ResearchService {
    service_with(
        FakeModel::new(),
        Arc::new(FakeSearch::new()),
        Arc::new(InMemoryCheckpointStore::new()),
    )
}

fn count(trace: &[String], node: &str) -> usize {
    trace.iter().filter(|n| n.as_str() == node).count()
}

#[tokio::test]
async fn test_start_parks_at_plan_review() {
    let service = service();
    let run = service.start("  photosynthesis ").await.unwrap();

    assert_eq!(run.status, RunStatus::Interrupted);
    assert_eq!(run.checkpoint.as_deref(), Some(nodes::PLAN_REVIEW));
    assert_eq!(run.state.topic, "photosynthesis");
    assert_eq!(
        run.state.node_trace(),
        vec!["input", "search", "extract", "prioritize", "verify", "synthesize"]
    );
    assert_eq!(run.state.search_queries.len(), 5);
    assert_eq!(run.state.raw_search_results.len(), 15);
    assert_eq!(run.state.extracted_claims.len(), 10);
    assert_eq!(run.state.verified_claims.len(), 10);
    assert_eq!(run.state.draft_plan.len(), 5);
    assert!(run.state.final_brief.is_none());
}

#[tokio::test]
async fn test_approve_twice_produces_brief() {
    let service = service();
    let run = service.start("photosynthesis").await.unwrap();

    let reviewed = service.submit_feedback(&run.thread_id, "approve", "").await.unwrap();
    assert_eq!(reviewed.status, RunStatus::Interrupted);
    assert_eq!(reviewed.checkpoint.as_deref(), Some(nodes::FACT_VERIFICATION));
    assert_eq!(
        reviewed.state.human_feedback.checkpoint.as_deref(),
        Some(nodes::PLAN_REVIEW)
    );

    let done = service.submit_feedback(&run.thread_id, "approve", "").await.unwrap();
    assert_eq!(done.status, RunStatus::Completed);
    assert_eq!(done.checkpoint, None);

    let trace = done.state.node_trace();
    assert_eq!(trace.last().map(String::as_str), Some(nodes::FINAL_BRIEF));
    assert_eq!(count(&trace, nodes::PLAN_REVIEW), 1);
    assert_eq!(count(&trace, nodes::FACT_VERIFICATION), 1);

    let brief = service.final_brief(&run.thread_id).await.unwrap();
    assert_eq!(brief.title, "Comprehensive Lecture Plan: Photosynthesis");
    assert_eq!(brief.lecture_plan, done.state.draft_plan);
    assert_eq!(brief.key_findings.len(), 6);
    assert_eq!(brief.appendix.claims_verified, 10);
    assert_eq!(brief.appendix.node_trace, trace);
}

#[tokio::test]
async fn test_rework_resynthesizes_with_notes() {
    let service = service();
    let run = service.start("plate tectonics").await.unwrap();

    let again = service
        .submit_feedback(&run.thread_id, "rework", "cover subduction")
        .await
        .unwrap();

    assert_eq!(again.checkpoint.as_deref(), Some(nodes::PLAN_REVIEW));
    assert_eq!(again.state.refinement_notes, "cover subduction");
    assert_eq!(again.state.draft_plan.len(), 6);

    let trace = again.state.node_trace();
    assert_eq!(count(&trace, nodes::SYNTHESIZE), 2);
    assert_eq!(count(&trace, nodes::SEARCH), 1);
    assert_eq!(&trace[trace.len() - 3..], ["plan_review", "refine", "synthesize"]);
}

#[tokio::test]
async fn test_more_sources_searches_again() {
    let search = Arc::new(FakeSearch::new());
    let service = service_with(FakeModel::new(), search.clone(), Arc::new(InMemoryCheckpointStore::new()));
    let run = service.start("volcanoes").await.unwrap();
    assert_eq!(search.calls(), 5);

    let again = service
        .submit_feedback(&run.thread_id, "more_sources", "hawaii")
        .await
        .unwrap();

    assert_eq!(search.calls(), 8);
    assert_eq!(again.checkpoint.as_deref(), Some(nodes::PLAN_REVIEW));
    assert_eq!(
        again.state.search_queries,
        vec!["volcanoes hawaii", "volcanoes hawaii detailed", "volcanoes hawaii examples"]
    );
    assert_eq!(again.state.raw_search_results.len(), 9);
    assert_eq!(count(&again.state.node_trace(), nodes::SEARCH), 2);
}

#[tokio::test]
async fn test_emphasize_topic_goes_to_fact_verification() {
    let service = service();
    let run = service.start("optics").await.unwrap();

    let parked = service
        .submit_feedback(&run.thread_id, "emphasize_topic", "lasers")
        .await
        .unwrap();
    assert_eq!(parked.checkpoint.as_deref(), Some(nodes::FACT_VERIFICATION));
    assert_eq!(parked.state.refined_plan.len(), 6);
    assert_eq!(parked.state.refined_plan[1], "Special Focus: lasers (15 minutes)");

    let done = service.submit_feedback(&run.thread_id, "approve", "").await.unwrap();
    let brief = done.state.final_brief.unwrap();
    assert_eq!(brief.lecture_plan, parked.state.refined_plan);
}

#[tokio::test]
async fn test_feedback_on_completed_run_is_invalid_state() {
    let service = service();
    let run = service.start("optics").await.unwrap();
    service.submit_feedback(&run.thread_id, "approve", "").await.unwrap();
    service.submit_feedback(&run.thread_id, "approve", "").await.unwrap();

    let err = service.submit_feedback(&run.thread_id, "approve", "").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn test_feedback_rejected_while_pending_at_plain_node() {
    let store = Arc::new(InMemoryCheckpointStore::<RunState>::new());
    let search = Arc::new(FakeSearch::new());
    let service = service_with(FakeModel::new(), search.clone(), store.clone());

    // A run interrupted between input and search, e.g. by a crash
    let mut state = RunState::new("optics");
    state.search_queries = vec!["optics comprehensive guide".to_string()];
    store
        .put(Checkpoint::new("crashed", state, Some(nodes::SEARCH.to_string())))
        .await
        .unwrap();
    let before = store.get("crashed").await.unwrap().unwrap();

    let err = service.submit_feedback("crashed", "approve", "").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert_eq!(search.calls(), 0);

    let after = store.get("crashed").await.unwrap().unwrap();
    assert!(after.state.human_feedback.is_empty());
    assert_eq!(after.pending_node, before.pending_node);
    assert_eq!(after.metadata.source, before.metadata.source);
}

#[tokio::test]
async fn test_unknown_run() {
    let service = service();
    assert!(matches!(
        service.get_status("nope").await.unwrap_err(),
        ServiceError::ThreadNotFound(_)
    ));
    assert!(matches!(
        service.submit_feedback("nope", "approve", "").await.unwrap_err(),
        ServiceError::ThreadNotFound(_)
    ));
}

#[tokio::test]
async fn test_brief_not_ready_while_parked() {
    let service = service();
    let run = service.start("optics").await.unwrap();
    assert!(matches!(
        service.final_brief(&run.thread_id).await.unwrap_err(),
        ServiceError::NotReady(_)
    ));
}

#[tokio::test]
async fn test_empty_topic_rejected() {
    let service = service();
    assert!(matches!(
        service.start("   ").await.unwrap_err(),
        ServiceError::InvalidInput(_)
    ));
}

#[tokio::test]
async fn test_get_status_does_not_advance() {
    let service = service();
    let run = service.start("optics").await.unwrap();

    let first = service.get_status(&run.thread_id).await.unwrap();
    let second = service.get_status(&run.thread_id).await.unwrap();
    assert_eq!(first.checkpoint.as_deref(), Some(nodes::PLAN_REVIEW));
    assert_eq!(first.state.node_logs.len(), second.state.node_logs.len());
    assert_eq!(first.state.node_logs.len(), run.state.node_logs.len());
}

#[tokio::test]
async fn test_llm_outage_still_reaches_review() {
    let service = service_with(
        FakeModel::failing(),
        Arc::new(FakeSearch::new()),
        Arc::new(InMemoryCheckpointStore::new()),
    );
    let run = service.start("optics").await.unwrap();

    assert_eq!(run.checkpoint.as_deref(), Some(nodes::PLAN_REVIEW));
    assert!(run.state.extracted_claims.is_empty());
    assert!(run.state.verified_claims.is_empty());
    assert_eq!(run.state.draft_plan.len(), 5);
    assert!(run.state.draft_plan[0].contains("optics"));
    assert_eq!(run.state.node_logs.len(), 6);
}

#[tokio::test]
async fn test_parked_run_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let thread_id = {
        let store = FileCheckpointStore::open(dir.path()).await.unwrap();
        let service = service_with(FakeModel::new(), Arc::new(FakeSearch::new()), Arc::new(store));
        service.start("glaciers").await.unwrap().thread_id
    };

    let store = FileCheckpointStore::open(dir.path()).await.unwrap();
    let search = Arc::new(FakeSearch::new());
    let service = service_with(FakeModel::new(), search.clone(), Arc::new(store));

    let status = service.get_status(&thread_id).await.unwrap();
    assert_eq!(status.checkpoint.as_deref(), Some(nodes::PLAN_REVIEW));

    service.submit_feedback(&thread_id, "approve", "").await.unwrap();
    let done = service.submit_feedback(&thread_id, "approve", "").await.unwrap();
    assert_eq!(done.status, RunStatus::Completed);
    // Nothing before the review point ran a second time
    assert_eq!(search.calls(), 0);
    assert_eq!(count(&done.state.node_trace(), nodes::SEARCH), 1);
}
