use crate::pipeline::nodes;
use crate::state::{Decision, LogEntry, RouteTo, RunState};
use async_trait::async_trait;
use serde_json::json;
use workflow_core::{Result, Step};

/// Applies the reviewer's decision and picks where the run goes next
///
/// The chosen destination is written to `route_to`; the router after this
/// node only reads it.
#[derive(Debug, Default, Clone, Copy)]
pub struct RefineStep;

fn more_sources_queries(topic: &str, notes: &str) -> Vec<String> {
    if notes.is_empty() {
        vec![
            format!("{topic} advanced topics"),
            format!("{topic} detailed guide"),
            format!("{topic} comprehensive overview"),
        ]
    } else {
        vec![
            format!("{topic} {notes}"),
            format!("{topic} {notes} detailed"),
            format!("{topic} {notes} examples"),
        ]
    }
}

fn with_emphasis(plan: &[String], notes: &str) -> Vec<String> {
    let mut refined = plan.to_vec();
    if !notes.is_empty() {
        let at = refined.len().min(1);
        refined.insert(at, format!("Special Focus: {notes} (15 minutes)"));
    }
    refined
}

#[async_trait]
impl Step<RunState> for RefineStep {
    async fn run(&self, mut state: RunState) -> Result<RunState> {
        let feedback = state.human_feedback.clone();
        let notes = feedback.notes.trim().to_string();

        state.route_to = match feedback.decision() {
            Decision::MoreSources => {
                state.search_queries = more_sources_queries(&state.topic, &notes);
                RouteTo::Search
            }
            Decision::EmphasizeTopic => {
                state.refined_plan = with_emphasis(&state.draft_plan, &notes);
                RouteTo::FactVerification
            }
            Decision::Rework => {
                state.refinement_notes = notes.clone();
                RouteTo::Synthesize
            }
            Decision::Approve => {
                tracing::warn!("Approved plan reached refine, continuing to fact verification");
                state.refined_plan = state.draft_plan.clone();
                RouteTo::FactVerification
            }
            Decision::Other(other) => {
                tracing::warn!(decision = %other, "Unrecognized decision, continuing to fact verification");
                state.refined_plan = state.draft_plan.clone();
                RouteTo::FactVerification
            }
        };

        tracing::info!(decision = %feedback.decision, route_to = state.route_to.as_str(), "Refined plan");
        state.log(
            LogEntry::new(nodes::REFINE)
                .with_inputs(json!({ "decision": feedback.decision, "notes": notes }))
                .with_outputs(json!({ "route_to": state.route_to }))
                .with_human_decision(feedback),
        );
        Ok(state)
    }
}
