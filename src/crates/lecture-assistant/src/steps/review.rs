//! The two human review points.
//!
//! Both nodes sit in the interrupt set: the engine parks in front of them,
//! and their bodies run once the reviewer's feedback has been written.

use crate::pipeline::nodes;
use crate::state::{LogEntry, RunState};
use async_trait::async_trait;
use serde_json::json;
use workflow_core::{Result, Step};

const PRESENTED_CLAIMS: usize = 6;

/// Records that the draft plan went through human review
#[derive(Debug, Default, Clone, Copy)]
pub struct PlanReviewStep;

#[async_trait]
impl Step<RunState> for PlanReviewStep {
    async fn run(&self, mut state: RunState) -> Result<RunState> {
        let feedback = state.human_feedback.clone();
        tracing::info!(decision = %feedback.decision, "Plan review released");
        state.log(
            LogEntry::new(nodes::PLAN_REVIEW)
                .with_inputs(json!({ "plan_items": state.draft_plan.len() }))
                .with_outputs(json!({ "status": "awaiting_human_review" }))
                .with_human_decision(feedback),
        );
        Ok(state)
    }
}

/// Records that the key claims went through human verification
#[derive(Debug, Default, Clone, Copy)]
pub struct FactVerificationStep;

#[async_trait]
impl Step<RunState> for FactVerificationStep {
    async fn run(&self, mut state: RunState) -> Result<RunState> {
        let presented = state.verified_claims.len().min(PRESENTED_CLAIMS);
        let feedback = state.human_feedback.clone();
        tracing::info!(presented, decision = %feedback.decision, "Fact verification released");
        state.log(
            LogEntry::new(nodes::FACT_VERIFICATION)
                .with_inputs(json!({ "claims_presented": presented }))
                .with_outputs(json!({ "status": "awaiting_human_verification" }))
                .with_human_decision(feedback),
        );
        Ok(state)
    }
}
