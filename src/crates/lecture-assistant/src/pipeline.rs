//! The lecture research graph.
//!
//! ```text
//! input → search → extract → prioritize → verify → synthesize → [plan_review]
//!   plan_review ─approve─▶ [fact_verification]
//!               └─other──▶ refine ─route_to─▶ search | synthesize | [fact_verification]
//!   fact_verification → final_brief → END
//! ```
//!
//! Bracketed nodes are interrupt points.

use crate::audit::{AuditSink, AuditedStep};
use crate::state::{Decision, RouteTo, RunState};
use crate::steps::{
    ExtractStep, FactVerificationStep, FinalBriefStep, InputStep, PlanReviewStep, PrioritizeStep,
    RefineStep, SearchStep, StepContext, SynthesizeStep, VerifyStep,
};
use std::sync::Arc;
use workflow_core::{CompiledGraph, Result, RouteKey, StateGraph, Step, END};

/// Node names
pub mod nodes {
    pub const INPUT: &str = "input";
    pub const SEARCH: &str = "search";
    pub const EXTRACT: &str = "extract";
    pub const PRIORITIZE: &str = "prioritize";
    pub const VERIFY: &str = "verify";
    pub const SYNTHESIZE: &str = "synthesize";
    pub const PLAN_REVIEW: &str = "plan_review";
    pub const REFINE: &str = "refine";
    pub const FACT_VERIFICATION: &str = "fact_verification";
    pub const FINAL_BRIEF: &str = "final_brief";
}

/// Nodes the engine pauses in front of
pub const INTERRUPT_NODES: [&str; 2] = [nodes::PLAN_REVIEW, nodes::FACT_VERIFICATION];

/// Branch taken after plan review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewOutcome {
    Approve,
    Refine,
}

impl RouteKey for ReviewOutcome {
    fn variants() -> &'static [Self] {
        &[ReviewOutcome::Approve, ReviewOutcome::Refine]
    }
}

/// Approve only on the literal "approve"; anything else, including no
/// feedback at all, goes to refine
pub fn route_after_review(state: &RunState) -> ReviewOutcome {
    match state.human_feedback.decision() {
        Decision::Approve => ReviewOutcome::Approve,
        _ => ReviewOutcome::Refine,
    }
}

/// Pure lookup of the destination chosen by the refine step
pub fn route_after_refine(state: &RunState) -> RouteTo {
    state.route_to
}

fn audited(step: impl Step<RunState> + 'static, audit: &Option<Arc<dyn AuditSink>>) -> AuditedStep {
    AuditedStep::new(Arc::new(step), audit.clone())
}

/// Build the executable graph; attach a checkpoint store before running it
pub fn build_graph(ctx: &StepContext, audit: Option<Arc<dyn AuditSink>>) -> Result<CompiledGraph<RunState>> {
    let mut graph = StateGraph::<RunState>::new();
    graph
        .add_node(nodes::INPUT, audited(InputStep, &audit))
        .add_node(nodes::SEARCH, audited(SearchStep::new(ctx), &audit))
        .add_node(nodes::EXTRACT, audited(ExtractStep::new(ctx), &audit))
        .add_node(nodes::PRIORITIZE, audited(PrioritizeStep, &audit))
        .add_node(nodes::VERIFY, audited(VerifyStep::new(ctx), &audit))
        .add_node(nodes::SYNTHESIZE, audited(SynthesizeStep::new(ctx), &audit))
        .add_node(nodes::PLAN_REVIEW, audited(PlanReviewStep, &audit))
        .add_node(nodes::REFINE, audited(RefineStep, &audit))
        .add_node(nodes::FACT_VERIFICATION, audited(FactVerificationStep, &audit))
        .add_node(nodes::FINAL_BRIEF, audited(FinalBriefStep::new(ctx), &audit))
        .set_entry_point(nodes::INPUT)
        .add_edge(nodes::INPUT, nodes::SEARCH)
        .add_edge(nodes::SEARCH, nodes::EXTRACT)
        .add_edge(nodes::EXTRACT, nodes::PRIORITIZE)
        .add_edge(nodes::PRIORITIZE, nodes::VERIFY)
        .add_edge(nodes::VERIFY, nodes::SYNTHESIZE)
        .add_edge(nodes::SYNTHESIZE, nodes::PLAN_REVIEW)
        .add_conditional_edge(
            nodes::PLAN_REVIEW,
            route_after_review,
            [
                (ReviewOutcome::Approve, nodes::FACT_VERIFICATION),
                (ReviewOutcome::Refine, nodes::REFINE),
            ],
        )
        .add_conditional_edge(
            nodes::REFINE,
            route_after_refine,
            [
                (RouteTo::Search, nodes::SEARCH),
                (RouteTo::Synthesize, nodes::SYNTHESIZE),
                (RouteTo::FactVerification, nodes::FACT_VERIFICATION),
            ],
        )
        .add_edge(nodes::FACT_VERIFICATION, nodes::FINAL_BRIEF)
        .add_edge(nodes::FINAL_BRIEF, END)
        .interrupt_before(INTERRUPT_NODES);

    graph.compile()
}
