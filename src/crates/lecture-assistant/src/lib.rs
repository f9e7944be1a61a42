//! # lecture-assistant - Human-in-the-loop lecture research
//!
//! Given a topic, the pipeline searches the web, extracts factual claims,
//! verifies them against their sources, and drafts a lecture plan. It then
//! pauses twice for a human reviewer (once on the plan, once on the evidence)
//! before assembling a cited [`FinalBrief`](state::FinalBrief).
//!
//! Runs are threads of a [`workflow_core::CompiledGraph`]; every step is
//! checkpointed, so a run parked for review survives a restart when a
//! file-backed store is configured.
//!
//! ```text
//! api (axum) ──▶ service::ResearchService ──▶ pipeline::build_graph
//!                                                   │
//!                      steps::* ◀───────────────────┘
//!                         │
//!                         ▼
//!              clients::{LanguageModel, SearchProvider, PageFetcher}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lecture_assistant::pipeline::build_graph;
//! use lecture_assistant::service::ResearchService;
//! use lecture_assistant::steps::StepContext;
//! use lecture_assistant::testing::{FakeFetcher, FakeModel, FakeSearch};
//! use workflow_checkpoint::InMemoryCheckpointStore;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let ctx = StepContext::new(
//!     Arc::new(FakeModel::new()),
//!     Arc::new(FakeSearch::new()),
//!     Arc::new(FakeFetcher::empty()),
//! );
//! let graph = build_graph(&ctx, None)?;
//! let service = ResearchService::with_store(graph, Arc::new(InMemoryCheckpointStore::new()));
//!
//! let run = service.start("plate tectonics").await?;
//! service.submit_feedback(&run.thread_id, "approve", "").await?;
//! let done = service.submit_feedback(&run.thread_id, "approve", "").await?;
//! assert!(done.state.final_brief.is_some());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod audit;
pub mod clients;
pub mod config;
pub mod export;
pub mod pipeline;
pub mod prompts;
pub mod service;
pub mod state;
pub mod steps;
pub mod testing;

pub use config::AppConfig;
pub use pipeline::build_graph;
pub use service::{ResearchService, RunReport, ServiceError};
pub use state::{FinalBrief, RunState};
