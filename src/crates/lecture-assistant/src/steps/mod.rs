//! Pipeline step functions
//!
//! Every step is a struct implementing [`Step<RunState>`](workflow_core::Step)
//! whose collaborators come in through its constructor. Steps contain their
//! own failures: a failed search, LLM call, or fetch degrades to an empty or
//! fallback result, and the step still appends exactly one [`LogEntry`]
//! describing what it did.
//!
//! [`LogEntry`]: crate::state::LogEntry

mod extract;
mod final_brief;
mod input;
mod prioritize;
mod refine;
mod review;
mod search;
mod synthesize;
mod verify;

pub use extract::ExtractStep;
pub use final_brief::FinalBriefStep;
pub use input::InputStep;
pub use prioritize::PrioritizeStep;
pub use refine::RefineStep;
pub use review::{FactVerificationStep, PlanReviewStep};
pub use search::SearchStep;
pub use synthesize::SynthesizeStep;
pub use verify::VerifyStep;

use crate::clients::{LanguageModel, PageFetcher, SearchProvider};
use crate::prompts::PromptLibrary;
use std::sync::Arc;

/// Collaborators shared by the steps
#[derive(Clone)]
pub struct StepContext {
    pub llm: Arc<dyn LanguageModel>,
    pub search: Arc<dyn SearchProvider>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub prompts: Arc<PromptLibrary>,
    /// Results requested per search query
    pub max_results: usize,
}

impl StepContext {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            llm,
            search,
            fetcher,
            prompts: Arc::new(PromptLibrary::new()),
            max_results: 3,
        }
    }

    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Arc::new(prompts);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

/// First `max` characters of `text`
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Remove Markdown code fences an LLM may wrap around JSON
pub(crate) fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}
