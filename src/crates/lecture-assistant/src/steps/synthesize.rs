use super::StepContext;
use crate::clients::LanguageModel;
use crate::pipeline::nodes;
use crate::prompts::{PromptLibrary, PromptName};
use crate::state::{LogEntry, RunState};
use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use workflow_core::{Result, Step};

const MIN_VERIFIED_CLAIMS: usize = 3;
const PROMPT_CLAIMS: usize = 15;
const MIN_SECTIONS: usize = 4;
const MAX_SECTIONS: usize = 7;
const MIN_SECTION_CHARS: usize = 15;
const LOGGED_PROMPT_CHARS: usize = 300;

static NUMBERED_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s+\w").unwrap());
static NUMBER_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s+").unwrap());

/// Plan used when there is too little verified evidence to ask the model
pub(crate) fn thin_evidence_plan(topic: &str) -> Vec<String> {
    vec![
        format!("1. **Fundamentals of {topic}:** Core definitions and scope (10 mins)"),
        "2. **Key Technologies:** Technical architecture and components (15 mins)".to_string(),
        format!("3. **Current Applications:** How {topic} is used in industry (15 mins)"),
        "4. **Critical Analysis:** Limitations and challenges (10 mins)".to_string(),
        "5. **Future Outlook:** Emerging trends and research directions (10 mins)".to_string(),
    ]
}

/// Plan used when the model call fails or yields too few sections
pub(crate) fn fallback_plan(topic: &str) -> Vec<String> {
    vec![
        format!("Introduction: Understanding {topic} (10 minutes)"),
        "Foundations: Core concepts and principles (12 minutes)".to_string(),
        format!("Technical Deep Dive: How {topic} works (15 minutes)"),
        "Real-World Applications: Industry use cases (12 minutes)".to_string(),
        "Challenges and Limitations: Current obstacles (8 minutes)".to_string(),
        "Future Directions: Emerging trends (8 minutes)".to_string(),
    ]
}

/// Numbered lines of a model response, with the numbering removed
pub(crate) fn parse_sections(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| NUMBERED_LINE.is_match(line))
        .map(|line| NUMBER_PREFIX.replace(line, "").into_owned())
        .filter(|section| section.chars().count() > MIN_SECTION_CHARS)
        .collect()
}

/// Drafts the lecture plan from the verified claims
pub struct SynthesizeStep {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<PromptLibrary>,
}

impl SynthesizeStep {
    pub fn new(ctx: &StepContext) -> Self {
        Self {
            llm: Arc::clone(&ctx.llm),
            prompts: Arc::clone(&ctx.prompts),
        }
    }

    fn prompt(&self, state: &RunState) -> String {
        let claims = state
            .verified_claims
            .iter()
            .take(PROMPT_CLAIMS)
            .map(|c| format!("• {}", c.claim))
            .collect::<Vec<_>>()
            .join("\n");
        let notes = if state.refinement_notes.trim().is_empty() {
            String::new()
        } else {
            format!("\nReviewer feedback to address: {}\n", state.refinement_notes.trim())
        };
        self.prompts.render(
            PromptName::Synthesize,
            &[
                ("topic", state.topic.as_str()),
                ("claims", claims.as_str()),
                ("notes", notes.as_str()),
            ],
        )
    }
}

#[async_trait]
impl Step<RunState> for SynthesizeStep {
    async fn run(&self, mut state: RunState) -> Result<RunState> {
        let verified = state.verified_claims.len();

        if verified < MIN_VERIFIED_CLAIMS {
            tracing::warn!(verified, "Too few verified claims, using the standard plan");
            state.draft_plan = thin_evidence_plan(&state.topic);
            let entry = LogEntry::new(nodes::SYNTHESIZE)
                .with_inputs(json!({ "verified_claims": verified }))
                .with_outputs(json!({ "plan_sections": state.draft_plan.len(), "fallback": "insufficient_claims" }));
            state.log(entry);
            return Ok(state);
        }

        let prompt = self.prompt(&state);
        let (plan, fallback): (Vec<String>, Option<&str>) = match self.llm.complete(&prompt).await {
            Ok(response) => {
                let sections = parse_sections(&response);
                if sections.len() >= MIN_SECTIONS {
                    (sections.into_iter().take(MAX_SECTIONS).collect(), None)
                } else {
                    tracing::warn!(parsed = sections.len(), "Too few plan sections parsed, using fallback");
                    (fallback_plan(&state.topic), Some("too_few_sections"))
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Plan synthesis call failed, using fallback");
                (fallback_plan(&state.topic), Some("llm_error"))
            }
        };

        tracing::info!(sections = plan.len(), "Drafted lecture plan");
        let mut outputs = json!({ "plan_sections": plan.len() });
        if let Some(reason) = fallback {
            outputs["fallback"] = json!(reason);
        }
        let entry = LogEntry::new(nodes::SYNTHESIZE)
            .with_inputs(json!({
                "verified_claims": verified,
                "refinement_notes": state.refinement_notes,
            }))
            .with_outputs(outputs)
            .with_prompt(super::truncate_chars(&prompt, LOGGED_PROMPT_CHARS))
            .with_model_settings(self.llm.settings());
        state.draft_plan = plan;
        state.log(entry);
        Ok(state)
    }
}
