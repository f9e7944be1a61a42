use super::{strip_code_fences, StepContext};
use crate::clients::LanguageModel;
use crate::pipeline::nodes;
use crate::prompts::{PromptLibrary, PromptName};
use crate::state::{Appendix, ClaimWithSource, FinalBrief, KeyFinding, LectureSection, LogEntry, Reading, RunState};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use workflow_core::{Result, Step};

const PROMPT_CLAIMS: usize = 25;
const KEY_FINDINGS: usize = 6;
const MAX_READINGS: usize = 10;

/// The model's part of the brief
#[derive(Debug, Deserialize)]
struct DetailedContent {
    executive_summary: Option<String>,
    #[serde(default)]
    sections: Vec<LectureSection>,
    #[serde(default)]
    risks: Vec<String>,
}

impl DetailedContent {
    fn fallback(topic: &str) -> Self {
        Self {
            executive_summary: Some(format!("Overview of {topic}.")),
            sections: Vec::new(),
            risks: vec![
                format!("Complexity in implementing {topic}"),
                format!("Scalability challenges for {topic} systems"),
                "High resource requirements for deployment".to_string(),
            ],
        }
    }
}

fn parse_content(response: &str) -> std::result::Result<DetailedContent, serde_json::Error> {
    let cleaned = strip_code_fences(response);
    let json_text = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => cleaned.as_str(),
    };
    serde_json::from_str(json_text)
}

/// Title-case each whitespace-separated word
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn key_findings(claims: &[ClaimWithSource]) -> Vec<KeyFinding> {
    claims
        .iter()
        .take(KEY_FINDINGS)
        .enumerate()
        .map(|(idx, claim)| KeyFinding {
            finding: claim.claim.clone(),
            citation: format!("[{}]", idx + 1),
            source: claim.source_title.clone(),
            url: claim.source_url.clone(),
            excerpt: claim.excerpt.clone(),
        })
        .collect()
}

/// One entry per distinct source URL, in first-seen order
fn further_reading(claims: &[ClaimWithSource]) -> Vec<Reading> {
    let mut seen = HashSet::new();
    claims
        .iter()
        .filter(|claim| seen.insert(claim.source_url.as_str()))
        .take(MAX_READINGS)
        .map(|claim| Reading {
            title: claim.source_title.clone(),
            url: claim.source_url.clone(),
            accessed: claim.accessed_date.format("%B %d, %Y").to_string(),
        })
        .collect()
}

/// Assembles the final brief from the plan and the verified claims
pub struct FinalBriefStep {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<PromptLibrary>,
}

impl FinalBriefStep {
    pub fn new(ctx: &StepContext) -> Self {
        Self {
            llm: Arc::clone(&ctx.llm),
            prompts: Arc::clone(&ctx.prompts),
        }
    }
}

#[async_trait]
impl Step<RunState> for FinalBriefStep {
    async fn run(&self, mut state: RunState) -> Result<RunState> {
        let plan = state.current_plan().to_vec();
        let claims_text = state
            .verified_claims
            .iter()
            .take(PROMPT_CLAIMS)
            .map(|c| format!("- {} (Source: {})", c.claim, c.source_title))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = self.prompts.render(
            PromptName::Content,
            &[
                ("topic", state.topic.as_str()),
                ("plan", plan.join("\n").as_str()),
                ("claims", claims_text.as_str()),
            ],
        );

        let content = match self.llm.complete(&prompt).await {
            Ok(response) => parse_content(&response).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Brief content was not valid JSON, using fallback");
                DetailedContent::fallback(&state.topic)
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Brief content call failed, using fallback");
                DetailedContent::fallback(&state.topic)
            }
        };

        let verified = state.verified_claims.len();
        let mut node_trace = state.node_trace();
        node_trace.push(nodes::FINAL_BRIEF.to_string());

        let brief = FinalBrief {
            title: format!("Comprehensive Lecture Plan: {}", title_case(&state.topic)),
            introduction: format!(
                "Generated lecture plan for {} based on {} verified sources.",
                state.topic, verified
            ),
            summary: content
                .executive_summary
                .unwrap_or_else(|| format!("A comprehensive guide to {}.", state.topic)),
            lecture_plan: plan.clone(),
            lecture_sections: content.sections,
            key_findings: key_findings(&state.verified_claims),
            risks: content.risks,
            further_reading: further_reading(&state.verified_claims),
            appendix: Appendix {
                node_trace,
                research_date: Utc::now().format("%B %d, %Y at %I:%M %p").to_string(),
                sources_analyzed: state.raw_search_results.len(),
                claims_extracted: state.extracted_claims.len(),
                claims_verified: verified,
            },
        };

        tracing::info!(
            sections = brief.lecture_sections.len(),
            findings = brief.key_findings.len(),
            "Final brief generated"
        );
        let entry = LogEntry::new(nodes::FINAL_BRIEF)
            .with_inputs(json!({ "plan_sections": plan.len() }))
            .with_outputs(json!({ "brief_generated": true }))
            .with_prompt(prompt)
            .with_model_settings(self.llm.settings());
        state.final_brief = Some(brief);
        state.log(entry);
        Ok(state)
    }
}
