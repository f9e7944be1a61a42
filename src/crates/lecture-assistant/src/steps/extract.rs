use super::{strip_code_fences, truncate_chars, StepContext};
use crate::clients::LanguageModel;
use crate::pipeline::nodes;
use crate::prompts::{PromptLibrary, PromptName};
use crate::state::{ClaimWithSource, LogEntry, RunState, SearchResult};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use workflow_core::{Result, Step};

const MAX_SOURCES: usize = 10;
const MAX_CLAIMS: usize = 10;
const SOURCE_CONTEXT_CHARS: usize = 1000;
const MIN_CLAIM_CHARS: usize = 20;
const MAX_EXCERPT_CHARS: usize = 400;

static JSON_ARRAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").unwrap());

/// Asks the LLM for factual claims found in the search results
pub struct ExtractStep {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<PromptLibrary>,
}

impl ExtractStep {
    pub fn new(ctx: &StepContext) -> Self {
        Self {
            llm: Arc::clone(&ctx.llm),
            prompts: Arc::clone(&ctx.prompts),
        }
    }
}

#[derive(Deserialize)]
struct RawClaim {
    #[serde(default)]
    claim: String,
    #[serde(default)]
    source_url: String,
    #[serde(default)]
    source_title: String,
    #[serde(default)]
    excerpt: String,
}

fn source_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .take(MAX_SOURCES)
        .enumerate()
        .map(|(idx, result)| {
            let content = if result.raw_content.is_empty() {
                &result.snippet
            } else {
                &result.raw_content
            };
            format!(
                "SOURCE {}:\nTitle: {}\nURL: {}\nContent: {}\n---",
                idx + 1,
                result.title,
                result.url,
                truncate_chars(content, SOURCE_CONTEXT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Parse the model's JSON array, keeping only well-formed claims
pub(crate) fn parse_claims(response: &str) -> std::result::Result<Vec<ClaimWithSource>, serde_json::Error> {
    let cleaned = strip_code_fences(response);
    let json_text = JSON_ARRAY
        .find(&cleaned)
        .map(|m| m.as_str())
        .unwrap_or(cleaned.as_str());
    let raw: Vec<RawClaim> = serde_json::from_str(json_text)?;

    Ok(raw
        .into_iter()
        .take(MAX_CLAIMS)
        .filter_map(|raw| {
            let claim = raw.claim.trim();
            let url = raw.source_url.trim();
            (claim.chars().count() > MIN_CLAIM_CHARS && !url.is_empty()).then(|| {
                ClaimWithSource::unverified(
                    claim,
                    url,
                    raw.source_title.trim(),
                    truncate_chars(raw.excerpt.trim(), MAX_EXCERPT_CHARS),
                )
            })
        })
        .collect())
}

#[async_trait]
impl Step<RunState> for ExtractStep {
    async fn run(&self, mut state: RunState) -> Result<RunState> {
        let source_count = state.raw_search_results.len();

        if state.raw_search_results.is_empty() {
            tracing::warn!("No search results to extract claims from");
            state.extracted_claims.clear();
            state.log(
                LogEntry::new(nodes::EXTRACT)
                    .with_inputs(json!({ "source_count": 0 }))
                    .with_outputs(json!({ "claims_extracted": 0, "skipped": "no search results" })),
            );
            return Ok(state);
        }

        let prompt = self.prompts.render(
            PromptName::Extract,
            &[
                ("topic", state.topic.as_str()),
                ("sources", source_context(&state.raw_search_results).as_str()),
            ],
        );

        let claims = match self.llm.complete(&prompt).await {
            Ok(response) => parse_claims(&response).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Claim extraction returned malformed JSON");
                Vec::new()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Claim extraction call failed");
                Vec::new()
            }
        };

        tracing::info!(claims = claims.len(), sources = source_count, "Extracted claims");
        let entry = LogEntry::new(nodes::EXTRACT)
            .with_inputs(json!({ "source_count": source_count }))
            .with_outputs(json!({ "claims_extracted": claims.len() }))
            .with_prompt(prompt)
            .with_model_settings(self.llm.settings());
        state.extracted_claims = claims;
        state.log(entry);
        Ok(state)
    }
}
