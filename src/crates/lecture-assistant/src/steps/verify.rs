use super::{truncate_chars, StepContext};
use crate::clients::{LanguageModel, PageFetcher};
use crate::pipeline::nodes;
use crate::prompts::{PromptLibrary, PromptName};
use crate::state::{LogEntry, RunState};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use workflow_core::{Result, Step};

const MAX_CLAIMS: usize = 12;
/// Shorter search content than this triggers a page fetch
const MIN_SOURCE_CHARS: usize = 200;
const PROMPT_SOURCE_CHARS: usize = 2000;
const VERDICT_WINDOW: usize = 100;
const MAX_REASONING_CHARS: usize = 300;
const MAX_EXCERPT_CHARS: usize = 200;

/// Checks each claim against its source text with the LLM
pub struct VerifyStep {
    llm: Arc<dyn LanguageModel>,
    fetcher: Arc<dyn PageFetcher>,
    prompts: Arc<PromptLibrary>,
}

#[derive(Debug, PartialEq)]
pub(crate) struct Verdict {
    pub verified: bool,
    pub reasoning: String,
    pub excerpt: String,
}

/// Interpret a VERDICT/REASONING/EXCERPT answer
pub(crate) fn parse_verdict(response: &str) -> Verdict {
    let verified = truncate_chars(response, VERDICT_WINDOW).to_uppercase().contains("YES");
    let excerpt = match response.split_once("EXCERPT:") {
        Some((_, rest)) if verified => truncate_chars(rest.trim(), MAX_EXCERPT_CHARS),
        _ => String::new(),
    };
    Verdict {
        verified,
        reasoning: truncate_chars(response, MAX_REASONING_CHARS),
        excerpt,
    }
}

impl VerifyStep {
    pub fn new(ctx: &StepContext) -> Self {
        Self {
            llm: Arc::clone(&ctx.llm),
            fetcher: Arc::clone(&ctx.fetcher),
            prompts: Arc::clone(&ctx.prompts),
        }
    }

    async fn source_text(&self, state: &RunState, url: &str) -> Option<String> {
        let from_search = state
            .raw_search_results
            .iter()
            .find(|r| r.url == url && !r.raw_content.is_empty())
            .map(|r| r.raw_content.clone());

        match from_search {
            Some(text) if text.chars().count() >= MIN_SOURCE_CHARS => Some(text),
            _ => self.fetcher.fetch_text(url).await,
        }
    }

    async fn check(&self, claim: &str, source: &str) -> Verdict {
        let source = truncate_chars(source, PROMPT_SOURCE_CHARS);
        let prompt = self
            .prompts
            .render(PromptName::Verify, &[("claim", claim), ("source", source.as_str())]);
        match self.llm.complete(&prompt).await {
            Ok(response) => parse_verdict(&response),
            Err(e) => Verdict {
                verified: false,
                reasoning: format!("Verification error: {e}"),
                excerpt: String::new(),
            },
        }
    }
}

#[async_trait]
impl Step<RunState> for VerifyStep {
    async fn run(&self, mut state: RunState) -> Result<RunState> {
        let checked = state.extracted_claims.len().min(MAX_CLAIMS);
        let mut verified_claims = Vec::new();
        let mut skipped = 0usize;

        for idx in 0..checked {
            let (claim_text, url) = {
                let claim = &state.extracted_claims[idx];
                (claim.claim.clone(), claim.source_url.clone())
            };
            let Some(source) = self.source_text(&state, &url).await else {
                tracing::debug!(url = %url, "No source content, skipping claim");
                skipped += 1;
                continue;
            };

            let verdict = self.check(&claim_text, &source).await;
            let claim = &mut state.extracted_claims[idx];
            claim.verified = verdict.verified;
            claim.verification_reasoning = verdict.reasoning;
            if !verdict.excerpt.is_empty() {
                claim.excerpt = verdict.excerpt;
            }
            if claim.verified {
                verified_claims.push(claim.clone());
            }
        }

        tracing::info!(verified = verified_claims.len(), checked, skipped, "Verified claims");
        let entry = LogEntry::new(nodes::VERIFY)
            .with_inputs(json!({ "total_claims": state.extracted_claims.len() }))
            .with_outputs(json!({ "verified": verified_claims.len(), "checked": checked, "skipped": skipped }))
            .with_model_settings(self.llm.settings());
        state.verified_claims = verified_claims;
        state.log(entry);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verdict_yes_with_excerpt() {
        let verdict = parse_verdict("VERDICT: YES\nREASONING: The source says so.\nEXCERPT: \"gradients flow backwards\"");
        assert!(verdict.verified);
        assert_eq!(verdict.excerpt, "\"gradients flow backwards\"");
        assert!(verdict.reasoning.starts_with("VERDICT: YES"));
    }

    #[test]
    fn test_parse_verdict_no_drops_excerpt() {
        let verdict = parse_verdict("VERDICT: NO\nREASONING: Unrelated.\nEXCERPT: something");
        assert!(!verdict.verified);
        assert!(verdict.excerpt.is_empty());
    }

    #[test]
    fn test_parse_verdict_only_looks_at_opening() {
        let late_yes = format!("VERDICT: NO\n{}YES", " ".repeat(200));
        assert!(!parse_verdict(&late_yes).verified);
        assert!(parse_verdict("verdict: yes").verified);
    }

    #[test]
    fn test_reasoning_is_capped() {
        let long = format!("VERDICT: YES\nREASONING: {}", "a".repeat(1000));
        assert_eq!(parse_verdict(&long).reasoning.chars().count(), MAX_REASONING_CHARS);
    }
}
