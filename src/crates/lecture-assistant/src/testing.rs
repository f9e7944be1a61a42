//! In-process stand-ins for the external services.
//!
//! Used by the test suites and handy for running the pipeline offline. The
//! fake model recognizes each built-in prompt by its opening line and answers
//! in the format the matching step parses.

use crate::clients::{ClientError, LanguageModel, PageFetcher, Result, SearchProvider};
use crate::state::{ModelSettings, SearchResult};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted language model
#[derive(Debug, Default)]
pub struct FakeModel {
    fail: bool,
    reject_claims: bool,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails, as if the provider were down
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Verification answers NO for every claim
    pub fn rejecting_claims() -> Self {
        Self {
            reject_claims: true,
            ..Self::default()
        }
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn claims_for(prompt: &str) -> String {
        let mut titles = prompt.lines().filter_map(|l| l.strip_prefix("Title: "));
        let claims: Vec<_> = prompt
            .lines()
            .filter_map(|l| l.strip_prefix("URL: "))
            .enumerate()
            .map(|(idx, url)| {
                let title = titles.next().unwrap_or("Untitled");
                json!({
                    "claim": format!("Finding {} reported by {title} about the topic", idx + 1),
                    "source_url": url,
                    "source_title": title,
                    "excerpt": format!("Supporting passage {}", idx + 1),
                })
            })
            .collect();
        format!("```json\n{}\n```", serde_json::Value::Array(claims))
    }

    fn plan_for(prompt: &str) -> String {
        let mut plan = vec![
            "1. Introduction: Why the topic matters (10 minutes)",
            "2. Core Concepts: Definitions and building blocks (15 minutes)",
            "3. Mechanisms: How it works in detail (15 minutes)",
            "4. Applications: Where it is used today (10 minutes)",
            "5. Outlook: Open problems and next steps (10 minutes)",
        ]
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
        if prompt.contains("Reviewer feedback to address") {
            plan.push("6. Revisited: Material added after review (10 minutes)".to_string());
        }
        format!("Here is the plan:\n{}", plan.join("\n"))
    }

    fn content_for() -> String {
        json!({
            "executive_summary": "A structured lecture grounded in verified sources.",
            "sections": [
                {
                    "heading": "Introduction",
                    "duration": "10 minutes",
                    "content": "Motivation and scope.",
                    "key_points": ["Scope"],
                    "teaching_notes": ["Open with a question"]
                }
            ],
            "risks": ["Sources may date quickly"]
        })
        .to_string()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if self.fail {
            return Err(ClientError::Api {
                status: 503,
                body: "model unavailable".to_string(),
            });
        }

        let response = if prompt.starts_with("You are a research analyst") {
            Self::claims_for(prompt)
        } else if prompt.starts_with("You are designing a university lecture") {
            Self::plan_for(prompt)
        } else if prompt.starts_with("You are writing the detailed content") {
            Self::content_for()
        } else if prompt.starts_with("You are a fact-checker") {
            if self.reject_claims {
                "VERDICT: NO\nREASONING: The source does not mention this.\nEXCERPT:".to_string()
            } else {
                "VERDICT: YES\nREASONING: The source states this directly.\nEXCERPT: quoted support".to_string()
            }
        } else {
            String::new()
        };
        Ok(response)
    }

    fn settings(&self) -> ModelSettings {
        ModelSettings::model("fake", "fake-model", 0.0)
    }
}

/// Deterministic search backend: every query yields `max_results` hits
#[derive(Debug, Default)]
pub struct FakeSearch {
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make one query fail
    pub fn failing_on(mut self, query: impl Into<String>) -> Self {
        self.failing.insert(query.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(query) {
            return Err(ClientError::Api {
                status: 429,
                body: "rate limited".to_string(),
            });
        }

        let slug = query.replace(' ', "-");
        Ok((0..max_results)
            .map(|idx| SearchResult {
                url: format!("https://source{idx}.edu/{slug}"),
                title: format!("Source {idx} on {query}"),
                snippet: format!("Snippet about {query}"),
                raw_content: format!("Full article about {query}. ").repeat(20),
                score: 1.0 - idx as f64 * 0.1,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Fake Search"
    }
}

/// Page fetcher serving a fixed set of pages
#[derive(Debug, Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
}

impl FakeFetcher {
    /// Every fetch returns nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.pages.insert(url.into(), text.into());
        self
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch_text(&self, url: &str) -> Option<String> {
        self.pages.get(url).cloned()
    }
}
