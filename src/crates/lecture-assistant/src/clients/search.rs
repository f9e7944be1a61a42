//! Web search client.

use super::error::{ClientError, Result};
use crate::state::SearchResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// A web search backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;

    /// Tool name recorded in step log entries
    fn name(&self) -> &str;
}

pub const TAVILY_BASE_URL: &str = "https://api.tavily.com";

/// Tavily search API client
///
/// Requests advanced-depth results with raw page content, which the
/// verification step uses before falling back to fetching the page.
#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ClientError::MissingApiKey("TAVILY_API_KEY"));
        }
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "search_depth": "advanced",
            "include_raw_content": true,
        });

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }

        let parsed: TavilyResponse = response.json().await?;
        Ok(parsed.results.into_iter().map(SearchResult::from).collect())
    }

    fn name(&self) -> &str {
        "Tavily API"
    }
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    raw_content: Option<String>,
    #[serde(default)]
    score: f64,
}

impl From<TavilyResult> for SearchResult {
    fn from(r: TavilyResult) -> Self {
        SearchResult {
            url: r.url,
            title: r.title,
            snippet: r.content,
            raw_content: r.raw_content.unwrap_or_default(),
            score: r.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tavily_result_maps_null_raw_content() {
        let raw = r#"{"results":[{"url":"https://a.edu","title":"A","content":"snippet","raw_content":null,"score":0.9}]}"#;
        let parsed: TavilyResponse = serde_json::from_str(raw).unwrap();
        let results: Vec<SearchResult> = parsed.results.into_iter().map(SearchResult::from).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].snippet, "snippet");
        assert_eq!(results[0].raw_content, "");
        assert_eq!(results[0].score, 0.9);
    }

    #[test]
    fn test_missing_results_field_is_empty() {
        let parsed: TavilyResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }
}
