use crate::pipeline::nodes;
use crate::state::{ClaimWithSource, LogEntry, RunState};
use async_trait::async_trait;
use serde_json::json;
use workflow_core::{Result, Step};

const AUTHORITATIVE_MARKERS: [&str; 12] = [
    ".edu",
    ".gov",
    ".org",
    "arxiv.org",
    "ieee.org",
    "acm.org",
    "nature.com",
    "sciencedirect.com",
    "springer.com",
    "wikipedia.org",
    "research.",
    "scholar.",
];

pub(crate) fn is_authoritative(url: &str) -> bool {
    let url = url.to_lowercase();
    AUTHORITATIVE_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Moves claims from authoritative sources to the front, keeping relative order
#[derive(Debug, Default, Clone, Copy)]
pub struct PrioritizeStep;

#[async_trait]
impl Step<RunState> for PrioritizeStep {
    async fn run(&self, mut state: RunState) -> Result<RunState> {
        let (mut front, back): (Vec<ClaimWithSource>, Vec<ClaimWithSource>) =
            std::mem::take(&mut state.extracted_claims)
                .into_iter()
                .partition(|claim| is_authoritative(&claim.source_url));
        let (prioritized, regular) = (front.len(), back.len());
        front.extend(back);
        state.extracted_claims = front;

        tracing::info!(prioritized, regular, "Prioritized claims");
        state.log(
            LogEntry::new(nodes::PRIORITIZE)
                .with_inputs(json!({ "total_claims": prioritized + regular }))
                .with_outputs(json!({ "prioritized": prioritized, "regular": regular })),
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(url: &str) -> ClaimWithSource {
        ClaimWithSource::unverified(format!("claim from {url} that is long enough"), url, "t", "")
    }

    #[test]
    fn test_authoritative_markers() {
        assert!(is_authoritative("https://cs.stanford.EDU/page"));
        assert!(is_authoritative("https://arxiv.org/abs/1234"));
        assert!(is_authoritative("https://research.google/blog"));
        assert!(!is_authoritative("https://medium.com/post"));
    }

    #[tokio::test]
    async fn test_partition_is_stable() {
        let mut state = RunState::new("t");
        state.extracted_claims = vec![
            claim("https://blog.example.com/a"),
            claim("https://mit.edu/b"),
            claim("https://news.example.com/c"),
            claim("https://nature.com/d"),
        ];
        let state = PrioritizeStep.run(state).await.unwrap();
        let urls: Vec<&str> = state.extracted_claims.iter().map(|c| c.source_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://mit.edu/b",
                "https://nature.com/d",
                "https://blog.example.com/a",
                "https://news.example.com/c",
            ]
        );
        assert_eq!(state.node_logs[0].outputs["prioritized"], 2);
    }
}
