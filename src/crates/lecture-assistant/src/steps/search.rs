use super::StepContext;
use crate::clients::SearchProvider;
use crate::pipeline::nodes;
use crate::state::{LogEntry, ModelSettings, RunState};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use workflow_core::{Result, Step};

/// Runs every search query; a failing query is skipped
pub struct SearchStep {
    search: Arc<dyn SearchProvider>,
    max_results: usize,
}

impl SearchStep {
    pub fn new(ctx: &StepContext) -> Self {
        Self {
            search: Arc::clone(&ctx.search),
            max_results: ctx.max_results,
        }
    }
}

#[async_trait]
impl Step<RunState> for SearchStep {
    async fn run(&self, mut state: RunState) -> Result<RunState> {
        let mut results = Vec::new();
        let mut failed = 0usize;

        for (idx, query) in state.search_queries.iter().enumerate() {
            match self.search.search(query, self.max_results).await {
                Ok(found) => {
                    tracing::debug!(query = %query, index = idx + 1, found = found.len(), "Search completed");
                    results.extend(found);
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(query = %query, error = %e, "Search query failed, skipping");
                }
            }
        }

        tracing::info!(total = results.len(), failed, "Search finished");
        let entry = LogEntry::new(nodes::SEARCH)
            .with_inputs(json!({ "queries": state.search_queries }))
            .with_outputs(json!({ "total_results": results.len(), "failed_queries": failed }))
            .with_model_settings(ModelSettings::tool(self.search.name()));
        state.raw_search_results = results;
        state.log(entry);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFetcher, FakeModel, FakeSearch};

    fn ctx(search: FakeSearch) -> StepContext {
        StepContext::new(Arc::new(FakeModel::new()), Arc::new(search), Arc::new(FakeFetcher::empty()))
    }

    #[tokio::test]
    async fn test_search_collects_results_and_skips_failures() {
        let search = FakeSearch::new().failing_on("bad query");
        let step = SearchStep::new(&ctx(search));
        let mut state = RunState::new("optics");
        state.search_queries = vec!["good query".into(), "bad query".into(), "other".into()];

        let state = step.run(state).await.unwrap();
        assert_eq!(state.raw_search_results.len(), 2 * 3);
        let entry = &state.node_logs[0];
        assert_eq!(entry.node, "search");
        assert_eq!(entry.outputs["failed_queries"], 1);
        assert_eq!(entry.model_settings.as_ref().unwrap().provider, "Fake Search");
    }
}
