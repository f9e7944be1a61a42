use crate::pipeline::nodes;
use crate::state::{LogEntry, RunState};
use async_trait::async_trait;
use serde_json::json;
use workflow_core::{Result, Step};

/// Expands the topic into the initial search queries
#[derive(Debug, Default, Clone, Copy)]
pub struct InputStep;

pub(crate) fn initial_queries(topic: &str) -> Vec<String> {
    vec![
        format!("{topic} comprehensive guide"),
        format!("{topic} tutorial explained"),
        format!("{topic} applications examples"),
        format!("{topic} latest developments 2024"),
        format!("how does {topic} work"),
    ]
}

#[async_trait]
impl Step<RunState> for InputStep {
    async fn run(&self, mut state: RunState) -> Result<RunState> {
        let queries = initial_queries(&state.topic);
        tracing::info!(topic = %state.topic, queries = queries.len(), "Generated search queries");

        let entry = LogEntry::new(nodes::INPUT)
            .with_inputs(json!({ "topic": state.topic }))
            .with_outputs(json!({
                "queries_generated": queries.len(),
                "examples": &queries[..2],
            }));
        state.search_queries = queries;
        state.log(entry);
        Ok(state)
    }
}
