//! Run State: the record threaded through every pipeline step
//!
//! Every field is always present. Steps receive the whole record and return
//! the whole record; `#[serde(default)]` keeps checkpoints written by older
//! builds loadable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use workflow_core::RouteKey;

/// One hit returned by the search provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub raw_content: String,
    pub score: f64,
}

/// A factual claim together with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimWithSource {
    pub claim: String,
    pub source_url: String,
    #[serde(default)]
    pub source_title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub verification_reasoning: String,
    pub accessed_date: DateTime<Utc>,
}

impl ClaimWithSource {
    /// A freshly extracted, not yet verified claim
    pub fn unverified(
        claim: impl Into<String>,
        source_url: impl Into<String>,
        source_title: impl Into<String>,
        excerpt: impl Into<String>,
    ) -> Self {
        Self {
            claim: claim.into(),
            source_url: source_url.into(),
            source_title: source_title.into(),
            excerpt: excerpt.into(),
            verified: false,
            verification_reasoning: "Not yet verified".to_string(),
            accessed_date: Utc::now(),
        }
    }
}

/// Reviewer decision vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    MoreSources,
    EmphasizeTopic,
    Rework,
    /// Anything else, including an empty decision
    Other(String),
}

impl Decision {
    /// Exact match on the vocabulary; callers trim user input before storing it
    pub fn parse(raw: &str) -> Self {
        match raw {
            "approve" => Decision::Approve,
            "more_sources" => Decision::MoreSources,
            "emphasize_topic" => Decision::EmphasizeTopic,
            "rework" => Decision::Rework,
            other => Decision::Other(other.to_string()),
        }
    }
}

/// Feedback recorded while a run is parked at a review node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanFeedback {
    pub decision: String,
    pub notes: String,
    /// Review node the feedback was given at
    pub checkpoint: Option<String>,
}

impl HumanFeedback {
    pub fn decision(&self) -> Decision {
        Decision::parse(&self.decision)
    }

    pub fn is_empty(&self) -> bool {
        self.decision.is_empty() && self.notes.is_empty() && self.checkpoint.is_none()
    }
}

/// Where execution goes after `refine`
///
/// Any unrecognized stored value loads as [`RouteTo::FactVerification`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTo {
    Search,
    Synthesize,
    #[default]
    FactVerification,
}

impl RouteTo {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "search" => RouteTo::Search,
            "synthesize" => RouteTo::Synthesize,
            _ => RouteTo::FactVerification,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteTo::Search => "search",
            RouteTo::Synthesize => "synthesize",
            RouteTo::FactVerification => "fact_verification",
        }
    }
}

impl<'de> Deserialize<'de> for RouteTo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(RouteTo::parse).unwrap_or_default())
    }
}

impl RouteKey for RouteTo {
    fn variants() -> &'static [Self] {
        &[RouteTo::Search, RouteTo::Synthesize, RouteTo::FactVerification]
    }
}

/// Model or tool that produced a step's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ModelSettings {
    pub fn model(provider: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider: provider.into(),
            model: Some(model.into()),
            temperature: Some(temperature),
        }
    }

    /// A non-LLM external tool such as the search API
    pub fn tool(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: None,
            temperature: None,
        }
    }
}

/// One entry per step execution, appended by the step itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub node: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub inputs: Value,
    #[serde(default)]
    pub outputs: Value,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model_settings: Option<ModelSettings>,
    #[serde(default)]
    pub human_decision: Option<HumanFeedback>,
}

impl LogEntry {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            timestamp: Utc::now(),
            inputs: Value::Object(Default::default()),
            outputs: Value::Object(Default::default()),
            prompt: None,
            model_settings: None,
            human_decision: None,
        }
    }

    pub fn with_inputs(mut self, inputs: Value) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Value) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_model_settings(mut self, settings: ModelSettings) -> Self {
        self.model_settings = Some(settings);
        self
    }

    pub fn with_human_decision(mut self, feedback: HumanFeedback) -> Self {
        self.human_decision = Some(feedback);
        self
    }
}

/// Detailed content of one lecture section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LectureSection {
    pub heading: String,
    pub duration: String,
    pub content: String,
    pub key_points: Vec<String>,
    pub teaching_notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFinding {
    pub finding: String,
    pub citation: String,
    pub source: String,
    pub url: String,
    pub excerpt: String,
}

/// Bibliography entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub title: String,
    pub url: String,
    /// Access date, e.g. "March 04, 2025"
    pub accessed: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appendix {
    pub node_trace: Vec<String>,
    pub research_date: String,
    pub sources_analyzed: usize,
    pub claims_extracted: usize,
    pub claims_verified: usize,
}

/// The deliverable produced by the last step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalBrief {
    pub title: String,
    pub introduction: String,
    pub summary: String,
    pub lecture_plan: Vec<String>,
    pub lecture_sections: Vec<LectureSection>,
    pub key_findings: Vec<KeyFinding>,
    pub risks: Vec<String>,
    pub further_reading: Vec<Reading>,
    pub appendix: Appendix,
}

/// State of one research run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunState {
    pub topic: String,
    pub search_queries: Vec<String>,
    pub raw_search_results: Vec<SearchResult>,
    pub extracted_claims: Vec<ClaimWithSource>,
    pub draft_plan: Vec<String>,
    pub human_feedback: HumanFeedback,
    pub refined_plan: Vec<String>,
    pub verified_claims: Vec<ClaimWithSource>,
    pub final_brief: Option<FinalBrief>,
    pub node_logs: Vec<LogEntry>,
    pub route_to: RouteTo,
    pub refinement_notes: String,
}

impl RunState {
    /// Initial state for a new run: topic set, everything else empty
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Append a step's log entry
    pub fn log(&mut self, entry: LogEntry) {
        self.node_logs.push(entry);
    }

    /// Names of the nodes that have run, in order
    pub fn node_trace(&self) -> Vec<String> {
        self.node_logs.iter().map(|entry| entry.node.clone()).collect()
    }

    /// Plan in effect: the refined plan when present, else the draft
    pub fn current_plan(&self) -> &[String] {
        if self.refined_plan.is_empty() {
            &self.draft_plan
        } else {
            &self.refined_plan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_state_defaults_route_to_fact_verification() {
        let state = RunState::new("graph theory");
        assert_eq!(state.topic, "graph theory");
        assert_eq!(state.route_to, RouteTo::FactVerification);
        assert!(state.human_feedback.is_empty());
        assert!(state.final_brief.is_none());
    }

    #[test]
    fn test_route_to_unknown_value_falls_back() {
        let route: RouteTo = serde_json::from_value(json!("publish")).unwrap();
        assert_eq!(route, RouteTo::FactVerification);
        let route: RouteTo = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(route, RouteTo::FactVerification);
        let route: RouteTo = serde_json::from_value(json!("search")).unwrap();
        assert_eq!(route, RouteTo::Search);
        assert_eq!(serde_json::to_value(RouteTo::FactVerification).unwrap(), json!("fact_verification"));
    }

    #[test]
    fn test_partial_state_loads_with_defaults() {
        let state: RunState = serde_json::from_value(json!({ "topic": "optics" })).unwrap();
        assert_eq!(state.topic, "optics");
        assert!(state.search_queries.is_empty());
        assert_eq!(state.route_to, RouteTo::FactVerification);
    }

    #[test]
    fn test_decision_vocabulary() {
        assert_eq!(Decision::parse("approve"), Decision::Approve);
        assert_eq!(Decision::parse("rework"), Decision::Rework);
        assert_eq!(Decision::parse(" rework "), Decision::Other(" rework ".to_string()));
        assert_eq!(Decision::parse("more_sources"), Decision::MoreSources);
        assert_eq!(Decision::parse("emphasize_topic"), Decision::EmphasizeTopic);
        assert_eq!(Decision::parse(""), Decision::Other(String::new()));
        assert_eq!(Decision::parse("ship it"), Decision::Other("ship it".to_string()));
    }

    #[test]
    fn test_current_plan_prefers_refined() {
        let mut state = RunState::new("t");
        state.draft_plan = vec!["draft".into()];
        assert_eq!(state.current_plan(), ["draft".to_string()]);
        state.refined_plan = vec!["refined".into()];
        assert_eq!(state.current_plan(), ["refined".to_string()]);
    }
}
