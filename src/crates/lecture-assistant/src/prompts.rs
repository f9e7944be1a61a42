//! Prompt templates for the LLM-backed steps.
//!
//! Templates use `{name}` placeholders. Built-in defaults ship with the crate;
//! a prompts directory may override any of them with `<name>.txt`.

use std::collections::HashMap;
use std::path::Path;

/// The templates the pipeline renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptName {
    Extract,
    Synthesize,
    Content,
    Verify,
}

impl PromptName {
    pub const ALL: [PromptName; 4] = [
        PromptName::Extract,
        PromptName::Synthesize,
        PromptName::Content,
        PromptName::Verify,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptName::Extract => "extract",
            PromptName::Synthesize => "synthesize",
            PromptName::Content => "content",
            PromptName::Verify => "verify",
        }
    }

    fn builtin(&self) -> &'static str {
        match self {
            PromptName::Extract => EXTRACT,
            PromptName::Synthesize => SYNTHESIZE,
            PromptName::Content => CONTENT,
            PromptName::Verify => VERIFY,
        }
    }
}

const EXTRACT: &str = "You are a research analyst extracting factual claims about {topic}.

Read the sources below and extract up to 10 specific, verifiable factual claims.
Every claim must be supported by the source it cites.

Sources:
{sources}

Respond with a JSON array only. Each element must have the keys
\"claim\", \"source_url\", \"source_title\" and \"excerpt\" (the supporting passage).";

const SYNTHESIZE: &str = "You are designing a university lecture on {topic}.

Verified findings:
{claims}
{notes}
Write a lecture plan of 5 to 7 sections. Put each section on its own numbered
line in the form \"1. Section title: what it covers (N minutes)\".";

const CONTENT: &str = "You are writing the detailed content for a lecture on {topic}.

Lecture plan:
{plan}

Verified findings:
{claims}

Respond with a JSON object with the keys:
\"executive_summary\": a short paragraph,
\"sections\": an array of objects with \"heading\", \"duration\", \"content\", \"key_points\" and \"teaching_notes\",
\"risks\": an array of strings describing risks and limitations.";

const VERIFY: &str = "You are a fact-checker. Decide whether the source text supports the claim.

Claim: {claim}

Source text:
{source}

Answer in exactly this format:
VERDICT: YES or NO
REASONING: one or two sentences
EXCERPT: the supporting passage, quoted from the source";

/// Rendered-on-demand prompt templates
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    overrides: HashMap<PromptName, String>,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptLibrary {
    /// Library with only the built-in templates
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }

    /// Built-in templates overridden by any `<name>.txt` found in `dir`
    pub fn load_dir(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        let mut library = Self::new();
        for name in PromptName::ALL {
            let path = dir.join(format!("{}.txt", name.as_str()));
            if path.is_file() {
                let template = std::fs::read_to_string(&path)?;
                tracing::info!(prompt = name.as_str(), path = %path.display(), "Loaded prompt override");
                library.overrides.insert(name, template);
            }
        }
        Ok(library)
    }

    pub fn with_template(mut self, name: PromptName, template: impl Into<String>) -> Self {
        self.overrides.insert(name, template.into());
        self
    }

    pub fn template(&self, name: PromptName) -> &str {
        self.overrides
            .get(&name)
            .map(String::as_str)
            .unwrap_or_else(|| name.builtin())
    }

    /// Substitute `{key}` placeholders; unknown placeholders are left as-is
    pub fn render(&self, name: PromptName, vars: &[(&str, &str)]) -> String {
        let mut out = self.template(name).to_string();
        for (key, value) in vars {
            out = out.replace(&format!("{{{key}}}"), value);
        }
        out
    }
}
