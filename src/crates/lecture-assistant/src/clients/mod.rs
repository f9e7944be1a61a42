//! Clients for the services the pipeline steps depend on.
//!
//! Each service sits behind a trait so steps receive their collaborators by
//! injection and tests can substitute fakes.

pub mod error;
pub mod fetch;
pub mod llm;
pub mod search;

pub use error::{ClientError, Result};
pub use fetch::{HttpPageFetcher, PageFetcher};
pub use llm::{LanguageModel, OpenAiChatClient};
pub use search::{SearchProvider, TavilyClient};
