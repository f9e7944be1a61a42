//! Source page fetching for claim verification.

use super::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Node};
use std::time::Duration;

/// Retrieves the readable text of a web page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// `None` when the page could not be retrieved or had no text
    async fn fetch_text(&self, url: &str) -> Option<String>;
}

const USER_AGENT: &str = "Mozilla/5.0 (compatible; ResearchBot/1.0)";
const MAX_TEXT_CHARS: usize = 5000;
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "nav", "header", "footer"];

pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_text(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url, error = %e, "Page fetch failed");
                return None;
            }
        };
        if response.status() != StatusCode::OK {
            tracing::debug!(url, status = %response.status(), "Page fetch returned non-200");
            return None;
        }
        let html = response.text().await.ok()?;
        let text = extract_text(&html);
        (!text.is_empty()).then_some(text)
    }
}

/// Visible text of an HTML document, whitespace-collapsed and capped
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut words = Vec::new();
    collect_text(document.root_element(), &mut words);
    let text = words.join(" ");
    text.chars().take(MAX_TEXT_CHARS).collect()
}

fn collect_text<'a>(element: ElementRef<'a>, words: &mut Vec<&'a str>) {
    if SKIPPED_ELEMENTS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => words.extend(text.split_whitespace()),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, words);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_drops_chrome_and_collapses_whitespace() {
        let html = r#"<html><head><style>body { color: red }</style></head>
            <body>
              <nav>Home | About</nav>
              <header>Site banner</header>
              <p>Neural   networks
                 learn   representations.</p>
              <script>var x = 1;</script>
              <footer>Copyright</footer>
            </body></html>"#;
        assert_eq!(extract_text(html), "Neural networks learn representations.");
    }

    #[test]
    fn test_extract_text_is_capped() {
        let html = format!("<p>{}</p>", "word ".repeat(3000));
        assert_eq!(extract_text(&html).chars().count(), MAX_TEXT_CHARS);
    }
}
