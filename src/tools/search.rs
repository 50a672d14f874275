//! DuckDuckGo web search over the HTML endpoint.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{BriefError, Result};
use crate::tool::Tool;

const TOOL_NAME: &str = "web_search";

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_results: usize,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            timeout_secs: 10,
        }
    }
}

/// Web search via DuckDuckGo's HTML interface.
pub struct SearchTool {
    http: reqwest::Client,
    config: SearchConfig,
}

impl SearchTool {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0 (compatible; StockbriefBot/1.0)")
            .build()
            .map_err(|err| BriefError::Tool {
                name: TOOL_NAME.into(),
                source: Box::new(err),
            })?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search the web for a given query and return titled results with snippets."
    }

    async fn run(&self, query: &str) -> Result<String> {
        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| BriefError::Tool {
                name: TOOL_NAME.into(),
                source: Box::new(err),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BriefError::Tool {
                name: TOOL_NAME.into(),
                source: format!("search endpoint returned {status}").into(),
            });
        }

        let html = response.text().await.map_err(|err| BriefError::Tool {
            name: TOOL_NAME.into(),
            source: Box::new(err),
        })?;

        let results = parse_results(&html, self.config.max_results);
        Ok(format_results(query, &results))
    }
}

#[derive(Debug, PartialEq)]
struct SearchResult {
    title: String,
    href: String,
    snippet: String,
}

/// Extract results from the DuckDuckGo HTML page without a full parser.
/// Result links carry class `result__a`; snippets follow under `result__snippet`.
fn parse_results(html: &str, max_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    for (i, chunk) in html.split("result__a").enumerate() {
        if i == 0 || results.len() >= max_results {
            continue;
        }

        let href = chunk
            .split("href=\"")
            .nth(1)
            .and_then(|s| s.split('"').next())
            .unwrap_or("")
            .to_string();

        let title = chunk
            .split_once('>')
            .and_then(|(_, rest)| rest.split("</a>").next())
            .map(strip_tags)
            .unwrap_or_default();

        let snippet = chunk
            .split("result__snippet")
            .nth(1)
            .and_then(|s| s.split_once('>'))
            .and_then(|(_, rest)| rest.split("</a>").next())
            .map(strip_tags)
            .unwrap_or_default();

        if !href.is_empty() && !title.is_empty() && href.starts_with("http") {
            results.push(SearchResult {
                title: html_decode(&title),
                href,
                snippet: html_decode(&snippet),
            });
        }
    }

    results
}

/// An empty result set must stay distinguishable from a transport failure,
/// so it is rendered as explicit text rather than an empty string.
fn format_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No search results found for \"{query}\".");
    }

    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("{}. {} ({})\n", i + 1, result.title, result.href));
        if !result.snippet.is_empty() {
            out.push_str(&format!("   {}\n", result.snippet));
        }
    }
    out
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <a rel="nofollow" class="result__a" href="https://example.com/one">First &amp; Finest</a>
        <a class="result__snippet" href="https://example.com/one">A <b>bold</b> snippet</a>
        <a rel="nofollow" class="result__a" href="https://example.com/two">Second</a>
    "#;

    #[test]
    fn parses_titles_hrefs_and_snippets() {
        let results = parse_results(FIXTURE, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "First & Finest");
        assert_eq!(results[0].href, "https://example.com/one");
        assert_eq!(results[0].snippet, "A bold snippet");
        assert_eq!(results[1].title, "Second");
    }

    #[test]
    fn honors_max_results() {
        let results = parse_results(FIXTURE, 1);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn empty_page_formats_as_explicit_no_results() {
        let results = parse_results("<html></html>", 5);
        let text = format_results("acme corp", &results);
        assert!(text.contains("No search results found"));
        assert!(text.contains("acme corp"));
    }

    #[test]
    fn formats_numbered_results() {
        let results = parse_results(FIXTURE, 5);
        let text = format_results("q", &results);
        assert!(text.starts_with("1. First & Finest (https://example.com/one)"));
        assert!(text.contains("2. Second"));
    }
}
