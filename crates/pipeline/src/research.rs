//! Research results and their rendering into a generation prompt.

use serde::{Deserialize, Serialize};

use crate::ports::SearchResponse;

/// Maximum characters of each source snippet included in a prompt.
pub const SNIPPET_PROMPT_CHARS: usize = 500;

/// One ranked web source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchSource {
    #[serde(default)]
    pub title: String,
    /// Content snippet.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
    /// Provider relevance score.
    #[serde(default)]
    pub score: f64,
}

/// Everything gathered about one topic. Transient; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchResult {
    pub topic: String,
    pub sources: Vec<ResearchSource>,
    pub summary: Option<String>,
    /// `"{title}: {content}"` per source, separated by blank lines.
    pub raw_content: String,
}

impl ResearchResult {
    /// Builds a result from a provider response.
    pub fn new(topic: impl Into<String>, response: SearchResponse) -> Self {
        let raw_content = response
            .results
            .iter()
            .map(|s| format!("{}: {}", s.title, s.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            topic: topic.into(),
            sources: response.results,
            summary: response.answer.filter(|a| !a.trim().is_empty()),
            raw_content,
        }
    }

    /// Renders the numbered source list embedded in the generation prompt.
    ///
    /// Snippets are cut to [`SNIPPET_PROMPT_CHARS`] characters.
    pub fn to_prompt_context(&self) -> String {
        if self.sources.is_empty() {
            return "No research data available.".to_owned();
        }

        let mut lines = vec![
            format!("Research Topic: {}", self.topic),
            String::new(),
            "Key Information from Web Research:".to_owned(),
            String::new(),
        ];
        for (i, source) in self.sources.iter().enumerate() {
            let title = if source.title.is_empty() {
                "Untitled"
            } else {
                source.title.as_str()
            };
            lines.push(format!("{}. {title}", i + 1));
            if !source.content.is_empty() {
                let snippet: String = source.content.chars().take(SNIPPET_PROMPT_CHARS).collect();
                lines.push(format!("   {snippet}"));
            }
            if !source.url.is_empty() {
                lines.push(format!("   Source: {}", source.url));
            }
            lines.push(String::new());
        }
        lines.join("\n")
    }
}
