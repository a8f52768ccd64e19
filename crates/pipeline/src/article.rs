//! Extraction and normalisation of generated articles.
//!
//! The generation provider returns free text that must contain a JSON object
//! with exactly the keys `title`, `content`, `excerpt` and `keywords`,
//! optionally fenced in a Markdown code block. Anything else is
//! [`FailureKind::Malformed`](crate::retry::FailureKind::Malformed).
//!
//! Normalisation then enforces the article invariants:
//!
//! - excerpts longer than [`EXCERPT_MAX_CHARS`] are cut to `max - 3`
//!   characters plus `"..."`; shorter than [`EXCERPT_MIN_CHARS`] only warns;
//! - [`REQUIRED_KEYWORD`] is present (ignoring case), inserted first if not;
//! - the word count is taken from the body with HTML tags stripped.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::retry::ProviderFailure;
use crate::types::TokenCount;

pub const REQUIRED_KEYWORD: &str = "parga";
pub const EXCERPT_MIN_CHARS: usize = 150;
pub const EXCERPT_MAX_CHARS: usize = 160;
pub const MIN_WORDS: usize = 800;
pub const MAX_WORDS: usize = 1500;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("valid regex"));
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// The structured payload embedded in model output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArticlePayload {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub keywords: Vec<String>,
}

/// Pulls the [`ArticlePayload`] out of raw model output.
pub fn extract_payload(raw: &str) -> Result<ArticlePayload, ProviderFailure> {
    let json = match FENCED_BLOCK.captures(raw).and_then(|c| c.get(1)) {
        Some(block) => block.as_str().trim(),
        None => raw.trim(),
    };
    serde_json::from_str(json)
        .map_err(|e| ProviderFailure::malformed(format!("article payload is not valid: {e}")))
}

/// A validated, normalised article ready to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleResult {
    pub title: String,
    /// HTML body.
    pub content: String,
    pub excerpt: String,
    pub keywords: Vec<String>,
    pub word_count: usize,
    pub tokens_used: TokenCount,
}

impl ArticleResult {
    /// Applies the article invariants to a payload.
    pub fn from_payload(payload: ArticlePayload, tokens_used: TokenCount) -> Self {
        let ArticlePayload {
            title,
            content,
            excerpt,
            mut keywords,
        } = payload;

        let excerpt = bound_excerpt(excerpt);
        ensure_required_keyword(&mut keywords);

        let word_count = count_words(&content);
        if word_count < MIN_WORDS {
            warn!(word_count, minimum = MIN_WORDS, "article is shorter than the target length");
        } else if word_count > MAX_WORDS {
            warn!(word_count, maximum = MAX_WORDS, "article is longer than the target length");
        } else {
            debug!(word_count, "article length within range");
        }

        Self {
            title,
            content,
            excerpt,
            keywords,
            word_count,
            tokens_used,
        }
    }
}

/// Truncates an over-long excerpt; short excerpts are kept and only logged.
pub fn bound_excerpt(excerpt: String) -> String {
    let length = excerpt.chars().count();
    if length > EXCERPT_MAX_CHARS {
        let mut cut: String = excerpt.chars().take(EXCERPT_MAX_CHARS - 3).collect();
        cut.push_str("...");
        info!(from = length, to = EXCERPT_MAX_CHARS, "excerpt truncated");
        cut
    } else {
        if length < EXCERPT_MIN_CHARS {
            warn!(length, minimum = EXCERPT_MIN_CHARS, "excerpt is too short");
        }
        excerpt
    }
}

/// Inserts [`REQUIRED_KEYWORD`] at the front unless present in any case.
pub fn ensure_required_keyword(keywords: &mut Vec<String>) {
    if !keywords.iter().any(|k| k.eq_ignore_ascii_case(REQUIRED_KEYWORD)) {
        keywords.insert(0, REQUIRED_KEYWORD.to_owned());
    }
}

/// Whitespace-separated words of `html` with tags replaced by spaces.
pub fn count_words(html: &str) -> usize {
    HTML_TAG.replace_all(html, " ").split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::FailureKind;

    const PAYLOAD: &str = r#"{"title": "Valtos Beach Guide", "content": "<h2>Valtos</h2><p>Clear water.</p>",
        "excerpt": "Short.", "keywords": ["valtos beach", "PARGA"]}"#;

    #[test]
    fn reads_fenced_and_bare_payloads() {
        let fenced = format!("Here is your article:\n```json\n{PAYLOAD}\n```\nEnjoy!");
        assert_eq!(extract_payload(&fenced).unwrap().title, "Valtos Beach Guide");
        assert_eq!(extract_payload(PAYLOAD).unwrap().keywords.len(), 2);
    }

    #[test]
    fn rejects_unexpected_shapes_as_malformed() {
        let missing = r#"{"title": "T", "content": "C", "excerpt": "E"}"#;
        let extra = r#"{"title": "T", "content": "C", "excerpt": "E", "keywords": [], "slug": "t"}"#;
        for raw in [missing, extra, "I could not write that article."] {
            let failure = extract_payload(raw).unwrap_err();
            assert_eq!(failure.kind, FailureKind::Malformed, "{raw}");
        }
    }

    #[test]
    fn long_excerpts_are_cut_to_the_maximum() {
        let long = "a".repeat(EXCERPT_MAX_CHARS + 40);
        let bounded = bound_excerpt(long);
        assert_eq!(bounded.chars().count(), EXCERPT_MAX_CHARS);
        assert!(bounded.ends_with("..."));
        assert_eq!(&bounded[..EXCERPT_MAX_CHARS - 3], "a".repeat(EXCERPT_MAX_CHARS - 3));

        let short = "Too short".to_owned();
        assert_eq!(bound_excerpt(short.clone()), short);
    }

    #[test]
    fn required_keyword_goes_first_when_missing() {
        let mut keywords = vec!["valtos".to_owned()];
        ensure_required_keyword(&mut keywords);
        assert_eq!(keywords, vec!["parga", "valtos"]);

        let mut present = vec!["valtos".to_owned(), "Parga".to_owned()];
        ensure_required_keyword(&mut present);
        assert_eq!(present, vec!["valtos", "Parga"]);
    }

    #[test]
    fn words_are_counted_without_markup() {
        assert_eq!(count_words("<h2>Hello</h2><p>two words<br/>and more</p>"), 5);
    }

    #[test]
    fn payload_normalisation_keeps_existing_keyword() {
        let article = ArticleResult::from_payload(
            extract_payload(PAYLOAD).unwrap(),
            TokenCount::new(1200),
        );
        assert_eq!(article.keywords, vec!["valtos beach", "PARGA"]);
        assert_eq!(article.excerpt, "Short.");
        assert_eq!(article.word_count, 3);
        assert_eq!(article.tokens_used.as_u64(), 1200);
    }
}
