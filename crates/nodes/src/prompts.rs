//! Prompt text for article generation.

use pipeline::{ResearchResult, EXCERPT_MAX_CHARS, EXCERPT_MIN_CHARS, MAX_WORDS, MIN_WORDS};

/// System instructions sent with every generation request.
pub const SYSTEM_PROMPT: &str = "\
You are a travel writer who knows Parga, Greece and the wider Epirus region \
first-hand: its beaches, tavernas, villages, boat routes and local customs.

Write in a friendly, conversational voice that stays specific and practical. \
Give concrete recommendations, weave search keywords in naturally, and break \
the text up with clear headings so readers can scan it. Your readers are \
visitors planning a trip to Parga.";

/// Builds the user prompt for `topic` with the research rendered as context.
pub fn article_prompt(topic: &str, research: &ResearchResult) -> String {
    let context = research.to_prompt_context();
    format!(
        r#"Write an SEO-focused travel article about this Parga topic.

Topic: {topic}

Research notes (use them for accurate, specific details):
{context}

Requirements:
- Open with a hook, introduce Parga, then cover the topic under <h2> and <h3> headings, and close with a call to action.
- Length {MIN_WORDS}-{MAX_WORDS} words. Mention real places, prices in euros and opening hours where relevant.
- Include practical information: getting there, best time to visit, what to bring.
- Use the main keyword in the title, the first paragraph and two or three headings.
- Format the body as HTML fragments only: <h2>, <h3>, <p>, <ul>/<li>, occasional <strong>. No <html>, <head> or <body>.

Reply with one JSON object and nothing else:
```json
{{
  "title": "SEO title containing the main keyword",
  "content": "<h2>...</h2><p>...</p>",
  "excerpt": "Meta description of {EXCERPT_MIN_CHARS}-{EXCERPT_MAX_CHARS} characters",
  "keywords": ["parga", "main keyword", "related keyword"]
}}
```
The excerpt must be {EXCERPT_MIN_CHARS}-{EXCERPT_MAX_CHARS} characters, the JSON must be valid and escaped, and "parga" must be one of the keywords."#
    )
}
