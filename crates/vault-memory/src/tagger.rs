//! Tag generation for notes.
//!
//! [`TagGenerator`] asks the remote model for tags and falls back to
//! [`heuristic_tags`] whenever the remote path is disabled, fails, or answers
//! with nothing usable. Callers always get at least one tag.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use vault_core::defaults::{FALLBACK_TAG, MAX_TAGS, TAG_MAX_LEN, TAG_MIN_LEN, TAG_PROMPT_BODY_CHARS};
use vault_core::{clean_tags, is_stop_word, truncate_chars, words};
use vault_inference::{FailureReason, RemoteClient};

/// Where a note's tags came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSource {
    Remote,
    Heuristic,
}

impl TagSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Heuristic => "heuristic",
        }
    }
}

/// Deterministic tags from the note's own words.
///
/// Candidate words are ranked by frequency, then length, then first
/// appearance. The first usable title word always leads.
pub fn heuristic_tags(title: &str, content: &str) -> Vec<String> {
    let usable = |w: &String| {
        let len = w.chars().count();
        (TAG_MIN_LEN..=TAG_MAX_LEN).contains(&len)
            && w.chars().all(|c| c.is_ascii_alphanumeric())
            && !w.chars().all(|c| c.is_ascii_digit())
            && !is_stop_word(w)
    };

    // word -> (count, first position)
    let mut stats: HashMap<String, (usize, usize)> = HashMap::new();
    let text = format!("{} {}", title, content);
    for (pos, word) in words(&text).filter(usable).enumerate() {
        stats.entry(word).or_insert((0, pos)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = stats
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| b.0.chars().count().cmp(&a.0.chars().count()))
            .then_with(|| a.2.cmp(&b.2))
    });

    let lead = words(title).find(|w| usable(w));
    let tags = clean_tags(lead.into_iter().chain(ranked.into_iter().map(|(word, _, _)| word)));

    if tags.is_empty() {
        vec![FALLBACK_TAG.to_string()]
    } else {
        tags
    }
}

/// Prompt asking the remote model for tags.
pub fn tag_prompt(title: &str, content: &str) -> String {
    let title = title.trim();
    let title = if title.is_empty() {
        vault_core::defaults::UNTITLED
    } else {
        title
    };
    let body = truncate_chars(content.trim(), TAG_PROMPT_BODY_CHARS);

    format!(
        "Generate 1-{max} lowercase, single-word tags that describe this note. \
         Respond with the tags only, comma-separated, with no other text.\n\n\
         Title: {title}\n\
         Content: {body}\n\n\
         Tags:",
        max = MAX_TAGS,
        title = title,
        body = body,
    )
}

/// Parse a remote tag suggestion. `None` when no usable tag survives.
pub fn parse_tag_response(text: &str) -> Option<Vec<String>> {
    let mut text = text.trim();
    if text
        .get(..5)
        .is_some_and(|label| label.eq_ignore_ascii_case("tags:"))
    {
        text = &text[5..];
    }

    let tags = clean_tags(
        text.split(|c: char| matches!(c, ',' | ';' | '|') || c.is_whitespace())
            .filter(|t| !t.is_empty()),
    );
    (!tags.is_empty()).then_some(tags)
}

/// Tag generation with remote-first, heuristic-fallback behaviour.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    remote: RemoteClient,
}

impl TagGenerator {
    pub fn new(remote: RemoteClient) -> Self {
        Self { remote }
    }

    /// 1 to 5 tags for a note. Never fails.
    pub async fn generate_tags(&self, title: &str, content: &str) -> Vec<String> {
        self.generate_tags_with_source(title, content).await.0
    }

    #[instrument(skip(self, title, content), fields(subsystem = "memory", component = "tagger", op = "generate_tags"))]
    pub async fn generate_tags_with_source(
        &self,
        title: &str,
        content: &str,
    ) -> (Vec<String>, TagSource) {
        let remote = self
            .remote
            .complete(&tag_prompt(title, content))
            .await
            .into_result()
            .and_then(|text| {
                parse_tag_response(&text).ok_or_else(|| {
                    FailureReason::Unusable(format!("no usable tags in {} chars", text.len()))
                })
            });

        match remote {
            Ok(tags) => {
                debug!(result_count = tags.len(), source = "remote", "Generated tags");
                (tags, TagSource::Remote)
            }
            Err(reason) => {
                let tags = heuristic_tags(title, content);
                match &reason {
                    FailureReason::Disabled(_) => debug!(
                        fallback_reason = reason.label(),
                        result_count = tags.len(),
                        "Using heuristic tags"
                    ),
                    _ => warn!(
                        fallback_reason = reason.label(),
                        error = %reason,
                        result_count = tags.len(),
                        "Remote tagging failed, using heuristic tags"
                    ),
                }
                (tags, TagSource::Heuristic)
            }
        }
    }
}
