//! Local keyword ranking used when the remote model cannot answer.

use std::collections::BTreeSet;

use tracing::trace;

use vault_core::defaults::{RECALL_LIMIT, TAG_WEIGHT, TEXT_WEIGHT};
use vault_core::{query_tokens, tokenize, IndexEntry, QueryResult};

use crate::messages;

/// An index entry with its relevance score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredEntry<'a> {
    pub entry: &'a IndexEntry,
    pub score: u32,
}

/// Score one entry against already-tokenized question words.
pub fn score_entry(question: &BTreeSet<String>, entry: &IndexEntry) -> u32 {
    let tag_tokens = tokenize(&entry.tags.join(" "));
    let text_tokens = tokenize(&format!("{} {}", entry.title, entry.preview));

    let tag_hits = question.intersection(&tag_tokens).count() as u32;
    let text_hits = question.intersection(&text_tokens).count() as u32;
    TAG_WEIGHT * tag_hits + TEXT_WEIGHT * text_hits
}

/// Entries with a positive score, best first, at most [`RECALL_LIMIT`].
///
/// Equal scores keep pinned entries first and then index order.
pub fn rank<'a>(question: &str, index: &'a [IndexEntry]) -> Vec<ScoredEntry<'a>> {
    let tokens = query_tokens(question);
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<ScoredEntry<'a>> = index
        .iter()
        .map(|entry| {
            let score = score_entry(&tokens, entry);
            trace!(note_id = entry.id, score, "Scored entry");
            ScoredEntry { entry, score }
        })
        .filter(|s| s.score > 0)
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.entry.pinned.cmp(&a.entry.pinned))
    });
    scored.truncate(RECALL_LIMIT);
    scored
}

/// Rank locally and phrase the result. Never fails; no match is an empty result.
pub fn score_and_rank(question: &str, index: &[IndexEntry]) -> QueryResult {
    let ranked = rank(question, index);
    if ranked.is_empty() {
        return QueryResult::empty(messages::NO_MATCH);
    }
    QueryResult {
        matched_ids: ranked.iter().map(|s| s.entry.id).collect(),
        answer: summarize(ranked.iter().map(|s| s.entry)),
    }
}

/// Human-readable listing of matched entries.
///
/// Each line carries the entry's index preview, or its title when the note
/// has no body.
pub fn summarize<'a>(entries: impl IntoIterator<Item = &'a IndexEntry>) -> String {
    let lines: Vec<String> = entries
        .into_iter()
        .take(RECALL_LIMIT)
        .map(|entry| {
            let tags: String = entry.tags.iter().map(|t| format!(" #{}", t)).collect();
            let detail = if entry.preview.is_empty() {
                &entry.title
            } else {
                &entry.preview
            };
            format!("- [{}] {}{} \u{2014} {}", entry.id, entry.title, tags, detail)
        })
        .collect();

    if lines.is_empty() {
        return messages::NO_MATCH.to_string();
    }
    format!("{}\n{}", messages::SURFACED_HEADER, lines.join("\n"))
}
