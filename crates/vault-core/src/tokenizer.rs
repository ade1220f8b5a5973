//! Word tokenization shared by tagging and recall scoring.
//!
//! Tags are generated from, and questions are matched against, the same word
//! stream so that a question word and a tag produced from the same source word
//! always compare equal.

use std::collections::BTreeSet;

use crate::defaults::{ELLIPSIS, TAG_MIN_LEN};

/// Common English words that never make useful tags.
pub const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "all", "also", "and", "any", "are", "because", "been", "before",
    "being", "but", "can", "could", "did", "does", "doing", "done", "down", "each", "few", "for",
    "from", "get", "got", "had", "has", "have", "her", "here", "him", "his", "how", "into",
    "its", "just", "like", "more", "most", "much", "must", "need", "not", "now", "off", "once",
    "only", "other", "our", "out", "over", "own", "same", "she", "should", "some", "still",
    "such", "than", "that", "the", "their", "them", "then", "there", "these", "they", "this",
    "those", "through", "too", "under", "until", "very", "was", "way", "were", "what", "when",
    "where", "which", "while", "who", "why", "will", "with", "would", "you", "your",
];

/// Split text into lowercase alphanumeric words, in order of appearance.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Fold simple English plurals so "groceries" matches "grocery" and "lists" matches "list".
pub fn normalize_token(token: &str) -> String {
    let len = token.chars().count();
    if len > 4 {
        if let Some(stem) = token.strip_suffix("ies") {
            return format!("{}y", stem);
        }
    }
    if len > 3 {
        if let Some(stem) = token.strip_suffix('s') {
            return stem.to_string();
        }
    }
    token.to_string()
}

/// Normalized match tokens for a piece of text: words of at least
/// `TAG_MIN_LEN` characters with plurals folded.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    words(text)
        .filter(|w| w.chars().count() >= TAG_MIN_LEN)
        .map(|w| normalize_token(&w))
        .collect()
}

/// Match tokens for a question: like [`tokenize`], minus stop words.
pub fn query_tokens(text: &str) -> BTreeSet<String> {
    words(text)
        .filter(|w| w.chars().count() >= TAG_MIN_LEN && !is_stop_word(w))
        .map(|w| normalize_token(&w))
        .collect()
}

/// Longest prefix of `text` holding at most `max_chars` characters.
///
/// Always cuts on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Single-line preview of `text`, at most `max_chars` characters long.
///
/// Whitespace runs collapse to one space. Longer text is cut and suffixed with
/// `...` so the result, ellipsis included, still fits in `max_chars`.
pub fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    if keep == 0 {
        return truncate_chars(&collapsed, max_chars).to_string();
    }
    format!("{}{}", truncate_chars(&collapsed, keep).trim_end(), ELLIPSIS)
}
