//! Tag normalization and the note tag invariant.
//!
//! A note's tags are lowercase single words of ASCII letters and digits,
//! de-duplicated, and at most [`MAX_TAGS`] long. Every path that writes tags
//! goes through [`clean_tags`].

use crate::defaults::{MAX_TAGS, TAG_MAX_LEN, TAG_MIN_LEN};
use crate::tokenizer::words;

/// Normalize one candidate tag, or reject it.
///
/// Surrounding punctuation (`#tag`, `"tag"`, `tag.`) is stripped and the rest
/// lowercased; anything left that is not ASCII alphanumeric, or falls outside
/// the length bounds, is rejected. Accepted tags normalize to themselves.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    if !(TAG_MIN_LEN..=TAG_MAX_LEN).contains(&tag.len()) {
        return None;
    }
    Some(tag)
}

/// Enforce the tag invariant on an arbitrary list: inner whitespace removed,
/// each entry normalized, duplicates dropped keeping first-seen order,
/// truncated to [`MAX_TAGS`].
pub fn clean_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned: Vec<String> = Vec::with_capacity(MAX_TAGS);
    for raw in tags {
        if cleaned.len() == MAX_TAGS {
            break;
        }
        let joined: String = raw.as_ref().split_whitespace().collect();
        if let Some(tag) = normalize_tag(&joined) {
            if !cleaned.contains(&tag) {
                cleaned.push(tag);
            }
        }
    }
    cleaned
}

/// True when `tags` is non-empty and already satisfies the tag invariant.
pub fn is_well_formed(tags: &[String]) -> bool {
    !tags.is_empty() && clean_tags(tags) == tags
}

/// Distinct title words usable as tags, in title order, at most [`MAX_TAGS`].
pub fn title_tokens(title: &str) -> Vec<String> {
    clean_tags(words(title))
}

/// Parse a comma-joined tag column.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Serialize tags for a comma-joined tag column, enforcing the invariant.
pub fn serialize_tags<S: AsRef<str>>(tags: &[S]) -> String {
    clean_tags(tags.iter().map(AsRef::as_ref)).join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag_strips_punctuation() {
        assert_eq!(normalize_tag("#Groceries"), Some("groceries".to_string()));
        assert_eq!(normalize_tag("\"travel\"."), Some("travel".to_string()));
        assert_eq!(normalize_tag("  Work  "), Some("work".to_string()));
    }

    #[test]
    fn test_normalize_tag_rejects_non_words() {
        assert_eq!(normalize_tag("to-do"), None);
        assert_eq!(normalize_tag("a/b"), None);
        assert_eq!(normalize_tag("ok"), None);
        assert_eq!(normalize_tag(&"x".repeat(TAG_MAX_LEN + 1)), None);
        assert_eq!(normalize_tag("!!!"), None);
        assert_eq!(normalize_tag("café"), None);
        assert_eq!(normalize_tag("İstanbul"), None);
    }

    #[test]
    fn test_clean_tags_is_idempotent() {
        let inputs: [&[&str]; 3] = [
            &["İstanbul", "café", "Paris"],
            &["#Work", "WORK", "q3 planning", "Roadmap;", "ÉCOLE", "ok", "notes"],
            &["Straße", "naïve", "résumé", "MIXEDcase", "x2y"],
        ];
        for input in inputs {
            let once = clean_tags(input);
            assert_eq!(clean_tags(&once), once);
            assert!(once.is_empty() || is_well_formed(&once));
        }
        assert_eq!(clean_tags(["İstanbul", "café", "Paris"]), vec!["paris"]);
    }

    #[test]
    fn test_clean_tags_invariants() {
        let tags = clean_tags([
            "Alpha", "beta", "ALPHA", "gamma", "de lta", "epsilon", "zeta", "eta",
        ]);
        assert_eq!(tags, vec!["alpha", "beta", "gamma", "delta", "epsilon"]);
        assert!(tags.len() <= MAX_TAGS);
        assert!(tags.iter().all(|t| t.chars().all(|c| !c.is_uppercase())));
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed(&["work".to_string(), "plans".to_string()]));
        assert!(!is_well_formed(&[]));
        assert!(!is_well_formed(&["Work".to_string()]));
        assert!(!is_well_formed(&["work".to_string(), "work".to_string()]));
        let six: Vec<String> = ["aaa", "bbb", "ccc", "ddd", "eee", "fff"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(!is_well_formed(&six));
    }

    #[test]
    fn test_title_tokens() {
        assert_eq!(
            title_tokens("Q3 Planning: the Roadmap roadmap"),
            vec!["planning", "the", "roadmap"]
        );
        assert!(title_tokens("").is_empty());
    }

    #[test]
    fn test_tag_column_format() {
        assert_eq!(split_tags("work, plans,,ideas "), vec!["work", "plans", "ideas"]);
        assert!(split_tags("").is_empty());
        assert_eq!(serialize_tags(&["Work", "work", "to do"]), "work,todo");
    }
}
