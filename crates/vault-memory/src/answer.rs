//! Remote answering of recall questions.
//!
//! The model is asked for `{"ids": [...], "answer": "..."}` but frequently
//! wraps it in prose or code fences, or ignores the format entirely. Parsing
//! therefore runs a chain of increasingly loose strategies:
//!
//! 1. the whole reply as strict JSON
//! 2. the first balanced `{...}` fragment as strict JSON
//! 3. bracketed ids like `[3]`, else bare integers
//!
//! An object carrying an `ids` key ends the chain, even when the list is
//! empty. Ids are scraped only from prose: from the reply itself, or from the
//! `answer` of an object without `ids`. Ids the index does not contain are
//! dropped.

use std::collections::HashSet;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument};

use vault_core::defaults::RECALL_LIMIT;
use vault_core::{Error, IndexEntry, NoteId, QueryResult, Result};
use vault_inference::{FailureReason, RemoteClient};

use crate::index::render_index;
use crate::scorer::summarize;

/// Ids and answer text recovered from a reply, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub ids: Vec<NoteId>,
    pub answer: String,
    pub reason: Option<String>,
}

/// Prompt asking the remote model to answer from the index.
pub fn recall_prompt(question: &str, index_block: &str) -> String {
    format!(
        "You are Memory, the recall assistant for a personal notes vault.\n\
         Each line below describes one note as `[id] title | tags | preview`.\n\n\
         {index}\n\n\
         Question: {question}\n\n\
         Reply with strict JSON only, in the form \
         {{\"ids\": [numbers], \"answer\": \"...\", \"reason\": \"optional\"}}. \
         List the ids of up to {limit} notes that answer the question, most relevant first. \
         In the answer, cite notes by id in brackets, like [3]. \
         If no note is relevant, return an empty ids list.",
        index = index_block,
        question = question.trim(),
        limit = RECALL_LIMIT,
    )
}

/// Note id from a JSON number or numeric string.
fn coerce_id(value: &Value) -> Option<NoteId> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().trim_start_matches('#').parse().ok(),
        _ => None,
    }
}

/// A JSON object recovered from a reply. `ids` is `None` when the key is absent.
#[derive(Debug)]
struct ObjectReply {
    ids: Option<Vec<NoteId>>,
    answer: String,
    reason: Option<String>,
}

/// Strict parse of `text` as one JSON object.
fn parse_strict(text: &str) -> Option<ObjectReply> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    let obj = value.as_object()?;
    let ids = obj.get("ids").map(|ids| match ids {
        Value::Array(items) => items.iter().filter_map(coerce_id).collect(),
        single => coerce_id(single).into_iter().collect(),
    });
    let text_field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
    };
    Some(ObjectReply {
        ids,
        answer: text_field("answer").unwrap_or_default(),
        reason: text_field("reason").filter(|r| !r.is_empty()),
    })
}

/// End offset (exclusive) of the object opening at `start`, if it closes.
///
/// Braces inside string literals are ignored.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strict parse of the balanced `{...}` fragments in `text`.
///
/// The first fragment with an `ids` key wins; otherwise the first object.
fn parse_fragment(text: &str) -> Option<ObjectReply> {
    let mut first = None;
    for (start, _) in text.match_indices('{') {
        let Some(end) = balanced_object_end(text, start) else {
            continue;
        };
        if let Some(reply) = parse_strict(&text[start..end]) {
            if reply.ids.is_some() {
                return Some(reply);
            }
            if first.is_none() {
                first = Some(reply);
            }
        }
    }
    first
}

/// Reply parser. Holds the compiled patterns for loose id recovery.
#[derive(Debug, Clone)]
pub struct ReplyParser {
    bracketed: Regex,
    bare: Regex,
}

impl ReplyParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::Internal(format!("Invalid id pattern: {}", e)))
        };
        Ok(Self {
            bracketed: compile(r"\[\s*#?(\d{1,9})\s*\]")?,
            bare: compile(r"\b(\d{1,9})\b")?,
        })
    }

    /// Run the parse chain. `None` when no strategy recovers any id.
    pub fn parse(&self, text: &str) -> Option<ParsedReply> {
        let text = text.trim();
        match parse_strict(text).or_else(|| parse_fragment(text)) {
            Some(ObjectReply {
                ids: Some(ids),
                answer,
                reason,
            }) => (!ids.is_empty()).then_some(ParsedReply {
                ids,
                answer,
                reason,
            }),
            Some(ObjectReply {
                ids: None,
                answer,
                reason,
            }) => self
                .parse_loose(&answer)
                .map(|loose| ParsedReply { reason, ..loose }),
            None => self.parse_loose(text),
        }
    }

    /// Ids scraped from free text; the whole text becomes the answer.
    fn parse_loose(&self, text: &str) -> Option<ParsedReply> {
        let scrape = |re: &Regex| -> Vec<NoteId> {
            re.captures_iter(text)
                .filter_map(|c| c.get(1)?.as_str().parse().ok())
                .collect()
        };
        let mut ids = scrape(&self.bracketed);
        if ids.is_empty() {
            ids = scrape(&self.bare);
        }
        if ids.is_empty() {
            return None;
        }
        Some(ParsedReply {
            ids,
            answer: text.to_string(),
            reason: None,
        })
    }
}

/// Keep ids present in `index`, first occurrence only, at most [`RECALL_LIMIT`].
pub fn filter_known_ids(ids: &[NoteId], index: &[IndexEntry]) -> Vec<NoteId> {
    let known: HashSet<NoteId> = index.iter().map(|e| e.id).collect();
    let mut seen = HashSet::new();
    ids.iter()
        .copied()
        .filter(|id| known.contains(id) && seen.insert(*id))
        .take(RECALL_LIMIT)
        .collect()
}

/// Answers recall questions through the remote model.
#[derive(Debug, Clone)]
pub struct QueryAnswerer {
    remote: RemoteClient,
    parser: ReplyParser,
}

impl QueryAnswerer {
    pub fn new(remote: RemoteClient) -> Result<Self> {
        Ok(Self {
            remote,
            parser: ReplyParser::new()?,
        })
    }

    /// Answer `question` from `index`.
    ///
    /// Every failure is reported as a [`FailureReason`]; raw replies and parse
    /// errors never reach the caller.
    #[instrument(skip(self, question, index), fields(subsystem = "memory", component = "answerer", op = "answer", entries = index.len()))]
    pub async fn answer(
        &self,
        question: &str,
        index: &[IndexEntry],
    ) -> std::result::Result<QueryResult, FailureReason> {
        let prompt = recall_prompt(question, &render_index(index));
        let text = self.remote.complete_json(&prompt).await.into_result()?;

        let parsed = self.parser.parse(&text).ok_or_else(|| {
            FailureReason::Unusable(format!("no note ids in {} char reply", text.len()))
        })?;
        let matched_ids = filter_known_ids(&parsed.ids, index);
        if matched_ids.is_empty() {
            return Err(FailureReason::Unusable(format!(
                "none of {} returned ids are in the index",
                parsed.ids.len()
            )));
        }

        if let Some(reason) = &parsed.reason {
            debug!(reason = %reason, "Remote recall reason");
        }

        let answer = if parsed.answer.is_empty() {
            let matched: Vec<&IndexEntry> = matched_ids
                .iter()
                .filter_map(|id| index.iter().find(|e| e.id == *id))
                .collect();
            summarize(matched)
        } else {
            parsed.answer
        };

        debug!(result_count = matched_ids.len(), "Remote recall parsed");
        Ok(QueryResult {
            matched_ids,
            answer,
        })
    }
}
