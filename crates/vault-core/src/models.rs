//! Data models for notes and recall results.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Stable note identifier assigned by the record store.
pub type NoteId = i64;

// =============================================================================
// NOTE TYPES
// =============================================================================

/// Card color from the fixed palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Slate,
    Amber,
    Emerald,
    Rose,
    Sky,
    Violet,
}

impl NoteColor {
    /// Every palette entry, in display order.
    pub const ALL: [NoteColor; 6] = [
        NoteColor::Slate,
        NoteColor::Amber,
        NoteColor::Emerald,
        NoteColor::Rose,
        NoteColor::Sky,
        NoteColor::Violet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slate => "slate",
            Self::Amber => "amber",
            Self::Emerald => "emerald",
            Self::Rose => "rose",
            Self::Sky => "sky",
            Self::Violet => "violet",
        }
    }

    /// Lenient parse used for form input: unknown or missing values become `Slate`.
    pub fn normalize(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for NoteColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown note color: {}", s)))
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A note record as held by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub color: NoteColor,
    #[serde(default)]
    pub pinned: bool,
    /// Lowercase single-word tags, at most five. Empty until the note is tagged.
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Title for display, `Untitled` when blank.
    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() {
            defaults::UNTITLED
        } else {
            title
        }
    }

    pub fn is_tagged(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// User input for a new note, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    /// Trim and validate the draft. A note needs a title or content.
    pub fn validate(self) -> Result<NewNote> {
        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();
        if title.is_empty() && content.is_empty() {
            return Err(Error::InvalidInput(
                "Notes need a title or content".to_string(),
            ));
        }
        Ok(NewNote {
            title,
            content,
            color: NoteColor::normalize(self.color.as_deref()),
            pinned: self.pinned,
            tags: Vec::new(),
        })
    }
}

/// Validated note ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub color: NoteColor,
    pub pinned: bool,
    /// Tags stored with the note. Cleaned on insert.
    pub tags: Vec<String>,
}

/// Partial update of an existing note. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub pinned: Option<bool>,
}

impl NoteUpdate {
    /// Apply the update to `note`, returning whether title or content changed.
    pub fn apply(self, note: &mut Note) -> Result<bool> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| note.title.clone());
        let content = self
            .content
            .map(|c| c.trim().to_string())
            .unwrap_or_else(|| note.content.clone());
        if title.is_empty() && content.is_empty() {
            return Err(Error::InvalidInput(
                "Notes need a title or content".to_string(),
            ));
        }

        let changed = title != note.title || content != note.content;
        note.title = title;
        note.content = content;
        if let Some(color) = self.color {
            note.color = NoteColor::normalize(Some(&color));
        }
        if let Some(pinned) = self.pinned {
            note.pinned = pinned;
        }
        Ok(changed)
    }
}

// =============================================================================
// RECALL TYPES
// =============================================================================

/// One note projected for a recall prompt. Rebuilt per query, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: NoteId,
    pub title: String,
    pub tags: Vec<String>,
    pub preview: String,
    pub pinned: bool,
}

/// Ranked note ids plus a human-readable answer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub matched_ids: Vec<NoteId>,
    pub answer: String,
}

impl QueryResult {
    pub fn empty(answer: impl Into<String>) -> Self {
        Self {
            matched_ids: Vec::new(),
            answer: answer.into(),
        }
    }
}

/// Which path produced a recall answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecallMode {
    Remote,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecallStatus {
    Ok,
    Error,
}

/// Envelope returned to callers of `ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallResponse {
    pub status: RecallStatus,
    pub mode: RecallMode,
    pub answer: String,
    #[serde(default)]
    pub matched_ids: Vec<NoteId>,
    /// Why the answer came from the local path, or why the request was refused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Backfill behaviour for notes that already carry tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMode {
    /// Skip notes whose tags are already well-formed.
    #[default]
    Incremental,
    /// Recompute tags for every note.
    Force,
}

/// Counters from a backfill run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackfillReport {
    pub scanned: usize,
    pub tagged: usize,
    pub skipped: usize,
    pub failed: usize,
}
