//! Centralized default constants for the vault-memory system.
//!
//! **This module is the single source of truth** for shared default values.
//! The tagging, recall, and inference crates reference these constants instead
//! of defining their own magic numbers.

// =============================================================================
// TAGGING
// =============================================================================

/// Maximum number of tags stored on a note.
pub const MAX_TAGS: usize = 5;

/// Shortest accepted tag, in characters. Shorter words are mostly noise.
pub const TAG_MIN_LEN: usize = 3;

/// Longest accepted tag, in characters.
pub const TAG_MAX_LEN: usize = 24;

/// Tag used when a note has no usable words at all.
pub const FALLBACK_TAG: &str = "note";

/// Characters of note body sent to the remote model for tag suggestions.
pub const TAG_PROMPT_BODY_CHARS: usize = 600;

/// Title used when a note has none.
pub const UNTITLED: &str = "Untitled";

// =============================================================================
// RECALL INDEX
// =============================================================================

/// Maximum title length in an index line.
pub const INDEX_TITLE_MAX: usize = 60;

/// Preview length in characters for index entries.
pub const PREVIEW_LENGTH: usize = 140;

/// Preview lengths tried, in order, when the rendered index exceeds its budget.
pub const PREVIEW_STEPS: [usize; 4] = [PREVIEW_LENGTH, 80, 40, 0];

/// Character budget for the rendered index block in a recall prompt.
pub const INDEX_CHAR_BUDGET: usize = 24_000;

/// Marker appended to truncated previews.
pub const ELLIPSIS: &str = "...";

// =============================================================================
// FALLBACK SCORING
// =============================================================================

/// Maximum notes returned by a recall.
pub const RECALL_LIMIT: usize = 5;

/// Score weight for a question token that matches a tag.
pub const TAG_WEIGHT: u32 = 3;

/// Score weight for a question token that matches the title or preview.
pub const TEXT_WEIGHT: u32 = 1;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default remote generation model.
pub const GEN_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini REST endpoint.
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Timeout for a single remote generation call in seconds.
pub const REMOTE_TIMEOUT_SECS: u64 = 30;

/// Generation calls slower than this are logged as slow.
pub const SLOW_GENERATION_MS: u64 = 10_000;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// API key for the remote model. Absent means fallback-only mode.
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

/// Remote model name override.
pub const ENV_MODEL_NAME: &str = "GEMINI_MODEL_NAME";

/// Remote endpoint override.
pub const ENV_BASE_URL: &str = "GEMINI_BASE_URL";

/// Remote call timeout override in seconds.
pub const ENV_REMOTE_TIMEOUT_SECS: &str = "VAULT_REMOTE_TIMEOUT_SECS";

/// Deterministic mode switch: `TESTING=true` disables the remote path.
pub const ENV_TESTING: &str = "TESTING";
