//! User-facing text returned by the memory engine.

pub const SURFACED_HEADER: &str = "Here's what surfaced:";

pub const NO_MATCH: &str = "Memory couldn't link that question to a note yet. \
     Try a different keyword or capture the details in a note first.";

pub const EMPTY_VAULT: &str =
    "Your vault is empty so far. Capture a note and Memory will start indexing it.";

pub const EMPTY_QUESTION: &str = "Ask a question before invoking Memory.";

pub const MISSING_KEY: &str = "Gemini answers unlock once GEMINI_API_KEY is configured.";

pub const DETERMINISTIC_MODE: &str =
    "Memory is running in deterministic mode, so it shared local recall.";

pub const REJECTED_KEY: &str = "Gemini rejected the request. Double-check GEMINI_API_KEY \
     permissions. Showing local recall instead.";

pub const UNAVAILABLE: &str = "Gemini was unavailable, so Memory shared local recall instead.";

pub const UNUSABLE: &str =
    "Gemini returned no usable matches, so Memory surfaced the closest tags locally.";

/// Shown when the configured model does not exist.
pub fn model_not_found(model: &str) -> String {
    format!(
        "Gemini couldn't find the configured model ({}). Update GEMINI_MODEL_NAME or \
         switch to `gemini-2.5-flash-lite`. Showing local recall instead.",
        model
    )
}
