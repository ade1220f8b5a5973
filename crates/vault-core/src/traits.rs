//! Core traits for vault-memory abstractions.
//!
//! These traits define the interfaces that the record store and the remote
//! model client must satisfy, so the memory engine can run against real
//! backends or test doubles.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Record store for notes.
///
/// `list_notes` returns every note in listing order: pinned notes first, then
/// most recently updated, then highest id. Each call is a fresh snapshot.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// List all notes in listing order.
    async fn list_notes(&self) -> Result<Vec<Note>>;

    /// Fetch a note by id. Fails with `Error::NoteNotFound` if absent.
    async fn get_note(&self, id: NoteId) -> Result<Note>;

    /// Insert a validated note and return the stored record.
    async fn insert_note(&self, note: NewNote) -> Result<Note>;

    /// Persist every field of `note`, bumping `updated_at`.
    async fn save_note(&self, note: &Note) -> Result<Note>;

    /// Replace a note's tags without touching `updated_at`.
    async fn update_tags(&self, id: NoteId, tags: &[String]) -> Result<()>;

    /// Delete a note. Fails with `Error::NoteNotFound` if absent.
    async fn delete_note(&self, id: NoteId) -> Result<()>;

    /// Delete every note, returning how many were removed.
    async fn clear(&self) -> Result<usize>;
}

// =============================================================================
// INFERENCE
// =============================================================================

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text the backend has been asked to format as JSON.
    ///
    /// Backends without a JSON mode fall back to plain generation; callers must
    /// still parse the result defensively.
    async fn generate_json(&self, prompt: &str) -> Result<String> {
        self.generate(prompt).await
    }

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
