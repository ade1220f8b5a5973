//! The memory engine: note writes with tagging, recall, and backfill.
//!
//! Every path that can reach the remote model degrades to local behaviour, so
//! only record-store and validation errors ever propagate.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn, Instrument};
use uuid::Uuid;

use vault_core::{
    clean_tags, is_well_formed, title_tokens, BackfillReport, Note, NoteDraft, NoteId,
    NoteRepository, NoteUpdate, QueryResult, RecallMode, RecallResponse, RecallStatus, Result,
    TagMode,
};
use vault_inference::{DisabledReason, FailureReason, RemoteClient, RemoteConfig};

use crate::answer::QueryAnswerer;
use crate::index::build_index;
use crate::messages;
use crate::scorer::score_and_rank;
use crate::tagger::{heuristic_tags, TagGenerator};

/// Outcome of one recall, with how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Recall {
    pub request_id: Uuid,
    pub result: QueryResult,
    pub mode: RecallMode,
    /// Why the remote answer was not used. `None` for remote answers and for
    /// recalls that never needed the remote model.
    pub fallback: Option<FailureReason>,
    /// Number of notes the recall ran over.
    pub indexed: usize,
}

/// Tagging and recall over a note store.
pub struct MemoryEngine {
    store: Arc<dyn NoteRepository>,
    remote: RemoteClient,
    tagger: TagGenerator,
    answerer: QueryAnswerer,
}

impl MemoryEngine {
    pub fn new(store: Arc<dyn NoteRepository>, remote: RemoteClient) -> Result<Self> {
        info!(
            remote_enabled = remote.is_enabled(),
            model = remote.model_name().unwrap_or("none"),
            "Initializing memory engine"
        );
        Ok(Self {
            store,
            tagger: TagGenerator::new(remote.clone()),
            answerer: QueryAnswerer::new(remote.clone())?,
            remote,
        })
    }

    /// Build an engine whose remote client comes from `config`.
    pub fn from_config(store: Arc<dyn NoteRepository>, config: &RemoteConfig) -> Result<Self> {
        Self::new(store, config.build_client())
    }

    pub fn store(&self) -> &Arc<dyn NoteRepository> {
        &self.store
    }

    pub fn remote(&self) -> &RemoteClient {
        &self.remote
    }

    // =========================================================================
    // TAGGING
    // =========================================================================

    /// Tags for a note's text: title words first, then generated tags.
    pub async fn tags_for(&self, title: &str, content: &str) -> Vec<String> {
        let (generated, source) = self.tagger.generate_tags_with_source(title, content).await;
        let tags = clean_tags(title_tokens(title).into_iter().chain(generated));
        debug!(tags = ?tags, source = source.as_str(), "Computed note tags");
        tags
    }

    /// Tags from the note's own words. Never calls the remote model.
    pub fn local_tags_for(title: &str, content: &str) -> Vec<String> {
        clean_tags(title_tokens(title).into_iter().chain(heuristic_tags(title, content)))
    }

    /// Make sure `note` carries well-formed tags, persisting any change.
    ///
    /// Without `force`, a note whose tags are already well-formed is left
    /// untouched, so repeated calls make no remote calls and no writes.
    /// Returns whether the note was retagged.
    #[instrument(skip(self, note), fields(subsystem = "memory", component = "engine", op = "ensure_tags", note_id = note.id))]
    pub async fn ensure_tags(&self, note: &mut Note, force: bool) -> Result<bool> {
        if !force && is_well_formed(&note.tags) {
            return Ok(false);
        }
        let tags = self.tags_for(&note.title, &note.content).await;
        self.store.update_tags(note.id, &tags).await?;
        note.tags = tags;
        Ok(true)
    }

    /// [`ensure_tags`](Self::ensure_tags) without force, using local tags only.
    async fn ensure_local_tags(&self, note: &mut Note) -> Result<bool> {
        if is_well_formed(&note.tags) {
            return Ok(false);
        }
        let tags = Self::local_tags_for(&note.title, &note.content);
        self.store.update_tags(note.id, &tags).await?;
        debug!(note_id = note.id, tags = ?tags, "Tagged note locally");
        note.tags = tags;
        Ok(true)
    }

    // =========================================================================
    // NOTES
    // =========================================================================

    /// Validate, tag, and insert a new note in one write.
    pub async fn create_note(&self, draft: NoteDraft) -> Result<Note> {
        let mut new = draft.validate()?;
        new.tags = self.tags_for(&new.title, &new.content).await;
        let note = self.store.insert_note(new).await?;
        info!(note_id = note.id, tags = ?note.tags, "Created note");
        Ok(note)
    }

    /// Apply an update in one write. Title or content changes retag the note;
    /// pin and color changes do not.
    pub async fn update_note(&self, id: NoteId, update: NoteUpdate) -> Result<Note> {
        let mut note = self.store.get_note(id).await?;
        let content_changed = update.apply(&mut note)?;
        if content_changed {
            note.tags = self.tags_for(&note.title, &note.content).await;
        }
        let note = self.store.save_note(&note).await?;
        debug!(note_id = id, retagged = content_changed, "Updated note");
        Ok(note)
    }

    pub async fn set_pinned(&self, id: NoteId, pinned: bool) -> Result<Note> {
        self.update_note(
            id,
            NoteUpdate {
                pinned: Some(pinned),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete_note(&self, id: NoteId) -> Result<()> {
        self.store.delete_note(id).await?;
        debug!(note_id = id, "Deleted note");
        Ok(())
    }

    // =========================================================================
    // RECALL
    // =========================================================================

    /// Answer a question from the notes. Falls back to local ranking whenever
    /// the remote model cannot produce a usable answer.
    pub async fn recall(&self, question: &str) -> Result<QueryResult> {
        Ok(self.recall_detailed(question).await?.result)
    }

    /// [`recall`](Self::recall) plus how the answer was produced.
    pub async fn recall_detailed(&self, question: &str) -> Result<Recall> {
        let request_id = Uuid::now_v7();
        let span = tracing::info_span!(
            "recall",
            subsystem = "memory",
            component = "engine",
            op = "recall",
            request_id = %request_id,
        );
        self.recall_inner(request_id, question.trim())
            .instrument(span)
            .await
    }

    async fn recall_inner(&self, request_id: Uuid, question: &str) -> Result<Recall> {
        let start = std::time::Instant::now();
        let mut notes = self.store.list_notes().await?;
        // The remote model is reserved for the answer; untagged notes get local tags.
        for note in notes.iter_mut() {
            // A failed tag write must not fail the recall.
            if let Err(e) = self.ensure_local_tags(note).await {
                warn!(note_id = note.id, error = %e, "Failed to persist tags during recall");
            }
        }
        let index = build_index(&notes);

        let local = |result: QueryResult, fallback: Option<FailureReason>| Recall {
            request_id,
            result,
            mode: RecallMode::Local,
            fallback,
            indexed: index.len(),
        };

        if index.is_empty() {
            return Ok(local(QueryResult::empty(messages::EMPTY_VAULT), None));
        }
        if question.is_empty() {
            return Ok(local(QueryResult::empty(messages::EMPTY_QUESTION), None));
        }

        let recall = match self.answerer.answer(question, &index).await {
            Ok(result) => Recall {
                request_id,
                result,
                mode: RecallMode::Remote,
                fallback: None,
                indexed: index.len(),
            },
            Err(reason) => {
                let result = score_and_rank(question, &index);
                if reason.is_unavailable() {
                    debug!(fallback_reason = reason.label(), "Recall answered locally");
                } else {
                    warn!(
                        fallback_reason = reason.label(),
                        error = %reason,
                        "Remote recall unusable, answered locally"
                    );
                }
                local(result, Some(reason))
            }
        };

        info!(
            mode = ?recall.mode,
            result_count = recall.result.matched_ids.len(),
            entries = recall.indexed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Recall complete"
        );
        Ok(recall)
    }

    /// Recall wrapped in the response envelope shown to users.
    pub async fn ask(&self, question: &str) -> Result<RecallResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(RecallResponse {
                status: RecallStatus::Error,
                mode: RecallMode::Local,
                answer: String::new(),
                matched_ids: Vec::new(),
                message: Some(messages::EMPTY_QUESTION.to_string()),
            });
        }

        let recall = self.recall_detailed(question).await?;
        let (status, message) = match &recall.fallback {
            None => (RecallStatus::Ok, None),
            Some(reason) => self.explain(reason),
        };
        Ok(RecallResponse {
            status,
            mode: recall.mode,
            answer: recall.result.answer,
            matched_ids: recall.result.matched_ids,
            message,
        })
    }

    /// Status and user-facing explanation for a local fallback.
    ///
    /// Remote errors are reported with an error status even though a local
    /// answer is still returned; a disabled remote or an unusable reply is not
    /// an error.
    fn explain(&self, reason: &FailureReason) -> (RecallStatus, Option<String>) {
        match reason {
            FailureReason::Disabled(DisabledReason::MissingApiKey) => {
                (RecallStatus::Ok, Some(messages::MISSING_KEY.to_string()))
            }
            FailureReason::Disabled(DisabledReason::DeterministicMode) => (
                RecallStatus::Ok,
                Some(messages::DETERMINISTIC_MODE.to_string()),
            ),
            FailureReason::Disabled(DisabledReason::ClientInit(_)) | FailureReason::Timeout(_) => {
                (RecallStatus::Error, Some(messages::UNAVAILABLE.to_string()))
            }
            FailureReason::Transport(detail) => (RecallStatus::Error, Some(self.transport_message(detail))),
            FailureReason::Unusable(_) => (RecallStatus::Ok, Some(messages::UNUSABLE.to_string())),
        }
    }

    fn transport_message(&self, detail: &str) -> String {
        if detail.contains("not found") && detail.contains("models/") {
            messages::model_not_found(self.remote.model_name().unwrap_or("unknown"))
        } else if detail.contains("API key") || detail.to_lowercase().contains("permission") {
            messages::REJECTED_KEY.to_string()
        } else {
            messages::UNAVAILABLE.to_string()
        }
    }

    // =========================================================================
    // BACKFILL
    // =========================================================================

    /// Tag existing notes. Safe to re-run; only tags change.
    ///
    /// A note whose tag write fails is counted and skipped over.
    #[instrument(skip(self), fields(subsystem = "memory", component = "engine", op = "backfill"))]
    pub async fn backfill(&self, mode: TagMode) -> Result<BackfillReport> {
        let start = std::time::Instant::now();
        let mut report = BackfillReport::default();
        let force = mode == TagMode::Force;

        for mut note in self.store.list_notes().await? {
            report.scanned += 1;
            match self.ensure_tags(&mut note, force).await {
                Ok(true) => report.tagged += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(note_id = note.id, error = %e, "Failed to backfill note tags");
                    report.failed += 1;
                }
            }
        }

        info!(
            scanned = report.scanned,
            tagged = report.tagged,
            skipped = report.skipped,
            failed = report.failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Backfill complete"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryNoteStore;
    use std::time::Duration;
    use vault_inference::mock::MockGenerationBackend;

    fn engine_with(mock: &MockGenerationBackend) -> MemoryEngine {
        let remote = RemoteClient::new(Arc::new(mock.clone()), Duration::from_secs(5));
        MemoryEngine::new(Arc::new(InMemoryNoteStore::new()), remote).unwrap()
    }

    fn offline_engine() -> MemoryEngine {
        MemoryEngine::from_config(
            Arc::new(InMemoryNoteStore::new()),
            &RemoteConfig::deterministic(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_note_puts_title_tokens_first() {
        let mock = MockGenerationBackend::new().with_fixed_response("shopping, dairy");
        let engine = engine_with(&mock);
        let note = engine
            .create_note(NoteDraft::new("Weekly Groceries", "milk and eggs"))
            .await
            .unwrap();
        assert_eq!(note.tags, vec!["weekly", "groceries", "shopping", "dairy"]);
        let stored = engine.store().get_note(note.id).await.unwrap();
        assert_eq!(stored.tags, note.tags);
    }

    #[tokio::test]
    async fn test_create_note_rejects_blank() {
        let engine = offline_engine();
        let err = engine.create_note(NoteDraft::new(" ", "")).await.unwrap_err();
        assert!(err.to_string().contains("Notes need a title or content"));
    }

    #[tokio::test]
    async fn test_ensure_tags_is_idempotent() {
        let mock = MockGenerationBackend::new().with_fixed_response("travel");
        let engine = engine_with(&mock);
        let mut note = engine
            .create_note(NoteDraft::new("Trip", "pack bags"))
            .await
            .unwrap();
        let calls = mock.generate_call_count();
        let tags = note.tags.clone();

        assert!(!engine.ensure_tags(&mut note, false).await.unwrap());
        assert!(!engine.ensure_tags(&mut note, false).await.unwrap());
        assert_eq!(note.tags, tags);
        assert_eq!(mock.generate_call_count(), calls);
    }

    #[tokio::test]
    async fn test_pin_and_color_do_not_retag() {
        let mock = MockGenerationBackend::new().with_fixed_response("travel");
        let engine = engine_with(&mock);
        let note = engine
            .create_note(NoteDraft::new("Trip", "pack bags"))
            .await
            .unwrap();
        let calls = mock.generate_call_count();

        let pinned = engine.set_pinned(note.id, true).await.unwrap();
        assert!(pinned.pinned);
        engine
            .update_note(
                note.id,
                NoteUpdate {
                    color: Some("violet".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(mock.generate_call_count(), calls);

        let edited = engine
            .update_note(
                note.id,
                NoteUpdate {
                    content: Some("Book the ferry".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(mock.generate_call_count(), calls + 1);
        assert_eq!(edited.tags[0], "trip");
    }

    #[tokio::test]
    async fn test_update_missing_note() {
        let engine = offline_engine();
        let err = engine.set_pinned(404, true).await.unwrap_err();
        assert!(matches!(err, vault_core::Error::NoteNotFound(404)));
    }

    #[tokio::test]
    async fn test_recall_on_empty_vault() {
        let engine = offline_engine();
        let recall = engine.recall_detailed("anything").await.unwrap();
        assert_eq!(recall.mode, RecallMode::Local);
        assert_eq!(recall.result.answer, messages::EMPTY_VAULT);
        assert_eq!(recall.indexed, 0);
    }

    #[tokio::test]
    async fn test_ask_blank_question_makes_no_call() {
        let mock = MockGenerationBackend::new();
        let engine = engine_with(&mock);
        let response = engine.ask("   ").await.unwrap();
        assert_eq!(response.status, RecallStatus::Error);
        assert_eq!(response.message.as_deref(), Some(messages::EMPTY_QUESTION));
        assert_eq!(mock.generate_call_count(), 0);
    }

    #[tokio::test]
    async fn test_explain_transport_errors() {
        let mock = MockGenerationBackend::new().with_model("gemini-nope");
        let engine = engine_with(&mock);

        let (status, message) = engine.explain(&FailureReason::Transport(
            "Gemini returned 404 Not Found: models/gemini-nope is not found".into(),
        ));
        assert_eq!(status, RecallStatus::Error);
        assert!(message.unwrap().contains("(gemini-nope)"));

        let (_, message) = engine.explain(&FailureReason::Transport(
            "Gemini returned 403 Forbidden: Permission denied".into(),
        ));
        assert_eq!(message.as_deref(), Some(messages::REJECTED_KEY));

        let (_, message) = engine.explain(&FailureReason::Transport("dns error".into()));
        assert_eq!(message.as_deref(), Some(messages::UNAVAILABLE));

        let (status, message) = engine.explain(&FailureReason::Disabled(DisabledReason::MissingApiKey));
        assert_eq!(status, RecallStatus::Ok);
        assert_eq!(message.as_deref(), Some(messages::MISSING_KEY));
    }
}
