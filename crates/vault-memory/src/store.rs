//! In-memory note store with optional JSON file persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use vault_core::{clean_tags, Error, NewNote, Note, NoteId, NoteRepository, Result};

use crate::index::listing_order;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    next_id: NoteId,
    #[serde(default)]
    notes: Vec<Note>,
}

#[derive(Debug, Default)]
struct StoreState {
    next_id: NoteId,
    notes: BTreeMap<NoteId, Note>,
}

impl StoreState {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let notes: BTreeMap<NoteId, Note> =
            snapshot.notes.into_iter().map(|n| (n.id, n)).collect();
        let max_id = notes.keys().next_back().copied().unwrap_or(0);
        Self {
            next_id: snapshot.next_id.max(max_id),
            notes,
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            next_id: self.next_id,
            notes: self.notes.values().cloned().collect(),
        }
    }
}

/// Note store backed by a map behind an async lock.
///
/// When opened with a path, every write rewrites the JSON snapshot at that
/// path before returning.
#[derive(Debug, Default)]
pub struct InMemoryNoteStore {
    state: RwLock<StoreState>,
    path: Option<PathBuf>,
}

impl InMemoryNoteStore {
    /// Empty store without persistence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store persisted at `path`. A missing file means an empty vault.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => StoreState::from_snapshot(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(e.into()),
        };
        info!(
            path = %path.display(),
            notes = state.notes.len(),
            "Opened note store"
        );
        Ok(Self {
            state: RwLock::new(state),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, state: &StoreState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(&state.to_snapshot())?;
        tokio::fs::write(path, raw).await?;
        debug!(path = %path.display(), notes = state.notes.len(), "Persisted note store");
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for InMemoryNoteStore {
    async fn list_notes(&self) -> Result<Vec<Note>> {
        let state = self.state.read().await;
        let mut notes: Vec<Note> = state.notes.values().cloned().collect();
        notes.sort_by(listing_order);
        Ok(notes)
    }

    async fn get_note(&self, id: NoteId) -> Result<Note> {
        let state = self.state.read().await;
        state.notes.get(&id).cloned().ok_or(Error::NoteNotFound(id))
    }

    async fn insert_note(&self, note: NewNote) -> Result<Note> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let now = Utc::now();
        let stored = Note {
            id: state.next_id,
            title: note.title,
            content: note.content,
            color: note.color,
            pinned: note.pinned,
            tags: clean_tags(&note.tags),
            created_at: now,
            updated_at: now,
        };
        state.notes.insert(stored.id, stored.clone());
        self.persist(&state).await?;
        Ok(stored)
    }

    async fn save_note(&self, note: &Note) -> Result<Note> {
        let mut state = self.state.write().await;
        let existing = state
            .notes
            .get_mut(&note.id)
            .ok_or(Error::NoteNotFound(note.id))?;
        let created_at = existing.created_at;
        *existing = Note {
            tags: clean_tags(&note.tags),
            created_at,
            updated_at: Utc::now(),
            ..note.clone()
        };
        let saved = existing.clone();
        self.persist(&state).await?;
        Ok(saved)
    }

    async fn update_tags(&self, id: NoteId, tags: &[String]) -> Result<()> {
        let mut state = self.state.write().await;
        let note = state.notes.get_mut(&id).ok_or(Error::NoteNotFound(id))?;
        note.tags = clean_tags(tags);
        self.persist(&state).await
    }

    async fn delete_note(&self, id: NoteId) -> Result<()> {
        let mut state = self.state.write().await;
        state.notes.remove(&id).ok_or(Error::NoteNotFound(id))?;
        self.persist(&state).await
    }

    async fn clear(&self) -> Result<usize> {
        let mut state = self.state.write().await;
        let removed = state.notes.len();
        state.notes.clear();
        self.persist(&state).await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_core::{NoteColor, NoteDraft};

    fn draft(title: &str, content: &str) -> NewNote {
        NoteDraft::new(title, content).validate().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = InMemoryNoteStore::new();
        let a = store.insert_note(draft("a", "")).await.unwrap();
        let b = store.insert_note(draft("b", "")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert!(a.tags.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_note() {
        let store = InMemoryNoteStore::new();
        let err = store.get_note(99).await.unwrap_err();
        assert!(matches!(err, Error::NoteNotFound(99)));
    }

    #[tokio::test]
    async fn test_list_uses_listing_order() {
        let store = InMemoryNoteStore::new();
        store.insert_note(draft("first", "")).await.unwrap();
        let pinned = store
            .insert_note(NoteDraft::new("pinned", "").pinned(true).validate().unwrap())
            .await
            .unwrap();
        store.insert_note(draft("third", "")).await.unwrap();

        let ids: Vec<NoteId> = store.list_notes().await.unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids[0], pinned.id);
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_update_tags_keeps_updated_at() {
        let store = InMemoryNoteStore::new();
        let note = store.insert_note(draft("Trip", "pack")).await.unwrap();
        store
            .update_tags(note.id, &["Travel".to_string(), "travel".to_string()])
            .await
            .unwrap();
        let fetched = store.get_note(note.id).await.unwrap();
        assert_eq!(fetched.tags, vec!["travel"]);
        assert_eq!(fetched.updated_at, note.updated_at);
    }

    #[tokio::test]
    async fn test_save_bumps_updated_at_and_keeps_created_at() {
        let store = InMemoryNoteStore::new();
        let mut note = store.insert_note(draft("Trip", "pack")).await.unwrap();
        note.color = NoteColor::Sky;
        let saved = store.save_note(&note).await.unwrap();
        assert_eq!(saved.color, NoteColor::Sky);
        assert_eq!(saved.created_at, note.created_at);
        assert!(saved.updated_at >= note.updated_at);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store = InMemoryNoteStore::new();
        let a = store.insert_note(draft("a", "")).await.unwrap();
        store.insert_note(draft("b", "")).await.unwrap();
        store.delete_note(a.id).await.unwrap();
        assert!(store.delete_note(a.id).await.is_err());
        assert_eq!(store.clear().await.unwrap(), 1);
        assert!(store.list_notes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault").join("notes.json");

        let store = InMemoryNoteStore::open(&path).await.unwrap();
        let note = store.insert_note(draft("Groceries", "milk")).await.unwrap();
        store
            .update_tags(note.id, &["groceries".to_string()])
            .await
            .unwrap();
        store.insert_note(draft("Temp", "")).await.unwrap();
        store.delete_note(2).await.unwrap();

        let reopened = InMemoryNoteStore::open(&path).await.unwrap();
        let notes = reopened.list_notes().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].tags, vec!["groceries"]);

        // Deleted ids are not reused
        let next = reopened.insert_note(draft("Next", "")).await.unwrap();
        assert_eq!(next.id, 3);
    }

    #[tokio::test]
    async fn test_open_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        tokio::fs::write(&path, "not json").await.unwrap();
        let err = InMemoryNoteStore::open(&path).await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
