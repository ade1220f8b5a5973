//! # vault-memory
//!
//! The Memory engine for Vault notes: every note carries a few descriptive
//! tags, and free-text questions are answered by the remote model over a
//! compact index of the notes, with a deterministic local ranker whenever the
//! remote model is unavailable or answers with something unusable.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vault_memory::{InMemoryNoteStore, MemoryEngine, NoteDraft, RemoteConfig};
//!
//! #[tokio::main]
//! async fn main() -> vault_memory::Result<()> {
//!     let store = Arc::new(InMemoryNoteStore::open("notes.json").await?);
//!     let engine = MemoryEngine::from_config(store, &RemoteConfig::from_env())?;
//!
//!     engine.create_note(NoteDraft::new("Groceries", "milk, eggs")).await?;
//!     let response = engine.ask("what do I need from the store?").await?;
//!     println!("{}", response.answer);
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod engine;
pub mod index;
pub mod messages;
pub mod scorer;
pub mod store;
pub mod tagger;

pub use vault_core::*;
pub use vault_inference::{DisabledReason, FailureReason, RemoteClient, RemoteConfig, RemoteOutcome};

pub use answer::{QueryAnswerer, ReplyParser};
pub use engine::{MemoryEngine, Recall};
pub use index::{build_index, render_index};
pub use scorer::score_and_rank;
pub use store::InMemoryNoteStore;
pub use tagger::{heuristic_tags, TagGenerator, TagSource};
