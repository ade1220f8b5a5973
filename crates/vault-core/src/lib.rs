//! # vault-core
//!
//! Core types, traits, and text utilities for the vault-memory notes engine.
//!
//! This crate provides the note data model, the record store and generation
//! backend traits, and the tokenizer and tag normalization helpers that the
//! tagging and recall paths share.

pub mod defaults;
pub mod error;
pub mod models;
pub mod tags;
pub mod tokenizer;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use tags::*;
pub use tokenizer::*;
pub use traits::*;
