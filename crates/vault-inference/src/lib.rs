//! # vault-inference
//!
//! Remote text-generation access for vault-memory.
//!
//! This crate provides:
//! - A Gemini backend speaking the `generateContent` REST API
//! - [`RemoteClient`], which bounds every call with a timeout and reports the
//!   result as a [`RemoteOutcome`] instead of an error
//! - Environment-driven configuration, including fallback-only and
//!   deterministic modes
//! - A scriptable mock backend (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use vault_inference::{RemoteConfig, RemoteOutcome};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = RemoteConfig::from_env().build_client();
//!     match client.complete("Say hello").await {
//!         RemoteOutcome::Success(text) => println!("{text}"),
//!         RemoteOutcome::Failure(reason) => eprintln!("fallback: {reason}"),
//!     }
//! }
//! ```

pub mod config;
pub mod gemini;
pub mod remote;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use vault_core::*;

pub use config::RemoteConfig;
pub use gemini::{GeminiBackend, GeminiConfig};
pub use remote::{DisabledReason, FailureReason, RemoteClient, RemoteOutcome};
