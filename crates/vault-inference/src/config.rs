//! Remote model configuration.
//!
//! Configuration is read from environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GEMINI_API_KEY` | (none) | API key. Absent means fallback-only mode |
//! | `GEMINI_MODEL_NAME` | `gemini-2.5-flash` | Generation model |
//! | `GEMINI_BASE_URL` | Google endpoint | API base URL |
//! | `VAULT_REMOTE_TIMEOUT_SECS` | 30 | Per-call timeout, whole seconds above zero |
//! | `TESTING` | (unset) | `true` disables the remote path entirely |

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use vault_core::defaults;

use crate::gemini::{GeminiBackend, GeminiConfig};
use crate::remote::{DisabledReason, RemoteClient};

/// Settings for reaching the remote model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Deterministic mode: never call the remote model.
    pub deterministic: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: defaults::GEN_MODEL.to_string(),
            base_url: defaults::GEMINI_URL.to_string(),
            timeout_secs: defaults::REMOTE_TIMEOUT_SECS,
            deterministic: false,
        }
    }
}

impl RemoteConfig {
    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_key: non_empty(defaults::ENV_API_KEY),
            model: non_empty(defaults::ENV_MODEL_NAME)
                .unwrap_or_else(|| defaults::GEN_MODEL.to_string()),
            base_url: non_empty(defaults::ENV_BASE_URL)
                .unwrap_or_else(|| defaults::GEMINI_URL.to_string()),
            timeout_secs: non_empty(defaults::ENV_REMOTE_TIMEOUT_SECS)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults::REMOTE_TIMEOUT_SECS),
            deterministic: lookup(defaults::ENV_TESTING)
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        }
    }

    /// A configuration that never reaches the remote model.
    pub fn deterministic() -> Self {
        Self {
            deterministic: true,
            ..Self::default()
        }
    }

    /// Why the remote path would be disabled, if it would be.
    pub fn disabled_reason(&self) -> Option<DisabledReason> {
        if self.deterministic {
            Some(DisabledReason::DeterministicMode)
        } else if self.api_key.is_none() {
            Some(DisabledReason::MissingApiKey)
        } else {
            None
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the remote client. Never fails: a configuration that cannot reach
    /// the remote model yields a disabled client.
    pub fn build_client(&self) -> RemoteClient {
        if let Some(reason) = self.disabled_reason() {
            info!(reason = %reason, "Remote model disabled, using local fallback only");
            return RemoteClient::disabled(reason);
        }

        let gemini = GeminiConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone().unwrap_or_default(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
        };
        match GeminiBackend::new(gemini) {
            Ok(backend) => RemoteClient::new(Arc::new(backend), self.timeout()),
            Err(e) => {
                warn!(error = %e, "Failed to initialize Gemini backend, using local fallback only");
                RemoteClient::disabled(DisabledReason::ClientInit(e.to_string()))
            }
        }
    }
}
