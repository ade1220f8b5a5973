//! Timeout-bounded access to the remote model.
//!
//! [`RemoteClient`] never returns an error: every call ends in a
//! [`RemoteOutcome`], and every failure carries a [`FailureReason`] that says
//! whether the remote was unavailable or answered with something unusable.
//! Callers decide how to fall back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use vault_core::GenerationBackend;

/// Why the remote path is switched off entirely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisabledReason {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("deterministic mode is enabled")]
    DeterministicMode,

    #[error("client initialization failed: {0}")]
    ClientInit(String),
}

/// Why a remote call did not produce usable text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// Remote path switched off; no call was made.
    #[error("remote model disabled: {0}")]
    Disabled(DisabledReason),

    /// The call did not finish within the configured timeout.
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    /// Network, HTTP status, or protocol failure.
    #[error("remote call failed: {0}")]
    Transport(String),

    /// The remote answered, but nothing usable could be extracted.
    #[error("remote response unusable: {0}")]
    Unusable(String),
}

impl FailureReason {
    /// True for every failure where the remote could not be reached or used at
    /// all, as opposed to answering with unusable content.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, Self::Unusable(_))
    }

    /// Short stable label for structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disabled(_) => "disabled",
            Self::Timeout(_) => "timeout",
            Self::Transport(_) => "transport",
            Self::Unusable(_) => "unusable",
        }
    }
}

/// Result of one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    Success(String),
    Failure(FailureReason),
}

impl RemoteOutcome {
    pub fn into_result(self) -> Result<String, FailureReason> {
        match self {
            Self::Success(text) => Ok(text),
            Self::Failure(reason) => Err(reason),
        }
    }
}

/// Remote model handle shared by the tagger and the recall answerer.
#[derive(Clone)]
pub struct RemoteClient {
    backend: Result<Arc<dyn GenerationBackend>, DisabledReason>,
    timeout: Duration,
}

impl RemoteClient {
    /// Wrap a backend; every call is cut off after `timeout`.
    pub fn new(backend: Arc<dyn GenerationBackend>, timeout: Duration) -> Self {
        Self {
            backend: Ok(backend),
            timeout,
        }
    }

    /// A client that never calls out and always reports `reason`.
    pub fn disabled(reason: DisabledReason) -> Self {
        Self {
            backend: Err(reason),
            timeout: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_ok()
    }

    /// Why the client is disabled, if it is.
    pub fn disabled_reason(&self) -> Option<&DisabledReason> {
        self.backend.as_ref().err()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.backend.as_ref().ok().map(|b| b.model_name())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Plain-text completion.
    pub async fn complete(&self, prompt: &str) -> RemoteOutcome {
        self.call(prompt, false).await
    }

    /// Completion in the backend's JSON mode, where it has one.
    pub async fn complete_json(&self, prompt: &str) -> RemoteOutcome {
        self.call(prompt, true).await
    }

    async fn call(&self, prompt: &str, json: bool) -> RemoteOutcome {
        let backend = match &self.backend {
            Ok(backend) => backend,
            Err(reason) => return RemoteOutcome::Failure(FailureReason::Disabled(reason.clone())),
        };

        let start = Instant::now();
        let call = async {
            if json {
                backend.generate_json(prompt).await
            } else {
                backend.generate(prompt).await
            }
        };

        let outcome = match tokio::time::timeout(self.timeout, call).await {
            Err(_) => RemoteOutcome::Failure(FailureReason::Timeout(self.timeout)),
            Ok(Err(e)) => RemoteOutcome::Failure(FailureReason::Transport(e.to_string())),
            Ok(Ok(text)) if text.trim().is_empty() => {
                RemoteOutcome::Failure(FailureReason::Unusable("empty response".to_string()))
            }
            Ok(Ok(text)) => RemoteOutcome::Success(text),
        };

        let elapsed = start.elapsed().as_millis() as u64;
        match &outcome {
            RemoteOutcome::Success(text) => debug!(
                model = backend.model_name(),
                response_len = text.len(),
                duration_ms = elapsed,
                "Remote call succeeded"
            ),
            RemoteOutcome::Failure(reason) => warn!(
                model = backend.model_name(),
                fallback_reason = reason.label(),
                duration_ms = elapsed,
                error = %reason,
                "Remote call failed"
            ),
        }
        outcome
    }
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("model", &self.model_name())
            .field("disabled", &self.disabled_reason())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGenerationBackend;

    fn client(mock: MockGenerationBackend) -> RemoteClient {
        RemoteClient::new(Arc::new(mock), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_success_passes_text_through() {
        let mock = MockGenerationBackend::new().with_fixed_response("travel, packing");
        let outcome = client(mock.clone()).complete("tags please").await;
        assert_eq!(outcome, RemoteOutcome::Success("travel, packing".to_string()));
        assert_eq!(mock.generate_call_count(), 1);
    }

    #[tokio::test]
    async fn test_disabled_client_never_calls() {
        let client = RemoteClient::disabled(DisabledReason::MissingApiKey);
        assert!(!client.is_enabled());
        assert!(client.model_name().is_none());
        let outcome = client.complete("anything").await;
        assert_eq!(
            outcome,
            RemoteOutcome::Failure(FailureReason::Disabled(DisabledReason::MissingApiKey))
        );
    }

    #[tokio::test]
    async fn test_backend_error_is_transport_failure() {
        let mock = MockGenerationBackend::new().with_failure("connection refused");
        let outcome = client(mock).complete("prompt").await;
        match outcome {
            RemoteOutcome::Failure(FailureReason::Transport(msg)) => {
                assert!(msg.contains("connection refused"))
            }
            other => panic!("Expected transport failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_text_is_unusable() {
        let mock = MockGenerationBackend::new().with_fixed_response("   ");
        let outcome = client(mock).complete("prompt").await;
        assert!(matches!(
            outcome,
            RemoteOutcome::Failure(FailureReason::Unusable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out() {
        let mock = MockGenerationBackend::new()
            .with_fixed_response("late")
            .with_latency_ms(5_000);
        let outcome = client(mock).complete("prompt").await;
        assert_eq!(
            outcome,
            RemoteOutcome::Failure(FailureReason::Timeout(Duration::from_millis(200)))
        );
    }

    #[tokio::test]
    async fn test_json_mode_routes_to_generate_json() {
        let mock = MockGenerationBackend::new().with_fixed_response("{}");
        let _ = client(mock.clone()).complete_json("prompt").await;
        let calls = mock.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].operation, "generate_json");
    }

    #[test]
    fn test_failure_classification() {
        assert!(FailureReason::Timeout(Duration::from_secs(1)).is_unavailable());
        assert!(FailureReason::Transport("x".into()).is_unavailable());
        assert!(FailureReason::Disabled(DisabledReason::DeterministicMode).is_unavailable());
        assert!(!FailureReason::Unusable("x".into()).is_unavailable());
        assert_eq!(FailureReason::Unusable("x".into()).label(), "unusable");
    }
}
