//! Mock generation backend for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vault_inference::mock::MockGenerationBackend;
//!
//! let backend = MockGenerationBackend::new()
//!     .with_response_when("Tags:", "travel, packing")
//!     .with_fixed_response(r#"{"ids": [1], "answer": "Found it"}"#);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use vault_core::{Error, GenerationBackend, Result};

/// Mock generation backend for testing.
///
/// Responses are chosen in this order: queued one-shot replies, the first
/// `with_response_when` rule whose needle appears in the prompt, then the
/// default response. A configured failure overrides all of them.
#[derive(Clone)]
pub struct MockGenerationBackend {
    config: Arc<MockConfig>,
    queue: Arc<Mutex<VecDeque<Result<String>>>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    model: String,
    rules: Vec<(String, String)>,
    default_response: String,
    latency_ms: u64,
    failure: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
    pub timestamp: std::time::Instant,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            model: "mock-model".to_string(),
            rules: Vec::new(),
            default_response: "Mock response".to_string(),
            latency_ms: 0,
            failure: None,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockGenerationBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the reported model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).model = model.into();
        self
    }

    /// Set the default response for generation requests.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Answer with `output` whenever the prompt contains `needle`.
    pub fn with_response_when(
        mut self,
        needle: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .rules
            .push((needle.into(), output.into()));
        self
    }

    /// Fail every call with an inference error carrying `message`.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).failure = Some(message.into());
        self
    }

    /// Set simulated latency for all operations.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Queue a one-shot reply, consumed by the next call.
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.queue).push_back(Ok(response.into()));
    }

    /// Queue a one-shot failure, consumed by the next call.
    pub fn push_failure(&self, message: impl Into<String>) {
        lock(&self.queue).push_back(Err(Error::Inference(message.into())));
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        lock(&self.call_log).clone()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        lock(&self.call_log).clear()
    }

    /// Get number of generation calls, JSON mode included.
    pub fn generate_call_count(&self) -> usize {
        lock(&self.call_log).len()
    }

    async fn respond(&self, operation: &str, prompt: &str) -> Result<String> {
        lock(&self.call_log).push(MockCall {
            operation: operation.to_string(),
            input: prompt.to_string(),
            timestamp: std::time::Instant::now(),
        });

        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        if let Some(message) = &self.config.failure {
            return Err(Error::Inference(message.clone()));
        }

        if let Some(queued) = lock(&self.queue).pop_front() {
            return queued;
        }

        let response = self
            .config
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| self.config.default_response.clone());
        Ok(response)
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.respond("generate", prompt).await
    }

    async fn generate_json(&self, prompt: &str) -> Result<String> {
        self.respond("generate_json", prompt).await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
