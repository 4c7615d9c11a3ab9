//! Mock generator for deterministic testing.
//!
//! Returns pre-configured replies without making any HTTP calls.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::provider::Generator;
use recall_core::{RecallError, Result};

/// A pre-configured outcome of one `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Text(String),
    Error(String),
}

/// A mock generator that replays queued replies in order.
///
/// # Example
/// ```
/// use recall_llm::mock::MockGenerator;
/// let generator = MockGenerator::new("test")
///     .with_reply("Hello, world!");
/// ```
pub struct MockGenerator {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    /// Every prompt received, in call order (for assertions in tests).
    prompts: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
    name: String,
}

impl MockGenerator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            delay: None,
            name: name.into(),
        }
    }

    /// Queue a text reply.
    pub fn with_reply(self, text: &str) -> Self {
        self.replies.lock().push_back(MockReply::Text(text.to_string()));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: &str) -> Self {
        self.replies.lock().push_back(MockReply::Error(error.to_string()));
        self
    }

    /// Sleep this long before answering (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts received so far.
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Shared handle to the prompt log, usable after the mock is moved into an `Arc<dyn Generator>`.
    pub fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }

    fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| MockReply::Text("(mock: no more queued replies)".to_string()))
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "mock/test-model"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.next_reply() {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(error) => Err(RecallError::Generation(error)),
        }
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
