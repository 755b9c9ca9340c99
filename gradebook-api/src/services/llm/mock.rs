//! Mock LLM backend for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::traits::*;

/// Canned reply or failure for one mock call
#[derive(Debug, Clone)]
enum MockReply {
    Content(String),
    RequestFailed(String),
}

/// Mock backend for tests
///
/// Returns a fixed reply, optionally after a delay, and records every request.
pub struct MockBackend {
    model_id: String,
    reply: MockReply,
    delay: Option<Duration>,
    call_count: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockBackend {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            reply: MockReply::Content("{}".to_string()),
            delay: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Set the reply content
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.reply = MockReply::Content(content.into());
        self
    }

    /// Fail every call as if the provider returned an error status
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.reply = MockReply::RequestFailed(message.into());
        self
    }

    /// Sleep before replying
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Most recent request seen by `complete`
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            MockReply::Content(content) => Ok(CompletionResponse {
                content: content.clone(),
                model: self.model_id.clone(),
            }),
            MockReply::RequestFailed(message) => Err(LlmError::RequestFailed(message.clone())),
        }
    }
}
