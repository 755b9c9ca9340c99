//! Core trait and request/response types for LLM backends

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error types for LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP client could not be constructed
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Provider answered with a non-success status
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Rate limited by the provider
    #[error("Rate limited")]
    RateLimited,

    /// Connection or transport failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Provider envelope could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// A chat-completion capable backend
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Model identifier reported back to clients
    fn id(&self) -> &str;

    /// Generate one non-streaming completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Request for one completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Conversation in order; system instructions come first
    pub messages: Vec<Message>,
    /// 0.0 to 2.0
    pub temperature: Option<f32>,
    pub response_format: Option<ResponseFormat>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp.clamp(0.0, 2.0));
        self
    }

    /// Ask the provider for a JSON object reply
    pub fn with_json_output(mut self) -> Self {
        self.response_format = Some(ResponseFormat::JsonObject);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
        }
    }
}

/// Structured output mode; plain text when unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    JsonObject,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::JsonObject => "json_object",
        }
    }
}

/// Completion text plus the model that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Raw message content; empty when the provider returned none
    pub content: String,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new(vec![Message::system("be brief"), Message::user("hello")])
            .with_temperature(5.0)
            .with_json_output();

        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(request.messages[1], Message::user("hello"));
        assert_eq!(request.temperature, Some(2.0));
        assert_eq!(request.response_format, Some(ResponseFormat::JsonObject));
    }
}
