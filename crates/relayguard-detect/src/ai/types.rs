//! Chat-completion request and error types for OpenAI-compatible providers.
//!
//! Responses are deliberately not modelled here: providers disagree on their
//! shape, so they are decoded into `serde_json::Value` and handled by
//! [`super::normalize`].

use serde::{Deserialize, Serialize};

// =============================================================================
// CHAT COMPLETION REQUEST
// =============================================================================

/// Request body for the chat completions endpoint.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

/// A single chat message in list-of-blocks form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

impl ChatMessage {
    pub fn system(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: "system".to_string(),
            content: blocks,
        }
    }

    pub fn user(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: "user".to_string(),
            content: blocks,
        }
    }
}

/// One block of multimodal message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// Inline image reference; `url` is a `data:` URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error response body returned by OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
pub struct ProviderErrorResponse {
    pub error: ProviderError,
}

/// Detailed error information.
#[derive(Debug, Deserialize)]
pub struct ProviderError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}
