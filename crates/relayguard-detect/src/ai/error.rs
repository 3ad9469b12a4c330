//! Classification errors and the fail-open policy.
//!
//! Every fallible step of AI classification returns a [`ClassifyError`].
//! [`fail_open`] is the single place that turns any of them into the safe
//! verdict.

use relayguard_core::DetectionVerdict;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::ProviderErrorResponse;

/// Provider error classes derived from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit or quota exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request rejected as malformed (often an unsupported image type).
    BadRequest,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl ProviderErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401 | 403, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400 | 422, _) => Self::BadRequest,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationError => "auth",
            Self::RateLimitExceeded => "rate_limited",
            Self::ModelNotFound => "model_not_found",
            Self::BadRequest => "bad_request",
            Self::ServerError => "server_error",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a classification attempt produced no usable answer.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Credentials missing or AI switched off for this message.
    #[error("AI detection disabled")]
    Disabled,

    /// Nothing to classify.
    #[error("message has no text, caption, or image")]
    EmptyInput,

    /// Connection-level failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Provider answered with a non-success status.
    #[error("provider returned {status} ({code}): {message}")]
    Status {
        code: ProviderErrorCode,
        status: u16,
        message: String,
    },

    /// Response body was not JSON.
    #[error("malformed response body: {0}")]
    MalformedResponse(String),

    /// No text payload could be located in the response.
    #[error("response carried no content")]
    MissingContent,

    /// The model's text payload was not a JSON object.
    #[error("model payload is not a JSON object: {0}")]
    InvalidPayload(String),
}

impl ClassifyError {
    /// Build a status error from the provider's response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed = parse_error_body(body);
        let error_type = parsed
            .as_ref()
            .and_then(|e| e.error.error_type.clone())
            .unwrap_or_default();
        let message = parsed
            .map(|e| e.error.message)
            .unwrap_or_else(|| truncate(body, 200).to_string());

        Self::Status {
            code: ProviderErrorCode::from_response(status, &error_type),
            status,
            message,
        }
    }

    /// Whether this outcome is expected and not worth a warning.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::Disabled | Self::EmptyInput)
    }
}

impl From<reqwest::Error> for ClassifyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Map any classification error to the safe verdict, logging it.
///
/// A misbehaving or unreachable model must never block relay, so every
/// error kind yields [`DetectionVerdict::Clean`].
pub fn fail_open(detector: &str, error: &ClassifyError) -> DetectionVerdict {
    if error.is_expected() {
        debug!(
            subsystem = "detect",
            component = "ai",
            detector,
            reason = %error,
            "AI detection skipped"
        );
    } else {
        warn!(
            subsystem = "detect",
            component = "ai",
            detector,
            error = %error,
            "AI spam detection failed, treating message as not spam"
        );
    }
    DetectionVerdict::Clean
}

// Gemini wraps its error object in a one-element array.
fn parse_error_body(body: &str) -> Option<ProviderErrorResponse> {
    serde_json::from_str::<ProviderErrorResponse>(body)
        .ok()
        .or_else(|| {
            serde_json::from_str::<Vec<ProviderErrorResponse>>(body)
                .ok()
                .and_then(|v| v.into_iter().next())
        })
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
