//! Centralized default constants for relayguard.
//!
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// AI DETECTOR
// =============================================================================

/// Default chat-completion model.
pub const AI_MODEL: &str = "gpt-3.5-turbo";

/// Minimum model confidence for a positive AI signal to count as spam.
pub const AI_THRESHOLD: f64 = 0.5;

/// Confidence assumed when the model omits it or returns garbage.
pub const AI_FALLBACK_CONFIDENCE: f64 = 0.5;

/// Timeout for the classification request, in seconds.
pub const AI_TIMEOUT_SECS: u64 = 15;

/// Timeout for each attachment download, in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 10;

/// Media type used when neither the sender nor the bytes tell us.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Name reported by the AI detector.
pub const AI_DETECTOR_NAME: &str = "AI Detector";

// =============================================================================
// KEYWORD DETECTOR
// =============================================================================

/// Name reported by the keyword detector.
pub const KEYWORD_DETECTOR_NAME: &str = "Keyword Detector";

// =============================================================================
// PROVIDER ENDPOINTS
// =============================================================================

/// OpenAI API root.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Gemini OpenAI-compatibility layer root.
pub const GEMINI_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

// =============================================================================
// SETTINGS KEYS
// =============================================================================

/// Settings row switching AI detection on (`enable`) or off (`disable`).
pub const SETTING_AI_ENABLED: &str = "ai_enabled";

pub const SETTING_AI_API_KEY: &str = "ai_api_key";

pub const SETTING_AI_API_BASE: &str = "ai_api_base";

pub const SETTING_AI_MODEL: &str = "ai_model";

pub const SETTING_AI_THRESHOLD: &str = "ai_threshold";

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

pub const ENV_AI_API_KEY: &str = "RELAYGUARD_AI_API_KEY";

pub const ENV_AI_BASE_URL: &str = "RELAYGUARD_AI_BASE_URL";

pub const ENV_AI_MODEL: &str = "RELAYGUARD_AI_MODEL";

pub const ENV_AI_THRESHOLD: &str = "RELAYGUARD_AI_THRESHOLD";

pub const ENV_AI_TIMEOUT: &str = "RELAYGUARD_AI_TIMEOUT";

pub const ENV_FETCH_TIMEOUT: &str = "RELAYGUARD_FETCH_TIMEOUT";

/// Comma-separated keyword rules.
pub const ENV_KEYWORDS: &str = "RELAYGUARD_KEYWORDS";
