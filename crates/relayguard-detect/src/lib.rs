//! # relayguard-detect
//!
//! Spam detectors for the relayguard Telegram relay.
//!
//! This crate provides:
//! - Keyword detector (phrases and `/regex/` rules)
//! - AI detector for OpenAI-compatible chat-completion endpoints, with
//!   image attachments and tolerant response parsing
//! - Ordered detector pipeline
//! - TOML, environment, and settings-row configuration
//!
//! Detection never fails the relay path: every detector error resolves to a
//! clean verdict.
//!
//! # Example
//!
//! ```rust,no_run
//! use relayguard_core::Message;
//! use relayguard_detect::DetectionConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = DetectionConfig::from_env().build_pipeline(None).unwrap();
//!     let verdict = pipeline.check(&Message::text("free crypto"), None).await;
//!     println!("spam: {}", verdict.is_spam());
//! }
//! ```

pub mod ai;
pub mod config;
pub mod keyword;
pub mod pipeline;

#[cfg(test)]
pub mod mock;

pub use ai::{AiDetector, AiDetectorConfig, ClassifyError};
pub use config::{AiSettings, ConfigError, ConfigResult, DetectionConfig};
pub use keyword::{KeywordDetector, KeywordRule};
pub use pipeline::DetectorPipeline;

// Re-export core types for convenience
pub use relayguard_core::{
    DetectionContext, DetectionMethod, DetectionVerdict, Evidence, FileFetcher, Message,
    SpamDetector,
};
