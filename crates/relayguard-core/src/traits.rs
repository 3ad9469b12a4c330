//! Core traits for relayguard abstractions.
//!
//! These traits define the interfaces that concrete detectors and transport
//! collaborators must satisfy, enabling pluggable detectors and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DetectionContext, DetectionVerdict, Message};

// =============================================================================
// DETECTOR CONTRACT
// =============================================================================

/// A spam detector.
///
/// Implementations are long-lived, shared across concurrent detections, and
/// hold no per-message state. `detect` returns a verdict rather than a
/// `Result`: a broken detector reports [`DetectionVerdict::Clean`] so it can
/// never block message relay.
#[async_trait]
pub trait SpamDetector: Send + Sync {
    /// Classify a message.
    async fn detect(
        &self,
        message: &Message,
        context: Option<&DetectionContext>,
    ) -> DetectionVerdict;

    /// Stable, human-readable name used in evidence and logs.
    fn name(&self) -> &str;

    /// Cheap eligibility check; the orchestrator skips detectors that
    /// report `false` without calling `detect`.
    fn enabled(&self, _context: Option<&DetectionContext>) -> bool {
        true
    }
}

// =============================================================================
// TRANSPORT COLLABORATORS
// =============================================================================

/// Fetches raw file bytes from the chat transport by opaque file handle.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch_file(&self, file_id: &str) -> Result<Vec<u8>>;
}
