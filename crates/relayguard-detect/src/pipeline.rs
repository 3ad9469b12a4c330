//! Ordered detector chain.

use std::sync::Arc;
use std::time::Instant;

use relayguard_core::{DetectionContext, DetectionVerdict, Message, SpamDetector};
use tracing::{debug, info};

/// Runs detectors in order and returns the first positive verdict.
///
/// Detectors reporting themselves disabled are skipped without calling
/// `detect`.
#[derive(Clone, Default)]
pub struct DetectorPipeline {
    detectors: Vec<Arc<dyn SpamDetector>>,
}

impl DetectorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a detector to the end of the chain.
    pub fn push(&mut self, detector: Arc<dyn SpamDetector>) {
        self.detectors.push(detector);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_detector(mut self, detector: Arc<dyn SpamDetector>) -> Self {
        self.push(detector);
        self
    }

    pub fn detectors(&self) -> &[Arc<dyn SpamDetector>] {
        &self.detectors
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Names of the detectors eligible for `context`, in order.
    pub fn enabled_detectors(&self, context: Option<&DetectionContext>) -> Vec<&str> {
        self.detectors
            .iter()
            .filter(|d| d.enabled(context))
            .map(|d| d.name())
            .collect()
    }

    /// Classify a message.
    pub async fn check(
        &self,
        message: &Message,
        context: Option<&DetectionContext>,
    ) -> DetectionVerdict {
        let start = Instant::now();

        for detector in &self.detectors {
            if !detector.enabled(context) {
                debug!(
                    subsystem = "detect",
                    component = "pipeline",
                    op = "check",
                    detector = detector.name(),
                    "Detector disabled, skipping"
                );
                continue;
            }

            let verdict = detector.detect(message, context).await;
            if verdict.is_spam() {
                info!(
                    subsystem = "detect",
                    component = "pipeline",
                    op = "check",
                    detector = detector.name(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Message classified as spam"
                );
                return verdict;
            }
        }

        debug!(
            subsystem = "detect",
            component = "pipeline",
            op = "check",
            detector_count = self.detectors.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Message classified as clean"
        );
        DetectionVerdict::Clean
    }
}
