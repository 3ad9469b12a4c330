//! AI spam detection over OpenAI-compatible chat-completion endpoints.
//!
//! The detector sends message text and optional image attachments to the
//! configured model, tolerates the response shapes of several providers,
//! and applies a confidence threshold to the model's answer. Every failure
//! is reported as a [`ClassifyError`] internally and mapped to a clean
//! verdict by [`fail_open`].

pub mod detector;
pub mod error;
pub mod images;
pub mod normalize;
pub mod policy;
pub mod types;

pub use detector::{build_messages, AiDetector, AiDetectorConfig, IMAGE_ONLY_PROMPT, SYSTEM_PROMPT};
pub use error::{fail_open, ClassifyError, ProviderErrorCode};
pub use images::{collect_image_parts, ImagePart};
pub use normalize::{extract_content, strip_code_fence};
pub use policy::{clamp_confidence, ModelAnswer};
