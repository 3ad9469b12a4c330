//! Data models shared by detectors and the relay layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// =============================================================================
// INBOUND MESSAGE
// =============================================================================

/// An inbound chat message as handed over by the relay layer.
///
/// Detectors only ever see `&Message`; nothing in the detection path can
/// modify it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Caption attached to a media message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Media attached to the message, in transport order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Create a text-only message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Append an attachment.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Non-empty text, if any.
    pub fn text_content(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Non-empty caption, if any.
    pub fn caption_content(&self) -> Option<&str> {
        self.caption.as_deref().filter(|c| !c.is_empty())
    }

    /// Text, else caption, else the empty string.
    pub fn primary_text(&self) -> &str {
        self.text_content()
            .or_else(|| self.caption_content())
            .unwrap_or("")
    }

    /// Whether any attachment is an image the classifier could look at.
    pub fn has_images(&self) -> bool {
        self.attachments.iter().any(Attachment::is_image)
    }

    /// True when there is no text, no caption, and no image.
    pub fn is_empty(&self) -> bool {
        self.text_content().is_none() && self.caption_content().is_none() && !self.has_images()
    }
}

/// A single size variant of a photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoSize {
    /// Opaque transport file handle.
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl PhotoSize {
    /// Pixel area used to rank size variants.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// A file sent as a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Opaque transport file handle.
    pub file_id: String,
    /// Media type declared by the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl Document {
    /// Documents count as images only when they declare an `image/*` type.
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.starts_with("image/"))
    }
}

/// Media attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    /// One photo delivered in several resolutions.
    Photo { sizes: Vec<PhotoSize> },
    /// A document; an image only if its declared type says so.
    Document(Document),
}

impl Attachment {
    /// Build a photo attachment from its size variants.
    pub fn photo(sizes: Vec<PhotoSize>) -> Self {
        Self::Photo { sizes }
    }

    /// Build a document attachment.
    pub fn document(file_id: impl Into<String>, mime_type: Option<&str>) -> Self {
        Self::Document(Document {
            file_id: file_id.into(),
            mime_type: mime_type.map(str::to_string),
            file_name: None,
        })
    }

    pub fn is_image(&self) -> bool {
        match self {
            Self::Photo { sizes } => !sizes.is_empty(),
            Self::Document(doc) => doc.is_image(),
        }
    }

    /// File handle and declared media type of the image to fetch, if this
    /// attachment is an image.
    ///
    /// Photos resolve to their largest variant; ties keep the later entry,
    /// which is the transport's own "largest last" ordering.
    pub fn image_source(&self) -> Option<(&str, Option<&str>)> {
        match self {
            Self::Photo { sizes } => sizes
                .iter()
                .max_by_key(|s| s.area())
                .map(|s| (s.file_id.as_str(), None)),
            Self::Document(doc) if doc.is_image() => {
                Some((doc.file_id.as_str(), doc.mime_type.as_deref()))
            }
            Self::Document(_) => None,
        }
    }
}

// =============================================================================
// DETECTION CONTEXT
// =============================================================================

/// Run-time flags consulted by detectors to decide eligibility.
///
/// `None` for a flag means "no override".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_ai: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_keyword: Option<bool>,
    /// Flags not understood by the built-in detectors.
    #[serde(flatten)]
    pub extra: HashMap<String, JsonValue>,
}

impl DetectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ai(mut self, enabled: bool) -> Self {
        self.enable_ai = Some(enabled);
        self
    }

    pub fn with_keyword(mut self, enabled: bool) -> Self {
        self.enable_keyword = Some(enabled);
        self
    }

    /// True only when the context explicitly turns AI detection off.
    pub fn ai_disabled(context: Option<&Self>) -> bool {
        context.and_then(|c| c.enable_ai) == Some(false)
    }

    /// True only when the context explicitly turns keyword detection off.
    pub fn keyword_disabled(context: Option<&Self>) -> bool {
        context.and_then(|c| c.enable_keyword) == Some(false)
    }
}

// =============================================================================
// VERDICT
// =============================================================================

/// Detector family that produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    Keyword,
    Ai,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Ai => "ai",
        }
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured data explaining a positive verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub method: DetectionMethod,
    /// Human-readable detector name.
    pub detector: String,
    /// Keyword rule that matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
    /// Model-reported confidence in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Model-supplied explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Evidence {
    pub fn keyword(detector: impl Into<String>, matched: impl Into<String>) -> Self {
        Self {
            method: DetectionMethod::Keyword,
            detector: detector.into(),
            matched: Some(matched.into()),
            confidence: None,
            reason: None,
        }
    }

    pub fn ai(detector: impl Into<String>, confidence: f64, reason: Option<String>) -> Self {
        Self {
            method: DetectionMethod::Ai,
            detector: detector.into(),
            matched: None,
            confidence: Some(confidence),
            reason,
        }
    }
}

/// Outcome of running one detector over one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "evidence", rename_all = "lowercase")]
pub enum DetectionVerdict {
    /// Not spam, or the detector could not decide.
    #[default]
    Clean,
    /// Spam, with the evidence behind the decision.
    Spam(Evidence),
}

impl DetectionVerdict {
    pub fn is_spam(&self) -> bool {
        matches!(self, Self::Spam(_))
    }

    pub fn evidence(&self) -> Option<&Evidence> {
        match self {
            Self::Spam(evidence) => Some(evidence),
            Self::Clean => None,
        }
    }

    /// The `(is_spam, evidence)` pair view.
    pub fn into_parts(self) -> (bool, Option<Evidence>) {
        match self {
            Self::Spam(evidence) => (true, Some(evidence)),
            Self::Clean => (false, None),
        }
    }
}
