//! Confidence policy: turns the model's JSON answer into a verdict.

use relayguard_core::defaults::AI_FALLBACK_CONFIDENCE;
use relayguard_core::{DetectionVerdict, Evidence};
use serde_json::{Map, Value};

use super::error::ClassifyError;

/// The model's answer after tolerant field coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAnswer {
    pub spam: bool,
    pub confidence: f64,
    pub reason: Option<String>,
}

impl ModelAnswer {
    /// Parse the extracted text payload.
    ///
    /// The payload must be a JSON object; individual fields are coerced and
    /// never fail the parse.
    pub fn parse(payload: &str) -> Result<Self, ClassifyError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|_| ClassifyError::InvalidPayload(preview(payload)))?;
        match value {
            Value::Object(fields) => Ok(Self::from_fields(&fields)),
            _ => Err(ClassifyError::InvalidPayload(preview(payload))),
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            spam: fields.get("spam").and_then(Value::as_bool).unwrap_or(false),
            confidence: clamp_confidence(fields.get("confidence")),
            reason: match fields.get("reason") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            },
        }
    }

    /// Apply the threshold: spam only when flagged and confident enough.
    pub fn into_verdict(self, detector: &str, threshold: f64) -> DetectionVerdict {
        if self.spam && self.confidence >= threshold {
            DetectionVerdict::Spam(Evidence::ai(detector, self.confidence, self.reason))
        } else {
            DetectionVerdict::Clean
        }
    }
}

/// Coerce a raw confidence value into [0.0, 1.0].
///
/// Numbers and numeric strings are clamped; booleans map to 1.0/0.0;
/// anything else (missing, null, NaN, text) yields the fallback of 0.5.
pub fn clamp_confidence(raw: Option<&Value>) -> f64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    match parsed {
        Some(c) if !c.is_nan() => c.clamp(0.0, 1.0),
        _ => AI_FALLBACK_CONFIDENCE,
    }
}

fn preview(payload: &str) -> String {
    payload.chars().take(120).collect()
}
