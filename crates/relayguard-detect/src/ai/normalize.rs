//! Response normalization for heterogeneous OpenAI-compatible providers.
//!
//! Decoding happens in two stages. The body is first parsed into a loosely
//! typed [`serde_json::Value`]; an ordered list of extraction rules then runs
//! over the first choice and the first rule that yields text wins:
//!
//! 1. `message.content` as a plain string (OpenAI).
//! 2. `message.content` as a list of parts (Gemini compatibility layer and
//!    other multimodal responders).
//! 3. `content` or `text` directly on the choice (legacy completions shape).
//!
//! The winning text is trimmed and unwrapped from a Markdown code fence.

use serde_json::Value;

use super::error::ClassifyError;

type ExtractionRule = fn(&Value) -> Option<String>;

const EXTRACTION_RULES: [ExtractionRule; 3] =
    [message_text_content, message_parts_content, choice_level_content];

/// Extract the model's text payload from a raw response body.
pub fn extract_content(body: &str) -> Result<String, ClassifyError> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;
    extract_from_value(&document).ok_or(ClassifyError::MissingContent)
}

fn extract_from_value(document: &Value) -> Option<String> {
    let choice = document.get("choices")?.as_array()?.first()?;

    EXTRACTION_RULES
        .iter()
        .find_map(|rule| rule(choice))
        .map(|content| strip_code_fence(&content))
}

fn message_text_content(choice: &Value) -> Option<String> {
    choice
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

fn message_parts_content(choice: &Value) -> Option<String> {
    let parts = choice.get("message")?.get("content")?.as_array()?;

    let texts: Vec<String> = parts
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|part| part.get("text").or_else(|| part.get("content")))
        .map(value_to_text)
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}

fn choice_level_content(choice: &Value) -> Option<String> {
    ["content", "text"]
        .iter()
        .filter_map(|key| choice.get(*key)?.as_str())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Trim the payload and unwrap a surrounding triple-backtick fence.
///
/// When the fenced body spans several lines, the opening line (the language
/// tag, possibly empty) is dropped.
pub fn strip_code_fence(content: &str) -> String {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let inner = trimmed.trim_matches('`');
    let body = match inner.split_once('\n') {
        Some((_language_tag, rest)) => rest,
        None => inner,
    };
    body.trim().to_string()
}
