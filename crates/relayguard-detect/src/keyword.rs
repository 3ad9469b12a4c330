//! Operator-configured keyword and pattern detector.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use tracing::{debug, info};

use relayguard_core::defaults::KEYWORD_DETECTOR_NAME;
use relayguard_core::{
    DetectionContext, DetectionVerdict, Error, Evidence, Message, Result, SpamDetector,
};

/// A single blocking rule.
#[derive(Debug, Clone)]
pub enum KeywordRule {
    /// Case-insensitive substring. Stores the original and lowercased text.
    Phrase { rule: String, needle: String },
    /// Case-insensitive regex written as `/pattern/`.
    Pattern { rule: String, regex: Regex },
}

impl KeywordRule {
    /// Parse a rule string. Returns `Ok(None)` for blank rules.
    pub fn parse(raw: &str) -> Result<Option<Self>> {
        let rule = raw.trim();
        if rule.is_empty() {
            return Ok(None);
        }

        if rule.len() >= 2 && rule.starts_with('/') && rule.ends_with('/') {
            let pattern = &rule[1..rule.len() - 1];
            if pattern.is_empty() {
                return Ok(None);
            }
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| Error::Config(format!("Invalid keyword pattern {}: {}", rule, e)))?;
            return Ok(Some(Self::Pattern {
                rule: rule.to_string(),
                regex,
            }));
        }

        Ok(Some(Self::Phrase {
            rule: rule.to_string(),
            needle: rule.to_lowercase(),
        }))
    }

    /// The rule as configured.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Phrase { rule, .. } | Self::Pattern { rule, .. } => rule,
        }
    }

    /// Match against text that has already been lowercased (for phrases)
    /// and its original form (for patterns).
    fn matches(&self, original: &str, lowered: &str) -> bool {
        match self {
            Self::Phrase { needle, .. } => lowered.contains(needle.as_str()),
            Self::Pattern { regex, .. } => regex.is_match(original),
        }
    }
}

/// Detector that flags messages containing a blocked phrase or pattern.
#[derive(Debug, Clone, Default)]
pub struct KeywordDetector {
    rules: Vec<KeywordRule>,
}

impl KeywordDetector {
    /// Build from raw rule strings. Fails on the first invalid pattern.
    pub fn new<I, S>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for raw in rules {
            if let Some(rule) = KeywordRule::parse(raw.as_ref())? {
                parsed.push(rule);
            }
        }

        debug!(
            subsystem = "detect",
            component = "keyword",
            op = "init",
            rule_count = parsed.len(),
            "Keyword detector configured"
        );

        Ok(Self { rules: parsed })
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// First rule matching the text, then the caption.
    pub fn find_match(&self, message: &Message) -> Option<&KeywordRule> {
        [message.text_content(), message.caption_content()]
            .into_iter()
            .flatten()
            .find_map(|field| {
                let lowered = field.to_lowercase();
                self.rules.iter().find(|rule| rule.matches(field, &lowered))
            })
    }
}

#[async_trait]
impl SpamDetector for KeywordDetector {
    async fn detect(
        &self,
        message: &Message,
        context: Option<&DetectionContext>,
    ) -> DetectionVerdict {
        if !self.enabled(context) {
            return DetectionVerdict::Clean;
        }

        match self.find_match(message) {
            Some(rule) => {
                info!(
                    subsystem = "detect",
                    component = "keyword",
                    op = "detect",
                    detector = self.name(),
                    matched = rule.as_str(),
                    "Keyword detector flagged message as spam"
                );
                DetectionVerdict::Spam(Evidence::keyword(self.name(), rule.as_str()))
            }
            None => DetectionVerdict::Clean,
        }
    }

    fn name(&self) -> &str {
        KEYWORD_DETECTOR_NAME
    }

    fn enabled(&self, context: Option<&DetectionContext>) -> bool {
        !DetectionContext::keyword_disabled(context)
    }
}
