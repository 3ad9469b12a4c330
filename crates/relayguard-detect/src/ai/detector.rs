//! OpenAI-compatible AI spam detector.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};

use relayguard_core::defaults::{
    AI_DETECTOR_NAME, AI_MODEL, AI_THRESHOLD, AI_TIMEOUT_SECS, ENV_AI_API_KEY, ENV_AI_BASE_URL,
    ENV_AI_MODEL, ENV_AI_THRESHOLD, ENV_AI_TIMEOUT, ENV_FETCH_TIMEOUT, FETCH_TIMEOUT_SECS,
};
use relayguard_core::{
    DetectionContext, DetectionVerdict, Error, FileFetcher, Message, Result, SpamDetector,
};

use super::error::{fail_open, ClassifyError};
use super::images::{collect_image_parts, ImagePart};
use super::normalize::extract_content;
use super::policy::ModelAnswer;
use super::types::{ChatCompletionRequest, ChatMessage, ContentBlock};

/// System prompt sent with every classification request.
pub const SYSTEM_PROMPT: &str = "You are a strict spam filter for a Telegram relay bot. \
Return JSON with fields: spam (boolean), confidence (0-1), reason (short text). \
Mark spam when the message or attached images are unsolicited ads, phishing, scams, or mass promotion. \
Only return the JSON object. Do not return any other text.";

/// User text substituted when a message carries only images.
pub const IMAGE_ONLY_PROMPT: &str =
    "No user text was provided. Review only the attached images for spam.";

/// Configuration for the AI detector.
#[derive(Clone)]
pub struct AiDetectorConfig {
    /// API key; blank disables the detector.
    pub api_key: String,
    /// Provider endpoint root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Chat-completion model.
    pub model: String,
    /// Minimum model confidence for a spam verdict.
    pub threshold: f64,
    /// Classification request timeout in seconds.
    pub timeout_seconds: u64,
    /// Per-attachment download timeout in seconds.
    pub fetch_timeout_seconds: u64,
}

impl Default for AiDetectorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::new(),
            model: AI_MODEL.to_string(),
            threshold: AI_THRESHOLD,
            timeout_seconds: AI_TIMEOUT_SECS,
            fetch_timeout_seconds: FETCH_TIMEOUT_SECS,
        }
    }
}

// Keeps the API key out of logs.
impl fmt::Debug for AiDetectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiDetectorConfig")
            .field(
                "api_key",
                &if self.api_key.is_empty() {
                    "<unset>"
                } else {
                    "<redacted>"
                },
            )
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("threshold", &self.threshold)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("fetch_timeout_seconds", &self.fetch_timeout_seconds)
            .finish()
    }
}

impl AiDetectorConfig {
    /// Config for `base_url` and `api_key` with defaults elsewhere.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Create from environment variables.
    ///
    /// Unset or unparsable values fall back to defaults; a missing key or
    /// base URL yields a config whose detector reports itself disabled.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(ENV_AI_API_KEY).unwrap_or_default(),
            base_url: std::env::var(ENV_AI_BASE_URL).unwrap_or_default(),
            model: std::env::var(ENV_AI_MODEL)
                .ok()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| AI_MODEL.to_string()),
            threshold: std::env::var(ENV_AI_THRESHOLD)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(AI_THRESHOLD),
            timeout_seconds: std::env::var(ENV_AI_TIMEOUT)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(AI_TIMEOUT_SECS),
            fetch_timeout_seconds: std::env::var(ENV_FETCH_TIMEOUT)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(FETCH_TIMEOUT_SECS),
        }
    }

    /// Whether credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.base_url.trim().is_empty()
    }

    /// Validate numeric settings and, when present, the URL scheme.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::Config(format!(
                "AI threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }

        if self.timeout_seconds == 0 {
            return Err(Error::Config(
                "AI request timeout must be greater than zero".to_string(),
            ));
        }

        if self.fetch_timeout_seconds == 0 {
            return Err(Error::Config(
                "Attachment fetch timeout must be greater than zero".to_string(),
            ));
        }

        let base_url = self.base_url.trim();
        if !base_url.is_empty()
            && !base_url.starts_with("http://")
            && !base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "AI base_url must start with http:// or https://, got: {}",
                base_url
            )));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

/// Spam detector delegating classification to an OpenAI-compatible model.
///
/// Works with text-only and multimodal providers. Images are only sent when
/// a [`FileFetcher`] is supplied.
pub struct AiDetector {
    client: Client,
    config: AiDetectorConfig,
    fetcher: Option<Arc<dyn FileFetcher>>,
}

impl AiDetector {
    /// Create a detector with the given configuration.
    pub fn new(mut config: AiDetectorConfig) -> Result<Self> {
        config.validate()?;
        config.api_key = config.api_key.trim().to_string();
        config.base_url = config.base_url.trim().trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "detect",
            component = "ai",
            op = "init",
            base_url = %config.base_url,
            model = %config.model,
            threshold = config.threshold,
            has_credentials = config.has_credentials(),
            "Initializing AI spam detector"
        );

        Ok(Self {
            client,
            config,
            fetcher: None,
        })
    }

    /// Attach a file fetcher so image attachments are classified too.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn FileFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AiDetectorConfig {
        &self.config
    }

    /// Run the full classification, reporting every failure explicitly.
    ///
    /// [`SpamDetector::detect`] is this method followed by [`fail_open`].
    pub async fn classify(
        &self,
        message: &Message,
        context: Option<&DetectionContext>,
    ) -> std::result::Result<DetectionVerdict, ClassifyError> {
        if !self.enabled(context) {
            return Err(ClassifyError::Disabled);
        }
        if message.is_empty() {
            return Err(ClassifyError::EmptyInput);
        }

        let images = match &self.fetcher {
            Some(fetcher) if message.has_images() => {
                collect_image_parts(fetcher.as_ref(), message, self.config.fetch_timeout()).await
            }
            _ => Vec::new(),
        };

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: 0.0,
            messages: build_messages(message.primary_text(), &images),
        };

        let body = self.send(&request, images.len()).await?;
        let content = extract_content(&body)?;
        let answer = ModelAnswer::parse(&content)?;

        debug!(
            subsystem = "detect",
            component = "ai",
            op = "classify",
            spam = answer.spam,
            confidence = answer.confidence,
            "Model answered"
        );

        Ok(answer.into_verdict(self.name(), self.config.threshold))
    }

    async fn send(
        &self,
        request: &ChatCompletionRequest,
        image_count: usize,
    ) -> std::result::Result<String, ClassifyError> {
        let start = Instant::now();
        let url = format!("{}/chat/completions", self.config.base_url);

        debug!(
            subsystem = "detect",
            component = "ai",
            op = "request",
            model = %self.config.model,
            image_count,
            "Sending classification request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        debug!(
            subsystem = "detect",
            component = "ai",
            op = "response",
            status = status.as_u16(),
            response_len = body.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Classification response received"
        );

        if !status.is_success() {
            return Err(ClassifyError::from_status(status.as_u16(), &body));
        }

        Ok(body)
    }
}

/// Build the two-message chat payload.
pub fn build_messages(user_text: &str, images: &[ImagePart]) -> Vec<ChatMessage> {
    let text = if user_text.is_empty() {
        IMAGE_ONLY_PROMPT
    } else {
        user_text
    };

    let mut user_blocks = vec![ContentBlock::text(text)];
    user_blocks.extend(images.iter().map(ImagePart::to_content_block));

    vec![
        ChatMessage::system(vec![ContentBlock::text(SYSTEM_PROMPT)]),
        ChatMessage::user(user_blocks),
    ]
}

#[async_trait]
impl SpamDetector for AiDetector {
    #[instrument(skip_all, fields(subsystem = "detect", component = "ai", op = "detect"))]
    async fn detect(
        &self,
        message: &Message,
        context: Option<&DetectionContext>,
    ) -> DetectionVerdict {
        match self.classify(message, context).await {
            Ok(verdict) => {
                if let Some(evidence) = verdict.evidence() {
                    info!(
                        detector = self.name(),
                        method = %evidence.method,
                        confidence = evidence.confidence.unwrap_or_default(),
                        reason = evidence.reason.as_deref().unwrap_or(""),
                        "AI detector flagged message as spam"
                    );
                }
                verdict
            }
            Err(e) => fail_open(self.name(), &e),
        }
    }

    fn name(&self) -> &str {
        AI_DETECTOR_NAME
    }

    /// Enabled only with credentials and no explicit context opt-out.
    fn enabled(&self, context: Option<&DetectionContext>) -> bool {
        self.config.has_credentials() && !DetectionContext::ai_disabled(context)
    }
}
