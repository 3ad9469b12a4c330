//! Detection configuration.
//!
//! Configuration can be loaded from:
//! - TOML files with a `[detection]` table
//! - Environment variables (`RELAYGUARD_*`)
//! - Key/value settings rows kept by the relay bot
//!
//! # Example
//!
//! ```toml
//! [detection]
//! keywords = ["free crypto", "/t\\.me/\\w+bot/"]
//!
//! [detection.ai]
//! api_key = "${OPENAI_API_KEY}"
//! base_url = "https://api.openai.com/v1"
//! threshold = 0.7
//! ```

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::sync::Arc;

use regex::{Captures, Regex};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use relayguard_core::defaults::{
    AI_MODEL, ENV_KEYWORDS, SETTING_AI_API_BASE, SETTING_AI_API_KEY, SETTING_AI_ENABLED,
    SETTING_AI_MODEL, SETTING_AI_THRESHOLD,
};
use relayguard_core::{DetectionContext, FileFetcher};

use crate::ai::{AiDetector, AiDetectorConfig};
use crate::keyword::KeywordDetector;
use crate::pipeline::DetectorPipeline;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Detector setup failed: {0}")]
    Detector(#[from] relayguard_core::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete detection configuration.
#[derive(Debug, Clone, Default)]
pub struct DetectionConfig {
    /// Keyword and `/regex/` rules.
    pub keywords: Vec<String>,
    /// AI detector settings; `None` leaves the AI detector out.
    pub ai: Option<AiDetectorConfig>,
}

#[derive(Deserialize)]
struct TomlRoot {
    detection: TomlDetection,
}

#[derive(Deserialize)]
struct TomlDetection {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    ai: Option<TomlAi>,
}

#[derive(Deserialize)]
struct TomlAi {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    base_url: String,
    model: Option<String>,
    threshold: Option<f64>,
    timeout_seconds: Option<u64>,
    fetch_timeout_seconds: Option<u64>,
}

impl From<TomlAi> for AiDetectorConfig {
    fn from(ai: TomlAi) -> Self {
        let defaults = AiDetectorConfig::default();
        Self {
            api_key: ai.api_key,
            base_url: ai.base_url,
            model: ai.model.unwrap_or(defaults.model),
            threshold: ai.threshold.unwrap_or(defaults.threshold),
            timeout_seconds: ai.timeout_seconds.unwrap_or(defaults.timeout_seconds),
            fetch_timeout_seconds: ai
                .fetch_timeout_seconds
                .unwrap_or(defaults.fetch_timeout_seconds),
        }
    }
}

impl DetectionConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        info!(
            subsystem = "detect",
            component = "config",
            op = "load",
            path = %path.display(),
            "Loading detection config"
        );
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text, substituting `${VAR}` references.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let content = substitute_env_vars(content)?;
        let root: TomlRoot = toml::from_str(&content)?;

        let config = Self {
            keywords: root.detection.keywords,
            ai: root.detection.ai.map(AiDetectorConfig::from),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// The AI section is present only when both key and base URL are set.
    pub fn from_env() -> Self {
        let keywords = env::var(ENV_KEYWORDS)
            .map(|raw| split_keywords(&raw))
            .unwrap_or_default();

        let ai = AiDetectorConfig::from_env();
        debug!(
            subsystem = "detect",
            component = "config",
            op = "load",
            keyword_count = keywords.len(),
            ai_configured = ai.has_credentials(),
            "Loaded detection config from environment"
        );

        Self {
            keywords,
            ai: ai.has_credentials().then_some(ai),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(ai) = &self.ai {
            ai.validate()?;
        }
        Ok(())
    }

    /// Build the detector chain: keywords first, then AI.
    pub fn build_pipeline(
        &self,
        fetcher: Option<Arc<dyn FileFetcher>>,
    ) -> ConfigResult<DetectorPipeline> {
        let mut pipeline = DetectorPipeline::new();

        let keyword = KeywordDetector::new(&self.keywords)?;
        if !keyword.rules().is_empty() {
            pipeline.push(Arc::new(keyword));
        }

        if let Some(ai) = &self.ai {
            let mut detector = AiDetector::new(ai.clone())?;
            if let Some(fetcher) = fetcher {
                detector = detector.with_fetcher(fetcher);
            }
            pipeline.push(Arc::new(detector));
        }

        Ok(pipeline)
    }
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Substitute environment variables in the format `${VAR_NAME}`.
///
/// Unset variables are left as written.
fn substitute_env_vars(content: &str) -> ConfigResult<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
    Ok(re
        .replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string())
}

/// AI settings as stored in the relay bot's key/value settings table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiSettings {
    /// `Some(false)` when the `ai_enabled` row says `disable`.
    pub enabled: Option<bool>,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub threshold: Option<f64>,
}

impl AiSettings {
    /// Read the known keys from settings rows. Unknown keys are ignored;
    /// blank values count as absent.
    pub fn from_rows<I, K, V>(rows: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let rows: HashMap<String, String> = rows
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();

        let threshold = match rows.get(SETTING_AI_THRESHOLD) {
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
                ConfigError::Validation(format!("{} is not a number: {}", SETTING_AI_THRESHOLD, raw))
            })?),
            None => None,
        };

        Ok(Self {
            enabled: rows
                .get(SETTING_AI_ENABLED)
                .map(|v| !v.eq_ignore_ascii_case("disable")),
            api_key: rows.get(SETTING_AI_API_KEY).cloned(),
            api_base: rows.get(SETTING_AI_API_BASE).cloned(),
            model: rows.get(SETTING_AI_MODEL).cloned(),
            threshold,
        })
    }

    /// Detector configuration. Missing key or base URL leaves the detector
    /// disabled rather than failing.
    pub fn detector_config(&self) -> AiDetectorConfig {
        let defaults = AiDetectorConfig::default();
        AiDetectorConfig {
            api_key: self.api_key.clone().unwrap_or_default(),
            base_url: self.api_base.clone().unwrap_or_default(),
            model: self.model.clone().unwrap_or_else(|| AI_MODEL.to_string()),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            ..defaults
        }
    }

    /// Context carrying the `ai_enabled` override.
    pub fn context(&self) -> DetectionContext {
        DetectionContext {
            enable_ai: self.enabled,
            ..DetectionContext::default()
        }
    }
}
