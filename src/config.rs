//! Configuration for the deposit-insurance assistant
//!
//! One `AssistantConfig` is built from the environment at startup and shared
//! read-only with every request handler. Thresholds are tunable via env so
//! the confidence gates are not buried in classifier logic.

use crate::error::{AssistantError, Result};
use std::env;
use std::time::Duration;

const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Classification mode, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationMode {
    /// Rules first, LLM consulted for low-confidence cases.
    Llm,
    /// Rules only; the external collaborator is never contacted.
    Rules,
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub mode: ClassificationMode,
    pub gemini_api_key: String,
    /// Base URL of the generateContent endpoint; overridable so tests can
    /// point the client at a local server.
    pub gemini_api_url: String,
    pub model_name: String,
    pub fallback_model: String,
    pub llm_timeout: Duration,
    /// Rules result at or above this confidence skips the LLM entirely.
    pub rules_skip_threshold: f32,
    /// Restricted-category rules result at or above this confidence skips
    /// the LLM. Lower than the general gate: a false-negative restricted
    /// classification is the costliest error.
    pub restricted_skip_threshold: f32,
}

impl AssistantConfig {
    /// Load configuration from the environment (reads `.env` first).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();

        let mode = match env::var("CLASSIFICATION_MODE")
            .unwrap_or_else(|_| "llm".to_string())
            .to_lowercase()
            .as_str()
        {
            "rules" => ClassificationMode::Rules,
            // Without an API key the llm mode cannot work; run rules-only.
            "llm" if gemini_api_key.is_empty() => ClassificationMode::Rules,
            "llm" => ClassificationMode::Llm,
            other => {
                return Err(AssistantError::Config(format!(
                    "CLASSIFICATION_MODE must be 'llm' or 'rules', got '{}'",
                    other
                )))
            }
        };

        let config = Self {
            mode,
            gemini_api_key,
            gemini_api_url: env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_URL.to_string()),
            model_name: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            fallback_model: env::var("GEMINI_FALLBACK_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash-8b".to_string()),
            llm_timeout: Duration::from_secs(parse_var("LLM_TIMEOUT_SECS", 15)?),
            rules_skip_threshold: parse_threshold("RULES_SKIP_THRESHOLD", 0.90)?,
            restricted_skip_threshold: parse_threshold("RESTRICTED_SKIP_THRESHOLD", 0.70)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Rules-only configuration with default thresholds, used by the CLI
    /// `--rules` flag and by tests.
    pub fn rules_only() -> Self {
        Self {
            mode: ClassificationMode::Rules,
            gemini_api_key: String::new(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            model_name: "gemini-1.5-flash".to_string(),
            fallback_model: "gemini-1.5-flash-8b".to_string(),
            llm_timeout: Duration::from_secs(15),
            rules_skip_threshold: 0.90,
            restricted_skip_threshold: 0.70,
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("RULES_SKIP_THRESHOLD", self.rules_skip_threshold),
            ("RESTRICTED_SKIP_THRESHOLD", self.restricted_skip_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AssistantError::Config(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.restricted_skip_threshold > self.rules_skip_threshold {
            return Err(AssistantError::Config(
                "RESTRICTED_SKIP_THRESHOLD must not exceed RULES_SKIP_THRESHOLD".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_var(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AssistantError::Config(format!("{} must be an integer, got '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

fn parse_threshold(name: &str, default: f32) -> Result<f32> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AssistantError::Config(format!("{} must be a number, got '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_only_defaults() {
        let config = AssistantConfig::rules_only();
        assert_eq!(config.mode, ClassificationMode::Rules);
        assert_eq!(config.rules_skip_threshold, 0.90);
        assert_eq!(config.restricted_skip_threshold, 0.70);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut config = AssistantConfig::rules_only();
        config.rules_skip_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut config = AssistantConfig::rules_only();
        config.restricted_skip_threshold = 0.95;
        assert!(config.validate().is_err());
    }
}
