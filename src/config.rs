//! Configuration types and environment loading.

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{HttpGenerativeClient, RateLimitConfig, RateLimiter};
use crate::session::QuizPolicy;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the chat-completion endpoint (without trailing path).
    pub api_base: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Bearer credential. `None` or a placeholder value makes every
    /// generative call fail cleanly; the engine runs on fallbacks.
    pub api_key: Option<SecretString>,
    pub rate_limit: RateLimitConfig,
    pub quiz: QuizPolicy,
    /// Path of the libSQL session store; `None` keeps sessions in memory.
    pub db_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            rate_limit: RateLimitConfig::default(),
            quiz: QuizPolicy::default(),
            db_path: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from `ONBOARD_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.api_key = std::env::var("ONBOARD_API_KEY").ok().map(SecretString::from);
        if let Ok(base) = std::env::var("ONBOARD_API_BASE") {
            config.api_base = base;
        }
        if let Ok(model) = std::env::var("ONBOARD_MODEL") {
            config.model = model;
        }
        config.db_path = std::env::var("ONBOARD_DB_PATH").ok();
        if let Ok(raw) = std::env::var("ONBOARD_QUIZ_REVEAL_THRESHOLD") {
            config.quiz.reveal_threshold = parse_u32("ONBOARD_QUIZ_REVEAL_THRESHOLD", &raw)?;
        }
        if let Ok(raw) = std::env::var("ONBOARD_QUIZ_AUTO_COMPLETE") {
            config.quiz.auto_complete_on_reveal = parse_bool("ONBOARD_QUIZ_AUTO_COMPLETE", &raw)?;
        }
        Ok(config)
    }

    /// Build the generative client this configuration describes, with a
    /// fresh rate-limit budget.
    pub fn build_client(&self) -> HttpGenerativeClient {
        HttpGenerativeClient::new(
            &self.api_base,
            &self.model,
            self.api_key.clone(),
            RateLimiter::new(self.rate_limit),
        )
    }
}

fn parse_u32(key: &str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected a non-negative integer, got {raw:?}"),
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {raw:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.rate_limit.max_requests, 20);
        assert_eq!(config.rate_limit.window.as_secs(), 60);
        assert_eq!(config.quiz.reveal_threshold, 3);
        assert!(!config.quiz.auto_complete_on_reveal);
        assert!(config.api_key.is_none());
        assert!(config.db_path.is_none());
    }

    #[test]
    fn parse_helpers() {
        assert_eq!(parse_u32("K", "5").unwrap(), 5);
        assert!(parse_u32("K", "five").is_err());
        assert!(parse_bool("K", "true").unwrap());
        assert!(parse_bool("K", "0").map(|b| !b).unwrap());
        assert!(parse_bool("K", "maybe").is_err());
    }

    #[test]
    fn build_client_uses_configured_model() {
        use crate::llm::GenerativeProvider;
        let client = EngineConfig::default().build_client();
        assert_eq!(client.model_name(), "gpt-4o-mini");
    }
}
