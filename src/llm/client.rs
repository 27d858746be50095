//! HTTP client for the chat-completion endpoint.
//!
//! Speaks the standard completion wire format:
//! request `{model, messages, max_tokens, temperature, presence_penalty,
//! frequency_penalty}`, response `{choices:[{message:{content}}],
//! usage:{total_tokens}}`. Upstream HTTP failures are mapped to the
//! [`LlmError`] taxonomy so callers never see raw transport errors.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::limiter::RateLimiter;
use crate::llm::{ChatMessage, CompletionRequest, CompletionResponse, GenerativeProvider};

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    total_tokens: u32,
}

/// Generative client over HTTP, guarded by an injected rate limiter.
pub struct HttpGenerativeClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    limiter: RateLimiter,
}

impl HttpGenerativeClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        limiter: RateLimiter,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            model: model.into(),
            api_key,
            limiter,
        }
    }

    /// The configured credential, rejecting placeholder values.
    ///
    /// A missing or placeholder key is a configuration problem, but it
    /// surfaces as a failed call so session flow keeps working without it.
    fn credential(&self) -> Result<&SecretString, LlmError> {
        let key = self.api_key.as_ref().ok_or(LlmError::AuthFailed)?;
        let exposed = key.expose_secret();
        if exposed.is_empty() || is_placeholder(exposed) {
            return Err(LlmError::AuthFailed);
        }
        Ok(key)
    }
}

/// Common placeholder values people leave in env files.
fn is_placeholder(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    lower == "changeme"
        || lower == "your-api-key"
        || lower.starts_with("your-")
        || lower.starts_with("<")
}

#[async_trait]
impl GenerativeProvider for HttpGenerativeClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // Local rejection first: no network call once the window is full.
        self.limiter.try_acquire()?;
        let key = self.credential()?;

        let body = ApiRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            presence_penalty: request.presence_penalty,
            frequency_penalty: request.frequency_penalty,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthFailed,
                429 => LlmError::Throttled { retry_after: None },
                s if s >= 500 => LlmError::Transient { status: s },
                s => LlmError::Upstream { status: s, message },
            });
        }

        let parsed: ApiResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                reason: e.to_string(),
            })?;

        let total_tokens = parsed.usage.map(|u| u.total_tokens).unwrap_or(0);
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LlmError::InvalidResponse {
                reason: "empty completion".to_string(),
            })?;

        tracing::debug!(tokens = total_tokens, "generative call completed");
        Ok(CompletionResponse {
            content,
            total_tokens,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::limiter::RateLimitConfig;

    fn request() -> CompletionRequest {
        CompletionRequest::new(vec![ChatMessage::user("hello")])
    }

    #[tokio::test]
    async fn missing_credential_fails_without_network() {
        let client = HttpGenerativeClient::new(
            "http://localhost:1",
            "test-model",
            None,
            RateLimiter::default(),
        );
        match client.complete(request()).await {
            Err(LlmError::AuthFailed) => {}
            other => panic!("expected AuthFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn placeholder_credential_fails_without_network() {
        let client = HttpGenerativeClient::new(
            "http://localhost:1",
            "test-model",
            Some(SecretString::from("your-api-key")),
            RateLimiter::default(),
        );
        match client.complete(request()).await {
            Err(LlmError::AuthFailed) => {}
            other => panic!("expected AuthFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_window_rejects_before_credential_check() {
        // Zero-capacity limiter: even a missing key is never consulted.
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 0,
            window: std::time::Duration::from_secs(60),
        });
        let client =
            HttpGenerativeClient::new("http://localhost:1", "test-model", None, limiter);
        match client.complete(request()).await {
            Err(LlmError::Throttled { .. }) => {}
            other => panic!("expected Throttled, got {other:?}"),
        }
    }

    #[test]
    fn api_request_wire_shape() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = ApiRequest {
            model: "m",
            messages: &messages,
            max_tokens: 600,
            temperature: 0.7,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "u");
        assert_eq!(json["max_tokens"], 600);
        assert!(json.get("presence_penalty").is_some());
        assert!(json.get("frequency_penalty").is_some());
    }

    #[test]
    fn api_response_parses_wire_shape() {
        let raw = r#"{
            "choices": [{"message": {"content": "Task 1: A - B - Type: qa"}}],
            "usage": {"total_tokens": 42}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Task 1: A - B - Type: qa")
        );
        assert_eq!(parsed.usage.unwrap().total_tokens, 42);
    }

    #[test]
    fn placeholder_detection() {
        assert!(is_placeholder("changeme"));
        assert!(is_placeholder("your-api-key"));
        assert!(is_placeholder("<paste key here>"));
        assert!(!is_placeholder("sk-live-abc123"));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = HttpGenerativeClient::new(
            "https://api.example.com/v1/",
            "m",
            None,
            RateLimiter::default(),
        );
        assert_eq!(client.base_url, "https://api.example.com/v1");
    }
}
