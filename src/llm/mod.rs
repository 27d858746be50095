//! Generative hint service integration.
//!
//! The engine treats the text-generation API as an untrusted external
//! collaborator: every call can fail, and every caller degrades gracefully
//! when it does. The [`GenerativeProvider`] trait is the seam; the concrete
//! [`HttpGenerativeClient`] speaks the chat-completion wire format and is
//! guarded by an injected sliding-window [`RateLimiter`].

pub mod client;
pub mod limiter;
pub mod prompts;

pub use client::HttpGenerativeClient;
pub use limiter::{RateLimitConfig, RateLimiter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A completion request, independent of transport.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            max_tokens: 600,
            temperature: 0.7,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A completion response with the generated text and token usage.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub total_tokens: u32,
}

/// The seam between the engine and the generative service.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Generate a completion.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on throttling, auth, transport, or malformed
    /// upstream responses. Callers are expected to fall back, not abort.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model identifier used for requests.
    fn model_name(&self) -> &str;
}
