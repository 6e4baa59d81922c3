use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod conversation;
pub mod gemini;
pub mod openai;

pub use conversation::Conversation;

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Chat message structure (OpenAI-compatible format)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// LLM response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub message: ChatMessage,
    pub usage: Option<TokenUsage>,
}

/// Token usage information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// LLM client trait - unified interface for all LLM providers
///
/// Implementations are stateless: each call carries the full history.
/// Multi-turn state lives in [`Conversation`].
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single round-trip with the given history.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<LlmResponse>;

    /// Model identifier, used for logging.
    fn model(&self) -> &str;

    /// Simple chat completion returning only the reply text
    async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<String> {
        Ok(self.chat(messages).await?.message.content)
    }
}
