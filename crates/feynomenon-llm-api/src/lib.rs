//! # feynomenon-llm-api
//!
//! The remote-model collaborator for the tutor:
//! - Google Gemini (`generateContent`)
//! - OpenAI-compatible chat completions (OpenAI, Groq, llama.cpp)
//!
//! ## Features
//!
//! - **Unified Interface**: Single `LlmClient` trait for all providers
//! - **Conversation handles**: `Conversation` keeps a multi-turn history on
//!   top of the stateless HTTP APIs
//! - **Flexible Configuration**: Environment variables or programmatic configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use feynomenon_llm_api::{BackendType, ClientFactory, ClientSettings, Conversation};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ClientFactory::create(ClientSettings::new(BackendType::Gemini))?;
//!
//!     let mut conversation = Conversation::open(client, "You are a patient tutor.");
//!     let reply = conversation.send_turn("Explain tides.").await?;
//!     println!("Response: {}", reply);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;


pub use client::{
    LlmClient,
    ChatMessage,
    Role,
    LlmResponse,
    TokenUsage,
    GenerationConfig,
    Conversation,
};

pub use client::gemini::GeminiClient;
pub use client::openai::OpenAiCompatibleClient;

pub use config::{
    BackendType,
    ClientFactory,
    ClientSettings,
    ConfigError,
    GEMINI_API_URL,
    GROQ_API_URL,
    OPENAI_API_URL,
    DEFAULT_GEMINI_MODEL,
    normalize_api_url,
    parse_model_spec,
    get_default_url_for_backend,
};
