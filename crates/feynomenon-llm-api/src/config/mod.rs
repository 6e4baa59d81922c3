use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::client::GenerationConfig;

pub mod factory;
pub use factory::ClientFactory;

/// Backend type for the remote model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Gemini,
    OpenAI,
    Groq,
    Llama,
}

impl BackendType {
    /// Parse backend type from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "openai" => Some(Self::OpenAI),
            "groq" => Some(Self::Groq),
            "llama" | "llamacpp" | "llama.cpp" | "llama-cpp" => Some(Self::Llama),
            _ => None,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
            Self::Groq => "groq",
            Self::Llama => "llama",
        }
    }

    /// Conventional environment variable holding the credential, if the
    /// backend needs one.
    pub fn key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Groq => Some("GROQ_API_KEY"),
            Self::Llama => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => DEFAULT_GEMINI_MODEL,
            Self::OpenAI => DEFAULT_OPENAI_MODEL,
            Self::Groq => DEFAULT_GROQ_MODEL,
            Self::Llama => DEFAULT_LLAMA_MODEL,
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default Gemini API base URL
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default Groq API URL
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default OpenAI API URL
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_LLAMA_MODEL: &str = "local";

/// Get the default URL for a given backend type
pub fn get_default_url_for_backend(backend: &BackendType) -> Option<String> {
    match backend {
        BackendType::Gemini => Some(GEMINI_API_URL.to_string()),
        BackendType::OpenAI => Some(OPENAI_API_URL.to_string()),
        BackendType::Groq => Some(GROQ_API_URL.to_string()),
        BackendType::Llama => None, // llama.cpp has no default URL
    }
}

/// Parse a model string in format "model@backend(api_url)", "model@backend" or "model".
/// Returns (model_name, backend, api_url)
pub fn parse_model_spec(spec: &str) -> (String, Option<BackendType>, Option<String>) {
    let (model, backend_part) = match spec.split_once('@') {
        Some((model, rest)) => (model, Some(rest)),
        None => (spec, None),
    };

    let mut backend = None;
    let mut api_url = None;
    if let Some(backend_part) = backend_part {
        if let Some(pos) = backend_part.find('(') {
            // Format: backend(url)
            backend = BackendType::from_str(&backend_part[..pos]);
            let url = &backend_part[pos + 1..];
            let url = url.strip_suffix(')').unwrap_or(url);
            if !url.is_empty() {
                api_url = Some(url.to_string());
            }
        } else {
            backend = BackendType::from_str(backend_part);
        }
    }

    (model.to_string(), backend, api_url)
}

/// Normalize API URL by ensuring it has the correct path for OpenAI-compatible endpoints
pub fn normalize_api_url(url: &str) -> String {
    // If URL already contains a path with "completions", use it as-is
    if url.contains("/completions") || url.contains("/chat") {
        return url.to_string();
    }

    if url.ends_with('/') {
        format!("{}v1/chat/completions", url)
    } else {
        format!("{}/v1/chat/completions", url)
    }
}

/// Everything needed to build one client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub backend: BackendType,
    pub model: Option<String>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub generation: GenerationConfig,
    pub verbose: bool,
    /// Directory for request/response log files; disabled when `None`.
    pub log_dir: Option<PathBuf>,
}

impl ClientSettings {
    pub fn new(backend: BackendType) -> Self {
        Self {
            backend,
            model: None,
            api_url: None,
            api_key: None,
            generation: GenerationConfig::default(),
            verbose: false,
            log_dir: None,
        }
    }

    pub fn model_name(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.backend.default_model().to_string())
    }
}

/// Startup configuration failures. Fatal, never per-request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing API key for the {backend} backend (set {env_var} or pass --api-key)")]
    MissingCredential {
        backend: BackendType,
        env_var: &'static str,
    },
    #[error("the {0} backend requires an API URL (pass --api-url)")]
    MissingApiUrl(BackendType),
    #[error("unknown backend '{0}' (expected gemini, openai, groq or llama)")]
    UnknownBackend(String),
}
