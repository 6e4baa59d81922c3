use std::env;
use std::sync::Arc;

use crate::client::{gemini::GeminiClient, openai::OpenAiCompatibleClient, LlmClient};
use crate::config::{normalize_api_url, BackendType, ClientSettings, ConfigError, GEMINI_API_URL, GROQ_API_URL, OPENAI_API_URL};

/// Client factory for creating LLM clients
pub struct ClientFactory;

impl ClientFactory {
    /// Create an LLM client for the configured backend.
    ///
    /// A key given in `settings` wins over the backend's conventional
    /// environment variable. Missing credentials are reported here, once,
    /// rather than on the first request.
    pub fn create(settings: ClientSettings) -> Result<Arc<dyn LlmClient>, ConfigError> {
        let model = settings.model_name();

        match settings.backend {
            BackendType::Gemini => {
                let key = Self::resolve_key(&settings)?;
                let url = settings.api_url.clone().unwrap_or_else(|| GEMINI_API_URL.to_string());
                Ok(Arc::new(
                    GeminiClient::new(key, model, url)
                        .with_generation(settings.generation)
                        .with_verbose(settings.verbose)
                        .with_log_dir(settings.log_dir.clone()),
                ))
            }
            BackendType::OpenAI | BackendType::Groq => {
                let key = Self::resolve_key(&settings)?;
                let default_url = if settings.backend == BackendType::Groq {
                    GROQ_API_URL
                } else {
                    OPENAI_API_URL
                };
                let url = settings
                    .api_url
                    .as_deref()
                    .map(normalize_api_url)
                    .unwrap_or_else(|| default_url.to_string());
                Ok(Arc::new(
                    OpenAiCompatibleClient::new(Some(key), model, url)
                        .with_generation(settings.generation)
                        .with_verbose(settings.verbose)
                        .with_log_dir(settings.log_dir.clone()),
                ))
            }
            BackendType::Llama => {
                let url = settings
                    .api_url
                    .as_deref()
                    .map(normalize_api_url)
                    .ok_or(ConfigError::MissingApiUrl(BackendType::Llama))?;
                Ok(Arc::new(
                    OpenAiCompatibleClient::new(settings.api_key.clone(), model, url)
                        .with_generation(settings.generation)
                        .with_verbose(settings.verbose)
                        .with_log_dir(settings.log_dir.clone()),
                ))
            }
        }
    }

    fn resolve_key(settings: &ClientSettings) -> Result<String, ConfigError> {
        let env_var = settings.backend.key_env_var().unwrap_or("API_KEY");
        settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| env::var(env_var).ok().filter(|k| !k.trim().is_empty()))
            .ok_or(ConfigError::MissingCredential {
                backend: settings.backend,
                env_var,
            })
    }
}
