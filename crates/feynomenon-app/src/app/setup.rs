use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use feynomenon_llm_api::{
    parse_model_spec, BackendType, ClientFactory, ClientSettings, ConfigError, GenerationConfig,
    LlmClient,
};
use feynomenon_logging::get_logs_dir;

use crate::cli::Cli;

/// Application configuration derived from CLI arguments and environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client_settings: ClientSettings,
    /// Where per-session transcripts go, when enabled.
    pub transcripts_dir: Option<PathBuf>,
    pub idle_timeout: Option<Duration>,
}

impl AppConfig {
    /// Build the model client. A missing credential surfaces here, once.
    pub fn create_client(&self) -> Result<Arc<dyn LlmClient>, ConfigError> {
        ClientFactory::create(self.client_settings.clone())
    }
}

/// Settings read from FEYNOMENON_* environment variables
#[derive(Debug, Default)]
struct EnvConfig {
    backend: Option<String>,
    model: Option<String>,
    api_url: Option<String>,
    api_key: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_config_from_env() -> EnvConfig {
    EnvConfig {
        backend: non_empty_var("FEYNOMENON_BACKEND"),
        model: non_empty_var("FEYNOMENON_MODEL"),
        api_url: non_empty_var("FEYNOMENON_API_URL"),
        api_key: non_empty_var("FEYNOMENON_API_KEY"),
        temperature: non_empty_var("FEYNOMENON_TEMPERATURE").and_then(|v| v.parse().ok()),
        max_tokens: non_empty_var("FEYNOMENON_MAX_TOKENS").and_then(|v| v.parse().ok()),
    }
}

fn parse_backend(name: &str) -> Result<BackendType, ConfigError> {
    BackendType::from_str(name).ok_or_else(|| ConfigError::UnknownBackend(name.to_string()))
}

/// Set up application configuration from CLI arguments
pub fn setup_from_cli(cli: &Cli) -> Result<AppConfig> {
    let env_config = get_config_from_env();

    // Precedence: CLI flags > FEYNOMENON_* env > legacy env (in ClientFactory) > defaults

    let (model, spec_backend, spec_url) = match cli.model.as_ref().or(env_config.model.as_ref()) {
        Some(spec) => {
            let (model, backend, url) = parse_model_spec(spec);
            (Some(model).filter(|m| !m.is_empty()), backend, url)
        }
        None => (None, None, None),
    };

    let backend = match (&cli.backend, spec_backend, &env_config.backend) {
        (Some(name), _, _) => parse_backend(name)?,
        (None, Some(backend), _) => backend,
        (None, None, Some(name)) => parse_backend(name)?,
        (None, None, None) => BackendType::Gemini,
    };

    let api_url = cli
        .api_url
        .clone()
        .or(spec_url)
        .or(env_config.api_url);

    let api_key = cli
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or(env_config.api_key);

    let defaults = GenerationConfig::default();
    let generation = GenerationConfig {
        temperature: cli.temperature.or(env_config.temperature).unwrap_or(defaults.temperature),
        max_tokens: cli.max_tokens.or(env_config.max_tokens).unwrap_or(defaults.max_tokens),
    };

    // Only touch the filesystem when something will be written.
    let log_dir = if cli.log_requests || cli.transcripts {
        Some(match &cli.log_dir {
            Some(dir) => {
                let dir = PathBuf::from(dir);
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
                dir
            }
            None => get_logs_dir()?,
        })
    } else {
        None
    };

    let client_settings = ClientSettings {
        backend,
        model,
        api_url,
        api_key,
        generation,
        verbose: cli.verbose,
        log_dir: log_dir.clone().filter(|_| cli.log_requests),
    };

    Ok(AppConfig {
        client_settings,
        transcripts_dir: log_dir
            .filter(|_| cli.transcripts)
            .map(|dir| dir.join("transcripts")),
        idle_timeout: cli
            .idle_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs),
    })
}
