use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::client::{ChatMessage, GenerationConfig, LlmClient, LlmResponse, TokenUsage};
use feynomenon_logging::{log_request, log_request_to_file, log_response, log_response_to_file};

/// Client for OpenAI-compatible chat completion endpoints.
///
/// Serves the OpenAI, Groq and llama.cpp backends; the key is optional
/// because a local llama.cpp server accepts unauthenticated requests.
pub struct OpenAiCompatibleClient {
    api_key: Option<String>,
    model: String,
    api_url: String,
    generation: GenerationConfig,
    verbose: bool,
    log_dir: Option<PathBuf>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl OpenAiCompatibleClient {
    pub fn new(api_key: Option<String>, model: String, api_url: String) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            model,
            api_url,
            generation: GenerationConfig::default(),
            verbose: false,
            log_dir: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
        self.log_dir = log_dir;
        self
    }

    fn build_request(&self, messages: &[ChatMessage]) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.generation.temperature,
            "max_tokens": self.generation.max_tokens,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<LlmResponse> {
        let request = self.build_request(messages);
        let api_key = self.api_key.as_deref().unwrap_or("");

        log_request(&self.api_url, &request, api_key, self.verbose);
        let request_ts = self
            .log_dir
            .as_ref()
            .and_then(|dir| log_request_to_file(dir, &self.api_url, &request, &self.model, api_key).ok());

        let mut builder = self.client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.api_url))?;

        let status = response.status();
        let response_text = response.text().await?;

        log_response(&status, &response_text, self.verbose);
        if let (Some(dir), Some(ts)) = (&self.log_dir, request_ts) {
            let _ = log_response_to_file(dir, &status, &response_text, ts, &self.model);
        }

        if !status.is_success() {
            return Err(anyhow::anyhow!("API request failed: {} - {}", status, response_text));
        }

        let chat_response: ChatCompletionResponse = serde_json::from_str(&response_text)
            .context("Failed to decode chat completion response")?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("No content in response"))?;

        Ok(LlmResponse {
            message: ChatMessage::assistant(content),
            usage: chat_response.usage.map(|usage| TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            }),
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
