use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::client::{ChatMessage, GenerationConfig, LlmClient, LlmResponse, Role, TokenUsage};
use feynomenon_logging::{log_request, log_request_to_file, log_response, log_response_to_file};

/// Google Gemini client using the native `generateContent` API
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    generation: GenerationConfig,
    verbose: bool,
    log_dir: Option<PathBuf>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        // Ensure base_url doesn't end with a slash
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            api_key,
            model,
            base_url,
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

    /// Write every request/response pair to files under `log_dir`.
    pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
        self.log_dir = log_dir;
        self
    }

    fn get_generate_url(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn build_request(&self, messages: &[ChatMessage]) -> Value {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let contents: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        let mut request = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.generation.temperature,
                "maxOutputTokens": self.generation.max_tokens,
            }
        });

        if !system.is_empty() {
            request["systemInstruction"] = json!({ "parts": [{ "text": system.join("\n\n") }] });
        }

        request
    }

    fn extract_reply(response: GenerateContentResponse) -> Result<LlmResponse> {
        let usage = response.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        let candidate = match response.candidates.into_iter().next() {
            Some(candidate) => candidate,
            None => {
                let reason = response
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .unwrap_or_else(|| "no candidates returned".to_string());
                return Err(anyhow::anyhow!("Gemini returned no reply: {}", reason));
            }
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(anyhow::anyhow!(
                "Gemini returned an empty reply (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ));
        }

        Ok(LlmResponse {
            message: ChatMessage::assistant(text),
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<LlmResponse> {
        let url = self.get_generate_url();
        let request = self.build_request(messages);

        log_request(&url, &request, &self.api_key, self.verbose);
        let request_ts = self
            .log_dir
            .as_ref()
            .and_then(|dir| log_request_to_file(dir, &url, &request, &self.model, &self.api_key).ok());

        let response = self.client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to reach Gemini API")?;

        let status = response.status();
        let response_text = response.text().await?;

        log_response(&status, &response_text, self.verbose);
        if let (Some(dir), Some(ts)) = (&self.log_dir, request_ts) {
            let _ = log_response_to_file(dir, &status, &response_text, ts, &self.model);
        }

        if !status.is_success() {
            return Err(anyhow::anyhow!("Gemini API error: {} - {}", status, response_text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response_text)
            .context("Failed to decode Gemini response")?;

        Self::extract_reply(parsed)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
