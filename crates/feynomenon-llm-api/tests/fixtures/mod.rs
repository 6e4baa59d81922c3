use serde_json::json;
use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-api-key";
pub const GEMINI_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

/// Mock server utilities for testing LLM API clients
pub struct LLMMockServer {
    server: MockServer,
}

impl LLMMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub async fn received_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or_default()
    }

    pub async fn last_request_body(&self) -> serde_json::Value {
        let requests = self.server.received_requests().await.unwrap_or_default();
        let last = requests.last().expect("no request received");
        serde_json::from_slice(&last.body).expect("request body is JSON")
    }

    /// Mock successful Gemini generateContent response
    pub async fn mock_gemini_success(&self, response_content: &str) {
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .and(header("x-goog-api-key", TEST_API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "text": response_content }]
                    },
                    "finishReason": "STOP",
                    "index": 0
                }],
                "usageMetadata": {
                    "promptTokenCount": 10,
                    "candidatesTokenCount": 20,
                    "totalTokenCount": 30
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock Gemini quota error
    pub async fn mock_gemini_quota_exceeded(&self) {
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "code": 429,
                    "message": "Resource has been exhausted (e.g. check quota).",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock a prompt blocked by safety filters
    pub async fn mock_gemini_blocked(&self) {
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock successful OpenAI-compatible chat completion
    pub async fn mock_openai_success(&self, response_content: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", format!("Bearer {}", TEST_API_KEY).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl_test123",
                "object": "chat.completion",
                "created": 1700000000,
                "model": "llama-3.1-8b-instant",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": response_content
                    },
                    "finish_reason": "stop"
                }],
                "usage": {
                    "prompt_tokens": 10,
                    "completion_tokens": 20,
                    "total_tokens": 30
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock an unauthenticated llama.cpp server
    pub async fn mock_llamacpp_success(&self, response_content: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": response_content },
                    "finish_reason": "stop"
                }]
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock a malformed body
    pub async fn mock_openai_garbage(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&self.server)
            .await;
    }
}
