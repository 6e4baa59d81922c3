#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use feynomenon_llm_api::{ChatMessage, LlmClient, LlmResponse};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Replays queued replies in order and counts every request it receives.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_replies(replies: &[&str]) -> Arc<Self> {
        let client = Self::new();
        for reply in replies {
            client.push_reply(reply);
        }
        client
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_failure(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(anyhow::anyhow!(message.to_string())));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The messages sent on the `index`-th call, counting from zero.
    pub fn request(&self, index: usize) -> Vec<ChatMessage> {
        self.requests.lock().unwrap()[index].clone()
    }

    pub fn last_request(&self) -> Vec<ChatMessage> {
        self.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(messages.to_vec());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted reply left")))?;
        Ok(LlmResponse {
            message: ChatMessage::assistant(reply),
            usage: None,
        })
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

pub const TOPIC_CONFIRMED: &str = "Great! so your topic is: quantum physics! Let's dive in.";
pub const NO_TOPIC: &str = "What else would you like to discuss?";
pub const FIRST_EXPLANATION: &str = "Imagine tiny marbles that can be in two places at once.";
