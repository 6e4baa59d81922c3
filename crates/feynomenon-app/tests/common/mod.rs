#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use feynomenon::llm_api::{ChatMessage, LlmClient, LlmResponse};
use feynomenon::tutor::TutorService;
use feynomenon::web::{create_router, AppState, WebServer, WebServerConfig};
use serde_json::Value;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Model stand-in that replays queued replies and counts calls.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn with_replies(replies: &[&str]) -> Arc<Self> {
        let client = Arc::new(Self::default());
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
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat(&self, _messages: &[ChatMessage]) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
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

pub fn router(client: &Arc<ScriptedClient>) -> Router {
    let config = WebServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        idle_timeout: None,
    };
    WebServer::new(config, TutorService::new(client.clone())).router()
}

/// Serve the routes on an ephemeral local port and return its address.
pub async fn serve(tutor: TutorService) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(AppState { tutor });
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Send one request through the router and decode the JSON body.
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub const TOPIC_CONFIRMED: &str = "Wonderful! So you want to learn about black holes. Shall we?";
pub const NO_TOPIC: &str = "What else would you like to discuss?";
pub const FIRST_EXPLANATION: &str = "A black hole is like a super-strong vacuum cleaner in space.";
