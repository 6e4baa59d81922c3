use anyhow::Result;
use std::sync::Arc;

use crate::client::{ChatMessage, LlmClient};

/// Handle to one multi-turn exchange with a remote model.
///
/// The HTTP APIs are stateless, so the handle owns the history and replays it
/// on every turn. Opening a conversation makes no network call.
pub struct Conversation {
    client: Arc<dyn LlmClient>,
    history: Vec<ChatMessage>,
}

impl Conversation {
    /// Open a conversation seeded with `system_instructions`.
    pub fn open(client: Arc<dyn LlmClient>, system_instructions: impl Into<String>) -> Self {
        Self {
            client,
            history: vec![ChatMessage::system(system_instructions)],
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Number of completed user/assistant exchanges.
    pub fn turn_count(&self) -> usize {
        self.history
            .iter()
            .filter(|m| m.role == crate::client::Role::Assistant)
            .count()
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Send `text` as the next user turn and return the reply.
    ///
    /// History is only extended once the reply arrives, so neither a failed
    /// nor a cancelled call leaves an unanswered user message behind.
    pub async fn send_turn(&mut self, text: &str) -> Result<String> {
        let user = ChatMessage::user(text);
        let mut request = Vec::with_capacity(self.history.len() + 1);
        request.extend_from_slice(&self.history);
        request.push(user.clone());

        let reply = self.client.chat_completion(&request).await?;
        self.history.push(user);
        self.history.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("model", &self.client.model())
            .field("messages", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{LlmResponse, Role};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the last user message, or fails when told to.
    struct EchoClient {
        fail: bool,
        seen: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl LlmClient for EchoClient {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<LlmResponse> {
            self.seen.lock().unwrap().push(messages.len());
            if self.fail {
                anyhow::bail!("quota exceeded");
            }
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(LlmResponse {
                message: ChatMessage::assistant(format!("echo: {}", last)),
                usage: None,
            })
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_open_seeds_system_message_without_network() {
        let client = Arc::new(EchoClient { fail: false, seen: Mutex::new(vec![]) });
        let conversation = Conversation::open(client.clone(), "be brief");

        assert_eq!(conversation.history(), &[ChatMessage::system("be brief")]);
        assert_eq!(conversation.turn_count(), 0);
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_turn_replays_full_history() {
        let client = Arc::new(EchoClient { fail: false, seen: Mutex::new(vec![]) });
        let mut conversation = Conversation::open(client.clone(), "be brief");

        assert_eq!(conversation.send_turn("one").await.unwrap(), "echo: one");
        assert_eq!(conversation.send_turn("two").await.unwrap(), "echo: two");

        // system + user, then system + user + assistant + user
        assert_eq!(*client.seen.lock().unwrap(), vec![2, 4]);
        assert_eq!(conversation.turn_count(), 2);
        assert_eq!(conversation.history().last().unwrap().role, Role::Assistant);
    }

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn chat(&self, _messages: &[ChatMessage]) -> Result<LlmResponse> {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(LlmResponse {
                message: ChatMessage::assistant("too late"),
                usage: None,
            })
        }

        fn model(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_cancelled_turn_leaves_history_untouched() {
        let mut conversation = Conversation::open(Arc::new(SlowClient), "be brief");

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            conversation.send_turn("lost"),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(conversation.history(), &[ChatMessage::system("be brief")]);
    }

    #[tokio::test]
    async fn test_failed_turn_is_rolled_back() {
        let client = Arc::new(EchoClient { fail: true, seen: Mutex::new(vec![]) });
        let mut conversation = Conversation::open(client, "be brief");

        let err = conversation.send_turn("hello").await.unwrap_err();
        assert!(err.to_string().contains("quota"));
        assert_eq!(conversation.history().len(), 1);
    }
}
