use chrono::Utc;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use feynomenon_llm_api::LlmClient;
use feynomenon_logging::ConversationLogger;
use feynomenon_types::{
    MessageOutcome, Phase, SessionCreated, SessionId, SessionState, TopicOutcome, TutorError,
    TutorResult,
};

use crate::prompts;
use crate::registry::{IdlePolicy, InMemorySessionStore, NeverEvict, SessionStore};
use crate::session::Session;

/// Entry point for every transport.
///
/// Owns the session store and the model client. Each call locks only the
/// session it touches, so different sessions proceed concurrently while turns
/// within one session are applied in order.
#[derive(Clone)]
pub struct TutorService {
    client: Arc<dyn LlmClient>,
    store: Arc<dyn SessionStore>,
    idle_policy: Arc<dyn IdlePolicy>,
    transcripts_dir: Option<PathBuf>,
}

impl TutorService {
    /// Service with an in-memory store that never evicts.
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            store: Arc::new(InMemorySessionStore::new()),
            idle_policy: Arc::new(NeverEvict),
            transcripts_dir: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_idle_policy(mut self, policy: Arc<dyn IdlePolicy>) -> Self {
        self.idle_policy = policy;
        self
    }

    /// Write a JSONL transcript per session into `dir`.
    pub fn with_transcripts(mut self, dir: Option<PathBuf>) -> Self {
        self.transcripts_dir = dir;
        self
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Create a session under a fresh id.
    pub async fn create(&self) -> SessionCreated {
        let session_id = SessionId::new_v4();
        let (mut session, greeting) = Session::create(session_id.clone(), self.client.clone());
        if let Some(logger) = self.open_transcript(&session_id).await {
            session.attach_transcript(logger);
        }
        self.store.insert(session).await;

        SessionCreated {
            session_id,
            greeting: greeting.to_string(),
        }
    }

    /// Create a session under a caller-chosen id unless one exists.
    ///
    /// Returns `Some` with the greeting only when a session was created.
    pub async fn get_or_create(&self, session_id: SessionId) -> Option<SessionCreated> {
        if self.store.get(&session_id).await.is_some() {
            self.store.touch(&session_id).await;
            return None;
        }

        // The transcript is opened only by the caller whose insert won, so a
        // racing connection on the same id leaves no stray file.
        let (session, greeting) = Session::create(session_id.clone(), self.client.clone());
        let (shared, inserted) = self.store.get_or_insert(session).await;
        if !inserted {
            return None;
        }
        let mut session = shared.lock().await;
        if let Some(logger) = self.open_transcript(&session_id).await {
            session.attach_transcript(logger);
        }

        Some(SessionCreated {
            session_id,
            greeting: greeting.to_string(),
        })
    }

    pub async fn contains(&self, session_id: &SessionId) -> bool {
        self.store.get(session_id).await.is_some()
    }

    /// Route a learner message by phase.
    ///
    /// When a topic is identified, tutoring is started in the same call and
    /// the outcome carries the first explanation. A session that ends is
    /// removed from the store.
    pub async fn submit_message(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> TutorResult<MessageOutcome> {
        let shared = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| TutorError::NotFound(session_id.clone()))?;
        self.store.touch(session_id).await;

        let outcome = {
            let mut session = shared.lock().await;
            Self::dispatch(&mut session, text).await?
        };

        if outcome.session_ended() {
            self.remove_and_close(session_id).await;
        } else {
            self.store.touch(session_id).await;
        }

        Ok(outcome)
    }

    async fn dispatch(session: &mut Session, text: &str) -> TutorResult<MessageOutcome> {
        match session.phase() {
            Phase::TopicGathering => match session.submit_topic_message(text).await? {
                TopicOutcome::Pending { response } => Ok(MessageOutcome::TopicPending { response }),
                TopicOutcome::Identified { topic, .. } => {
                    let response = session.start_tutoring().await?;
                    Ok(MessageOutcome::TutoringStarted { topic, response })
                }
            },
            // An earlier start failed upstream; retry it before taking turns.
            Phase::FeynmanTutoring if !session.tutoring_started() => {
                if prompts::is_termination(text) {
                    return Ok(MessageOutcome::Tutor {
                        response: prompts::FAREWELL.to_string(),
                        session_ended: true,
                    });
                }
                let response = session.start_tutoring().await?;
                let topic = session.chosen_topic().unwrap_or_default().to_string();
                Ok(MessageOutcome::TutoringStarted { topic, response })
            }
            Phase::FeynmanTutoring => {
                let reply = session.submit_tutor_message(text).await?;
                Ok(MessageOutcome::Tutor {
                    response: reply.response,
                    session_ended: reply.session_ended,
                })
            }
        }
    }

    pub async fn state(&self, session_id: &SessionId) -> TutorResult<SessionState> {
        let shared = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| TutorError::NotFound(session_id.clone()))?;
        let session = shared.lock().await;
        Ok(session.state())
    }

    pub async fn delete(&self, session_id: &SessionId) -> TutorResult<()> {
        if self.remove_and_close(session_id).await {
            Ok(())
        } else {
            Err(TutorError::NotFound(session_id.clone()))
        }
    }

    pub async fn session_count(&self) -> usize {
        self.store.len().await
    }

    /// Evict every session the idle policy rejects. Returns the evicted ids.
    pub async fn sweep_idle(&self) -> Vec<SessionId> {
        let mut evicted = Vec::new();
        for (session_id, idle_for) in self.store.idle_sessions(Utc::now()).await {
            if self.idle_policy.on_idle_timeout(&session_id, idle_for)
                && self.remove_and_close(&session_id).await
            {
                evicted.push(session_id);
            }
        }
        evicted
    }

    async fn remove_and_close(&self, session_id: &SessionId) -> bool {
        match self.store.remove(session_id).await {
            Some(shared) => {
                shared.lock().await.close().await;
                true
            }
            None => false,
        }
    }

    async fn open_transcript(&self, session_id: &SessionId) -> Option<ConversationLogger> {
        let dir = self.transcripts_dir.as_ref()?;
        match ConversationLogger::new(dir, session_id.as_str()).await {
            Ok(logger) => Some(logger),
            Err(e) => {
                eprintln!(
                    "{} Failed to open transcript for session {}: {}",
                    "⚠️".yellow(),
                    session_id,
                    e
                );
                None
            }
        }
    }
}
