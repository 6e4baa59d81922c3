use std::sync::Arc;

use feynomenon_llm_api::{Conversation, LlmClient};
use feynomenon_logging::ConversationLogger;
use feynomenon_types::{
    Phase, SessionId, SessionState, TopicOutcome, TutorError, TutorReply, TutorResult,
};

use crate::prompts;
use crate::topic::{extract_topic, title_case};

/// Session phase, carrying the resources only that phase may use.
///
/// The topic conversation is dropped at the transition, so it can never be
/// written to once tutoring has begun.
#[derive(Debug)]
pub enum SessionPhase {
    TopicGathering {
        conversation: Conversation,
    },
    FeynmanTutoring {
        topic: String,
        /// Opened by [`Session::start_tutoring`].
        tutor: Option<Conversation>,
    },
}

/// One learner's tutoring session.
pub struct Session {
    id: SessionId,
    client: Arc<dyn LlmClient>,
    phase: SessionPhase,
    transcript: Option<ConversationLogger>,
}

impl Session {
    /// Start a session in topic gathering. Returns the session and the
    /// greeting to show the learner. No request is sent yet.
    pub fn create(id: SessionId, client: Arc<dyn LlmClient>) -> (Self, &'static str) {
        let conversation = Conversation::open(client.clone(), prompts::TOPIC_GATHERING_INSTRUCTIONS);
        let session = Self {
            id,
            client,
            phase: SessionPhase::TopicGathering { conversation },
            transcript: None,
        };
        (session, prompts::GREETING)
    }

    /// Record every turn of this session to a JSONL transcript.
    pub fn with_transcript(mut self, logger: ConversationLogger) -> Self {
        self.attach_transcript(logger);
        self
    }

    pub fn attach_transcript(&mut self, logger: ConversationLogger) {
        self.transcript = Some(logger);
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn phase(&self) -> Phase {
        match self.phase {
            SessionPhase::TopicGathering { .. } => Phase::TopicGathering,
            SessionPhase::FeynmanTutoring { .. } => Phase::FeynmanTutoring,
        }
    }

    pub fn chosen_topic(&self) -> Option<&str> {
        match &self.phase {
            SessionPhase::TopicGathering { .. } => None,
            SessionPhase::FeynmanTutoring { topic, .. } => Some(topic),
        }
    }

    /// Whether the tutoring conversation has been opened.
    pub fn tutoring_started(&self) -> bool {
        matches!(self.phase, SessionPhase::FeynmanTutoring { tutor: Some(_), .. })
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            phase: self.phase(),
            chosen_topic: self.chosen_topic().map(str::to_string),
        }
    }

    /// Send a learner message to the topic-gathering conversation.
    ///
    /// When the reply confirms a topic the session moves to tutoring and the
    /// outcome carries the announcement; otherwise it carries the reply.
    pub async fn submit_topic_message(&mut self, text: &str) -> TutorResult<TopicOutcome> {
        let conversation = match &mut self.phase {
            SessionPhase::TopicGathering { conversation } => conversation,
            SessionPhase::FeynmanTutoring { .. } => {
                return Err(TutorError::invalid_state(
                    "a topic has already been chosen for this session",
                ))
            }
        };

        let reply = conversation.send_turn(text).await.map_err(TutorError::Remote)?;
        self.record("user", text).await;
        self.record("assistant", &reply).await;

        let Some(raw) = extract_topic(&reply) else {
            return Ok(TopicOutcome::Pending { response: reply });
        };

        let topic = title_case(&raw);
        self.phase = SessionPhase::FeynmanTutoring {
            topic: topic.clone(),
            tutor: None,
        };
        let response = prompts::topic_announcement(&topic);
        self.record("system", &response).await;

        Ok(TopicOutcome::Identified { topic, response })
    }

    /// Open the tutoring conversation and return the first explanation.
    pub async fn start_tutoring(&mut self) -> TutorResult<String> {
        let (topic, tutor) = match &mut self.phase {
            SessionPhase::FeynmanTutoring { topic, tutor } => (topic.as_str(), tutor),
            SessionPhase::TopicGathering { .. } => {
                return Err(TutorError::invalid_state("no topic has been identified yet"))
            }
        };
        if tutor.is_some() {
            return Err(TutorError::invalid_state("tutoring has already started"));
        }

        let mut conversation =
            Conversation::open(self.client.clone(), prompts::feynman_instructions(topic));
        let prompt = prompts::bootstrap_prompt(topic);
        let reply = conversation.send_turn(&prompt).await.map_err(TutorError::Remote)?;
        *tutor = Some(conversation);

        self.record("user", &prompt).await;
        self.record("assistant", &reply).await;
        Ok(reply)
    }

    /// Send a learner message to the tutor. Termination words end the
    /// session locally without a model call.
    pub async fn submit_tutor_message(&mut self, text: &str) -> TutorResult<TutorReply> {
        let tutor = match &mut self.phase {
            SessionPhase::FeynmanTutoring { tutor: Some(tutor), .. } => tutor,
            SessionPhase::FeynmanTutoring { tutor: None, .. } => {
                return Err(TutorError::invalid_state("tutoring has not started yet"))
            }
            SessionPhase::TopicGathering { .. } => {
                return Err(TutorError::invalid_state("no topic has been identified yet"))
            }
        };

        if prompts::is_termination(text) {
            self.record("user", text).await;
            self.record("system", prompts::FAREWELL).await;
            return Ok(TutorReply {
                response: prompts::FAREWELL.to_string(),
                session_ended: true,
            });
        }

        let reply = tutor.send_turn(text).await.map_err(TutorError::Remote)?;
        self.record("user", text).await;
        self.record("assistant", &reply).await;

        Ok(TutorReply {
            response: reply,
            session_ended: false,
        })
    }

    /// Flush the transcript. Called when the session leaves the store.
    pub async fn close(&mut self) {
        if let Some(mut transcript) = self.transcript.take() {
            transcript.shutdown().await;
        }
    }

    async fn record(&mut self, role: &str, content: &str) {
        let phase = self.phase();
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.log(phase.as_str(), role, content).await;
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("transcript", &self.transcript.as_ref().map(|t| t.file_path().to_path_buf()))
            .finish()
    }
}
