use serde::{Deserialize, Serialize};

use feynomenon_types::{MessageOutcome, Phase, SessionCreated, SessionId, SessionState};

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Reply to `POST /chat`. Optional fields are sent as `null` when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: SessionId,
    pub topic_identified: Option<bool>,
    pub topic: Option<String>,
    pub session_ended: Option<bool>,
    pub phase: Phase,
}

impl ChatResponse {
    /// First reply of a freshly created session.
    pub fn greeting(created: SessionCreated) -> Self {
        Self {
            response: created.greeting,
            session_id: created.session_id,
            topic_identified: Some(false),
            topic: None,
            session_ended: None,
            phase: Phase::TopicGathering,
        }
    }

    pub fn from_outcome(session_id: SessionId, outcome: MessageOutcome) -> Self {
        let phase = outcome.phase();
        let (response, topic_identified, topic, session_ended) = match outcome {
            MessageOutcome::TopicPending { response } => (response, Some(false), None, None),
            MessageOutcome::TutoringStarted { topic, response } => {
                (response, Some(true), Some(topic), None)
            }
            MessageOutcome::Tutor { response, session_ended } => {
                (response, None, None, Some(session_ended))
            }
        };
        Self {
            response,
            session_id,
            topic_identified,
            topic,
            session_ended,
            phase,
        }
    }
}

/// Reply to `GET /session/:id/state`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStateResponse {
    pub session_id: SessionId,
    pub current_phase: Phase,
    pub chosen_topic: Option<String>,
}

impl SessionStateResponse {
    pub fn new(session_id: SessionId, state: SessionState) -> Self {
        Self {
            session_id,
            current_phase: state.phase,
            chosen_topic: state.chosen_topic,
        }
    }
}

/// Frame sent from a WebSocket client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(default)]
    pub message: String,
}

/// Frames sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Message {
        response: String,
        phase: Phase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        topic_identified: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_ended: Option<bool>,
    },
    /// `recoverable` is false when the server is about to close the socket.
    Error { message: String, recoverable: bool },
}

impl ServerMessage {
    pub fn greeting(greeting: String) -> Self {
        ServerMessage::Message {
            response: greeting,
            phase: Phase::TopicGathering,
            topic_identified: Some(false),
            topic: None,
            session_ended: None,
        }
    }

    pub fn from_outcome(outcome: MessageOutcome) -> Self {
        let phase = outcome.phase();
        match outcome {
            MessageOutcome::TopicPending { response } => ServerMessage::Message {
                response,
                phase,
                topic_identified: Some(false),
                topic: None,
                session_ended: None,
            },
            MessageOutcome::TutoringStarted { topic, response } => ServerMessage::Message {
                response,
                phase,
                topic_identified: Some(true),
                topic: Some(topic),
                session_ended: None,
            },
            MessageOutcome::Tutor { response, session_ended } => ServerMessage::Message {
                response,
                phase,
                topic_identified: None,
                topic: None,
                session_ended: Some(session_ended),
            },
        }
    }
}
