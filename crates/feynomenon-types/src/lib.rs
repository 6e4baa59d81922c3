//! Core types and structures for feynomenon
//!
//! This crate provides the foundational types shared by the tutor core and
//! the transport adapters.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Session identity
// ============================================================================

/// Opaque session identifier.
///
/// Generated as a UUID v4 when the system creates a session, but any
/// caller-supplied string (for example a WebSocket path segment) is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Phase and state
// ============================================================================

/// Position of a session in the two-step tutoring flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    TopicGathering,
    FeynmanTutoring,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::TopicGathering => "topic_gathering",
            Phase::FeynmanTutoring => "feynman_tutoring",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot returned by `get_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub chosen_topic: Option<String>,
}

// ============================================================================
// Result records
// ============================================================================

/// Returned when a session is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: SessionId,
    pub greeting: String,
}

/// Result of one topic-gathering turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicOutcome {
    /// A topic was extracted; the session is now in FeynmanTutoring.
    /// `response` is the confirmation announcement, not the raw model reply.
    Identified { topic: String, response: String },
    /// No topic yet; `response` is the model reply verbatim.
    Pending { response: String },
}

impl TopicOutcome {
    pub fn topic_identified(&self) -> bool {
        matches!(self, TopicOutcome::Identified { .. })
    }

    pub fn topic(&self) -> Option<&str> {
        match self {
            TopicOutcome::Identified { topic, .. } => Some(topic),
            TopicOutcome::Pending { .. } => None,
        }
    }

    pub fn response(&self) -> &str {
        match self {
            TopicOutcome::Identified { response, .. } | TopicOutcome::Pending { response } => {
                response
            }
        }
    }
}

/// Result of one tutoring turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorReply {
    pub response: String,
    pub session_ended: bool,
}

/// Phase-tagged result of `submit_message`, the shape every transport
/// serializes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Still gathering a topic.
    TopicPending { response: String },
    /// A topic was identified and tutoring has begun; `response` is the
    /// first explanation from the tutor.
    TutoringStarted { topic: String, response: String },
    /// A tutoring turn.
    Tutor { response: String, session_ended: bool },
}

impl MessageOutcome {
    /// Phase the session is in after this outcome.
    pub fn phase(&self) -> Phase {
        match self {
            MessageOutcome::TopicPending { .. } => Phase::TopicGathering,
            MessageOutcome::TutoringStarted { .. } | MessageOutcome::Tutor { .. } => {
                Phase::FeynmanTutoring
            }
        }
    }

    pub fn response(&self) -> &str {
        match self {
            MessageOutcome::TopicPending { response }
            | MessageOutcome::TutoringStarted { response, .. }
            | MessageOutcome::Tutor { response, .. } => response,
        }
    }

    pub fn session_ended(&self) -> bool {
        matches!(self, MessageOutcome::Tutor { session_ended: true, .. })
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum TutorError {
    /// Operation called in the wrong phase or before its prerequisite.
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("session not found: {0}")]
    NotFound(SessionId),
    /// The upstream model call failed. Never retried by the core.
    #[error("remote model call failed: {0}")]
    Remote(#[source] anyhow::Error),
}

impl TutorError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        TutorError::InvalidState(msg.into())
    }

    /// Caller mistakes as opposed to upstream failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, TutorError::InvalidState(_) | TutorError::NotFound(_))
    }
}

pub type TutorResult<T> = Result<T, TutorError>;
