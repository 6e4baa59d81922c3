//! Tutoring core for feynomenon.
//!
//! A [`Session`] walks a learner through two phases: a short conversation that
//! pins down a topic, then a Feynman-technique tutoring conversation about
//! that topic. [`TutorService`] owns the session store and is the only thing
//! transports talk to.

pub mod prompts;
pub mod registry;
pub mod service;
pub mod session;
pub mod topic;

pub use registry::{EvictAfter, IdlePolicy, InMemorySessionStore, NeverEvict, SessionStore, SharedSession};
pub use service::TutorService;
pub use session::{Session, SessionPhase};
pub use topic::{extract_topic, title_case, CONFIRMATION_PHRASES};

pub use feynomenon_types::{
    MessageOutcome, Phase, SessionCreated, SessionId, SessionState, TopicOutcome, TutorError,
    TutorReply, TutorResult,
};
