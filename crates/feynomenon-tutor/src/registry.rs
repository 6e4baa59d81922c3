//! Session store and idle-eviction policies.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use feynomenon_types::SessionId;

use crate::session::Session;

/// A session shared between the store and in-flight requests. Holding the
/// lock serializes turns within one session.
pub type SharedSession = Arc<Mutex<Session>>;

/// Mapping from session id to session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session under its own id, replacing any previous entry.
    async fn insert(&self, session: Session) -> SharedSession;

    /// Return the session stored under `session`'s id, inserting `session`
    /// only if the id is free. The flag is true when the insert happened.
    async fn get_or_insert(&self, session: Session) -> (SharedSession, bool);

    async fn get(&self, id: &SessionId) -> Option<SharedSession>;

    async fn remove(&self, id: &SessionId) -> Option<SharedSession>;

    async fn len(&self) -> usize;

    /// Mark the session as active now.
    async fn touch(&self, id: &SessionId);

    /// Every session with the time since its last activity.
    async fn idle_sessions(&self, now: DateTime<Utc>) -> Vec<(SessionId, Duration)>;
}

struct Entry {
    session: SharedSession,
    last_activity: DateTime<Utc>,
}

impl Entry {
    fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            last_activity: Utc::now(),
        }
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Entry>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) -> SharedSession {
        let id = session.id().clone();
        let entry = Entry::new(session);
        let shared = entry.session.clone();
        self.sessions.write().await.insert(id, entry);
        shared
    }

    async fn get_or_insert(&self, session: Session) -> (SharedSession, bool) {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(session.id()) {
            entry.last_activity = Utc::now();
            return (entry.session.clone(), false);
        }
        let id = session.id().clone();
        let entry = Entry::new(session);
        let shared = entry.session.clone();
        sessions.insert(id, entry);
        (shared, true)
    }

    async fn get(&self, id: &SessionId) -> Option<SharedSession> {
        self.sessions.read().await.get(id).map(|e| e.session.clone())
    }

    async fn remove(&self, id: &SessionId) -> Option<SharedSession> {
        self.sessions.write().await.remove(id).map(|e| e.session)
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn touch(&self, id: &SessionId) {
        if let Some(entry) = self.sessions.write().await.get_mut(id) {
            entry.last_activity = Utc::now();
        }
    }

    async fn idle_sessions(&self, now: DateTime<Utc>) -> Vec<(SessionId, Duration)> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(id, e)| (id.clone(), (now - e.last_activity).to_std().unwrap_or_default()))
            .collect()
    }
}

/// Decides whether an idle session should be evicted.
pub trait IdlePolicy: Send + Sync {
    /// Return true to evict the session.
    fn on_idle_timeout(&self, id: &SessionId, idle_for: Duration) -> bool;
}

/// Keep sessions until they are deleted explicitly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverEvict;

impl IdlePolicy for NeverEvict {
    fn on_idle_timeout(&self, _id: &SessionId, _idle_for: Duration) -> bool {
        false
    }
}

/// Evict sessions idle for at least the given duration.
#[derive(Debug, Clone, Copy)]
pub struct EvictAfter(pub Duration);

impl IdlePolicy for EvictAfter {
    fn on_idle_timeout(&self, _id: &SessionId, idle_for: Duration) -> bool {
        idle_for >= self.0
    }
}
