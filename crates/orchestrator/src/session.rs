//! Append-only conversation sessions.
//!
//! The store's map lock is held only for lookup and insert. Each session
//! carries its own async lock, so requests on different sessions never wait
//! on each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::message::Message;

#[derive(Debug)]
struct SessionState {
    user_id: Option<String>,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    agent_id: Option<String>,
}

/// One conversation.
#[derive(Debug)]
pub struct Session {
    id: String,
    state: Mutex<SessionState>,
}

/// Read-only copy of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub user_id: Option<String>,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub agent_id: Option<String>,
}

impl Session {
    fn new(id: &str, user_id: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            state: Mutex::new(SessionState {
                user_id: user_id.map(str::to_string),
                messages: Vec::new(),
                created_at: now,
                last_activity_at: now,
                agent_id: None,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of stored messages.
    pub async fn len(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.messages.is_empty()
    }

    /// Messages from the last `turns` exchanges, oldest first.
    pub async fn recent(&self, turns: usize) -> Vec<Message> {
        let state = self.state.lock().await;
        let keep = turns.saturating_mul(2);
        let start = state.messages.len().saturating_sub(keep);
        state.messages[start..].to_vec()
    }

    /// Append a user message and the agent's reply as one step.
    ///
    /// Timestamps are clamped so storage order never goes backwards in time.
    /// Returns the pair as stored.
    pub async fn append_pair(&self, mut user: Message, mut agent: Message) -> [Message; 2] {
        let mut state = self.state.lock().await;

        if let Some(last) = state.messages.last() {
            if user.timestamp < last.timestamp {
                user.timestamp = last.timestamp;
            }
        }
        if agent.timestamp < user.timestamp {
            agent.timestamp = user.timestamp;
        }

        state.last_activity_at = agent.timestamp.max(state.last_activity_at);
        state.agent_id = agent.agent_id.clone();
        state.messages.push(user.clone());
        state.messages.push(agent.clone());

        debug!(
            "Session {} now holds {} messages",
            self.id,
            state.messages.len()
        );

        [user, agent]
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            id: self.id.clone(),
            user_id: state.user_id.clone(),
            messages: state.messages.clone(),
            created_at: state.created_at,
            last_activity_at: state.last_activity_at,
            agent_id: state.agent_id.clone(),
        }
    }

    async fn touch_user(&self, user_id: Option<&str>) {
        if let Some(user_id) = user_id {
            let mut state = self.state.lock().await;
            if state.user_id.is_none() {
                state.user_id = Some(user_id.to_string());
            }
        }
    }

    async fn idle_since(&self) -> DateTime<Utc> {
        self.state.lock().await.last_activity_at
    }
}

/// All sessions, keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session with this id, created if missing.
    ///
    /// The first non-empty user id seen for a session is kept.
    pub async fn get_or_create(&self, id: &str, user_id: Option<&str>) -> Arc<Session> {
        let existing = self.sessions.read().await.get(id).cloned();
        let session = match existing {
            Some(session) => session,
            None => {
                let mut sessions = self.sessions.write().await;
                sessions
                    .entry(id.to_string())
                    .or_insert_with(|| {
                        info!("Creating session {}", id);
                        Arc::new(Session::new(id, user_id))
                    })
                    .clone()
            }
        };
        session.touch_user(user_id).await;
        session
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Sum of stored messages across all sessions.
    pub async fn total_messages(&self) -> usize {
        let mut total = 0;
        for session in self.all().await {
            total += session.len().await;
        }
        total
    }

    pub async fn snapshot(&self, id: &str) -> Option<SessionSnapshot> {
        match self.get(id).await {
            Some(session) => Some(session.snapshot().await),
            None => None,
        }
    }

    /// Remove sessions idle for longer than `max_idle`. Returns how many went.
    ///
    /// The core never calls this; a housekeeping task owned by the host does.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let Some(cutoff) = Utc::now().checked_sub_signed(max_idle) else {
            return 0;
        };

        let mut stale = Vec::new();
        for session in self.all().await {
            if session.idle_since().await < cutoff {
                stale.push(session.id.clone());
            }
        }

        if stale.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        for id in &stale {
            sessions.remove(id);
        }
        info!("Pruned {} idle sessions", stale.len());
        stale.len()
    }

    async fn all(&self) -> Vec<Arc<Session>> {
        self.sessions.read().await.values().cloned().collect()
    }
}
