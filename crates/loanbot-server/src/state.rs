use loanbot::agent::Agent;
use loanbot::session::Session;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    last_used: Instant,
}

/// Shared application state
///
/// Every session has its own lock, so one user's questions are answered in order
/// while different users are served in parallel.
#[derive(Clone)]
pub struct AppState {
    agent: Arc<Agent>,
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl AppState {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self {
            agent,
            sessions: Arc::default(),
        }
    }

    pub async fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        let entry = SessionEntry {
            session: Arc::new(Mutex::new(Session::new(self.agent.clone()))),
            last_used: Instant::now(),
        };
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, entry);
        tracing::info!(session = %id, active = sessions.len(), "session created");
        id
    }

    /// Look up a session and mark it as used
    pub async fn session(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_used = Instant::now();
        Some(entry.session.clone())
    }

    pub async fn remove_session(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(session = %id, "session closed");
        }
        removed
    }

    /// Drop sessions untouched for at least `idle`. A session a request still holds is kept.
    pub async fn evict_idle(&self, idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep =
                entry.last_used.elapsed() < idle || Arc::strong_count(&entry.session) > 1;
            if !keep {
                tracing::info!(session = %id, "idle session evicted");
            }
            keep
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, active = sessions.len(), "idle sweep finished");
        }
        evicted
    }

    /// Sweep idle sessions every `every` for the lifetime of the server
    pub fn spawn_idle_sweeper(&self, idle: Duration, every: Duration) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                state.evict_idle(idle).await;
            }
        })
    }
}
