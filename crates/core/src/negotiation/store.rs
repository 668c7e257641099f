use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::load::LoadId;
use crate::negotiation::session::NegotiationSession;

/// Where negotiation sessions live between offers.
///
/// Sessions are not a system of record; the conditional booking update is the
/// correctness backstop. Checkout hands back a per-load cell whose lock
/// serializes advances for that load while other loads proceed concurrently.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Return the session cell for `load_id`, creating an open session at
    /// round zero when none exists.
    async fn checkout(&self, load_id: &LoadId) -> Arc<Mutex<NegotiationSession>>;

    /// Drop the session for `load_id`, returning the evicted state. A fresh
    /// negotiation for a rejected load starts by evicting the old session;
    /// accepted loads stay blocked by the persisted `booked` flag regardless.
    async fn evict(&self, load_id: &LoadId) -> Option<NegotiationSession>;
}

/// In-process session table for single-instance deployments.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<LoadId, Arc<Mutex<NegotiationSession>>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently held, terminal ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn checkout(&self, load_id: &LoadId) -> Arc<Mutex<NegotiationSession>> {
        if let Some(cell) = self.sessions.read().await.get(load_id) {
            return cell.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(load_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(NegotiationSession::new(load_id.clone()))))
            .clone()
    }

    async fn evict(&self, load_id: &LoadId) -> Option<NegotiationSession> {
        let cell = self.sessions.write().await.remove(load_id)?;
        let session = cell.lock().await.clone();
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::domain::load::LoadId;
    use crate::negotiation::session::SessionStatus;

    use super::{InMemorySessionStore, SessionStore};

    #[tokio::test]
    async fn checkout_creates_then_reuses_the_same_cell() {
        let store = InMemorySessionStore::new();
        let load_id = LoadId("LD-1001".to_string());

        let first = store.checkout(&load_id).await;
        first.lock().await.round = 2;

        let second = store.checkout(&load_id).await;
        assert_eq!(second.lock().await.round, 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn distinct_loads_get_independent_sessions() {
        let store = InMemorySessionStore::new();
        let a = store.checkout(&LoadId("LD-A".to_string())).await;
        let b = store.checkout(&LoadId("LD-B".to_string())).await;

        a.lock().await.round = 3;
        assert_eq!(b.lock().await.round, 0);
    }

    #[tokio::test]
    async fn evict_returns_the_final_state() {
        let store = InMemorySessionStore::new();
        let load_id = LoadId("LD-1001".to_string());

        let cell = store.checkout(&load_id).await;
        cell.lock().await.close(3, SessionStatus::Rejected, None);

        let evicted = store.evict(&load_id).await.expect("session existed");
        assert_eq!(evicted.status, SessionStatus::Rejected);
        assert!(store.is_empty().await);

        // A fresh checkout starts a brand new negotiation.
        let fresh = store.checkout(&load_id).await;
        assert_eq!(fresh.lock().await.round, 0);
    }

    #[tokio::test]
    async fn concurrent_checkouts_converge_on_one_cell() {
        let store = Arc::new(InMemorySessionStore::new());
        let load_id = LoadId("LD-1001".to_string());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let load_id = load_id.clone();
            handles.push(tokio::spawn(async move {
                let cell = store.checkout(&load_id).await;
                cell.lock().await.round += 1;
            }));
        }
        for handle in handles {
            handle.await.expect("task completes");
        }

        let cell = store.checkout(&load_id).await;
        assert_eq!(cell.lock().await.round, 8);
        assert_eq!(store.len().await, 1);
    }
}
