//! In-memory transcripts, one per session.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use parley_conversation::{SessionId, Transcript};
use tokio::sync::Mutex;
use tracing::debug;

/// A shared handle to one session's transcript.
///
/// Holding the lock serializes exchanges within the session.
pub type SessionHandle = Arc<Mutex<Transcript>>;

/// Transcripts of all live sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the handle for `id`, creating an empty transcript if needed.
    pub fn session(&self, id: &SessionId) -> SessionHandle {
        if let Some(handle) = self.sessions.read().get(id) {
            return handle.clone();
        }

        self.sessions
            .write()
            .entry(id.clone())
            .or_insert_with(|| {
                debug!(session = %id, "Creating session.");
                SessionHandle::default()
            })
            .clone()
    }

    /// A copy of the transcript of `id`.
    ///
    /// Unknown sessions have an empty transcript. Waits for any exchange in
    /// progress to finish.
    pub async fn snapshot(&self, id: &SessionId) -> Transcript {
        let handle = self.sessions.read().get(id).cloned();
        match handle {
            Some(handle) => handle.lock().await.clone(),
            None => Transcript::new(),
        }
    }

    /// Forget the session `id`.
    ///
    /// Returns whether the session existed.
    pub fn remove(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            debug!(session = %id, "Removed session.");
        }

        removed
    }

    /// Forget `id` if its transcript is empty and no one else holds it.
    ///
    /// Returns whether the session was removed.
    pub fn discard_if_empty(&self, id: &SessionId) -> bool {
        let mut sessions = self.sessions.write();

        let unused = sessions.get(id).is_some_and(|handle| {
            Arc::strong_count(handle) == 1
                && handle.try_lock().is_ok_and(|transcript| transcript.is_empty())
        });

        if unused {
            sessions.remove(id);
            debug!(session = %id, "Discarded empty session.");
        }

        unused
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use parley_conversation::Turn;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_session_is_created_once() {
        let store = SessionStore::new();
        let id = SessionId::new();

        let a = store.session(&id);
        let b = store.session(&id);

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let (a, b) = (SessionId::new(), SessionId::new());

        store
            .session(&a)
            .lock()
            .await
            .push_exchange(Turn::user("a"), Turn::model("for a"));

        assert_eq!(store.snapshot(&a).await.len(), 2);
        assert!(store.snapshot(&b).await.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_does_not_create_session() {
        let store = SessionStore::new();

        assert!(store.snapshot(&SessionId::new()).await.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_discard_if_empty() {
        let store = SessionStore::new();
        let (empty, held, used) = (SessionId::new(), SessionId::new(), SessionId::new());

        drop(store.session(&empty));
        let handle = store.session(&held);
        store
            .session(&used)
            .lock()
            .await
            .push_exchange(Turn::user("q"), Turn::model("a"));

        assert!(store.discard_if_empty(&empty));
        assert!(!store.discard_if_empty(&held));
        assert!(!store.discard_if_empty(&used));
        assert_eq!(store.len(), 2);

        drop(handle);
        assert!(store.discard_if_empty(&held));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SessionStore::new();
        let id = SessionId::new();
        store
            .session(&id)
            .lock()
            .await
            .push_exchange(Turn::user("q"), Turn::model("a"));

        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.snapshot(&id).await.is_empty());
    }
}
