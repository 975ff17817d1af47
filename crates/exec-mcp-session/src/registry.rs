//! Session registry: the key → session map.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::session::Session;

/// Explicitly owned registry mapping caller-chosen integer keys to live
/// sessions.
///
/// Map mutations are atomic with respect to concurrent lifecycle calls on
/// different keys. Each session sits behind its own mutex; holding that
/// mutex is what serializes a reset against an in-flight poll on the same
/// key. The map lock itself is only ever held for map operations, never
/// across process I/O.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<u32, Arc<Mutex<Session>>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the session for a key.
    pub async fn get(&self, key: u32) -> Option<Arc<Mutex<Session>>> {
        self.sessions.lock().await.get(&key).cloned()
    }

    /// Insert a session, returning the shared handle.
    pub async fn insert(&self, key: u32, session: Session) -> Arc<Mutex<Session>> {
        let handle = Arc::new(Mutex::new(session));
        self.sessions.lock().await.insert(key, Arc::clone(&handle));
        handle
    }

    /// Remove the entry for a key, returning the handle if one existed.
    pub async fn remove(&self, key: u32) -> Option<Arc<Mutex<Session>>> {
        self.sessions.lock().await.remove(&key)
    }

    /// All live keys.
    pub async fn keys(&self) -> Vec<u32> {
        self.sessions.lock().await.keys().copied().collect()
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
