use std::{
  collections::{hash_map::Entry, HashMap},
  sync::{Arc, Mutex, PoisonError},
};

use newsgpt_interface::Level;

pub type SessionId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
  #[default]
  AwaitingLevel,
  Active,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
  pub level: Option<Level>,
  pub state: SessionState,
}

/// Session records keyed by user.
///
/// Each record sits behind its own async mutex; holding it for a whole event
/// keeps one user's events from interleaving while other users proceed.
pub trait SessionStore: Send + Sync {
  /// Returns the session for `id`, creating a fresh one on first use.
  fn session(&self, id: SessionId) -> Arc<tokio::sync::Mutex<Session>>;
}

#[derive(Default)]
pub struct InMemorySessionStore {
  sessions: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<Session>>>>,
}

impl InMemorySessionStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl SessionStore for InMemorySessionStore {
  fn session(&self, id: SessionId) -> Arc<tokio::sync::Mutex<Session>> {
    let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
    match sessions.entry(id) {
      Entry::Occupied(occupied) => occupied.get().clone(),
      Entry::Vacant(vacant) => {
        log::debug!("Creating session for {id}");
        vacant.insert(Arc::default()).clone()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn sessions_are_created_on_first_use() {
    let store = InMemorySessionStore::new();

    let session = store.session(42);
    assert_eq!(*session.lock().await, Session::default());
    assert!(Arc::ptr_eq(&session, &store.session(42)));
  }

  #[tokio::test]
  async fn same_id_shares_one_record() {
    let store = InMemorySessionStore::new();
    store.session(1).lock().await.level = Some(Level::Advanced);

    assert_eq!(store.session(1).lock().await.level, Some(Level::Advanced));
    assert_eq!(store.session(2).lock().await.level, None);
  }
}
