//! Process-local session state with synchronous change notification.

use crate::error::{SessionError, StoreError};
use crate::lifecycle::{next_state, SessionEvent};
use chrono::{DateTime, Utc};
use coachroom_types::{Artifact, LifecycleState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use tracing::{debug, info};
use uuid::Uuid;

pub type SessionId = Uuid;

/// Snapshot of everything the UI needs about the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub session_id: Option<SessionId>,
    pub lifecycle: LifecycleState,
    pub room: Option<String>,
    pub identity: Option<String>,
    /// Set on entry into the active state.
    pub started_at: Option<DateTime<Utc>>,
    pub artifact: Option<Arc<Artifact>>,
}

impl SessionView {
    fn idle() -> Self {
        Self {
            session_id: None,
            lifecycle: LifecycleState::Idle,
            room: None,
            identity: None,
            started_at: None,
            artifact: None,
        }
    }

    pub fn is_session_active(&self) -> bool {
        self.lifecycle == LifecycleState::Active
    }

    pub fn summary(&self) -> Option<&str> {
        self.artifact.as_deref().map(Artifact::payload)
    }
}

/// Returned by [`SessionStore::subscribe`]; pass to
/// [`SessionStore::unsubscribe`] to stop notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

type Listener = Arc<dyn Fn(&SessionView) + Send + Sync>;

struct Shared {
    view: Mutex<SessionView>,
    listeners: Mutex<Vec<(ListenerToken, Listener)>>,
    next_listener: AtomicU64,
    /// Serializes write + notify so listeners observe writes in order.
    write_gate: Mutex<()>,
    /// Thread currently running listeners, for the reentrancy check.
    notifying: Mutex<Option<ThreadId>>,
}

/// Cheaply cloneable handle to one session's state.
///
/// Readers always get a whole snapshot: a write replaces fields under one
/// lock, so a partially applied artifact or transition is never visible.
/// Listeners run synchronously after each effective write, in registration
/// order, on the writing thread. A listener that writes back into the store
/// gets [`StoreError::Reentrant`].
#[derive(Clone)]
pub struct SessionStore {
    shared: Arc<Shared>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("view", &*lock(&self.shared.view))
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct NotifyingGuard<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for NotifyingGuard<'_> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                view: Mutex::new(SessionView::idle()),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
                write_gate: Mutex::new(()),
                notifying: Mutex::new(None),
            }),
        }
    }

    pub fn get(&self) -> SessionView {
        lock(&self.shared.view).clone()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerToken
    where
        F: Fn(&SessionView) + Send + Sync + 'static,
    {
        let token = ListenerToken(self.shared.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.shared.listeners).push((token, Arc::new(listener)));
        token
    }

    /// Returns `false` if the token was already removed.
    pub fn unsubscribe(&self, token: ListenerToken) -> bool {
        let mut listeners = lock(&self.shared.listeners);
        let before = listeners.len();
        listeners.retain(|(t, _)| *t != token);
        listeners.len() != before
    }

    /// Offers `artifact` under last-write-wins by production time.
    ///
    /// Returns `Ok(true)` if it replaced the current artifact, `Ok(false)`
    /// if it was older than or identical to what is held.
    pub fn set_artifact(&self, artifact: Artifact) -> Result<bool, StoreError> {
        let accepted = self.write(|view| {
            let newer = match view.artifact.as_deref() {
                None => true,
                Some(current) => artifact.supersedes(current),
            };
            if newer {
                view.artifact = Some(Arc::new(artifact));
            }
            newer.then_some(())
        })?;
        Ok(accepted.is_some())
    }

    /// Opens a new session entity in `Connecting`.
    ///
    /// Fails with [`SessionError::AlreadyLive`] while another session is
    /// connecting or active. The artifact carries over.
    pub(crate) fn begin_session(&self, room: &str, identity: &str) -> Result<SessionId, SessionError> {
        let id = Uuid::new_v4();
        let opened = self.write(|view| {
            if view.lifecycle.is_live() {
                return None;
            }
            let connecting = next_state(LifecycleState::Idle, SessionEvent::Start)?;
            view.session_id = Some(id);
            view.lifecycle = connecting;
            view.room = Some(room.to_string());
            view.identity = Some(identity.to_string());
            view.started_at = None;
            Some(())
        })?;
        match opened {
            Some(()) => {
                info!(session_id = %id, room, identity, "session connecting");
                Ok(id)
            }
            None => Err(SessionError::AlreadyLive),
        }
    }

    /// Applies `event` to session `id`. Events for a different session and
    /// undefined transitions leave the store untouched and return `None`.
    pub(crate) fn apply(
        &self,
        id: SessionId,
        event: SessionEvent,
    ) -> Result<Option<LifecycleState>, StoreError> {
        let applied = self.write(|view| {
            if view.session_id != Some(id) {
                return None;
            }
            let from = view.lifecycle;
            let to = next_state(from, event)?;
            view.lifecycle = to;
            if to == LifecycleState::Active {
                view.started_at = Some(Utc::now());
            }
            Some((from, to))
        })?;

        match applied {
            Some((from, to)) => {
                info!(
                    session_id = %id,
                    from = from.label(),
                    to = to.label(),
                    ?event,
                    "session transition"
                );
                Ok(Some(to))
            }
            None => {
                debug!(session_id = %id, ?event, "session event ignored");
                Ok(None)
            }
        }
    }

    /// Runs `mutate` under the view lock; if it returns `Some`, notifies
    /// listeners with the resulting snapshot.
    fn write<R>(
        &self,
        mutate: impl FnOnce(&mut SessionView) -> Option<R>,
    ) -> Result<Option<R>, StoreError> {
        let me = thread::current().id();
        if *lock(&self.shared.notifying) == Some(me) {
            return Err(StoreError::Reentrant);
        }
        let _gate = lock(&self.shared.write_gate);

        let (result, snapshot) = {
            let mut view = lock(&self.shared.view);
            match mutate(&mut view) {
                Some(result) => (Some(result), Some(view.clone())),
                None => (None, None),
            }
        };

        if let Some(snapshot) = snapshot {
            let listeners: Vec<Listener> = lock(&self.shared.listeners)
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            *lock(&self.shared.notifying) = Some(me);
            let _notifying = NotifyingGuard(&self.shared.notifying);
            for listener in listeners {
                listener(&snapshot);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn summary(text: &str, at: u64) -> Artifact {
        Artifact::summary(text, at).unwrap()
    }

    #[test]
    fn starts_idle_and_empty() {
        let view = SessionStore::new().get();
        assert_eq!(view.lifecycle, LifecycleState::Idle);
        assert!(view.artifact.is_none());
        assert!(!view.is_session_active());
    }

    #[test]
    fn last_write_wins_by_timestamp_in_either_order() {
        let forward = SessionStore::new();
        forward.set_artifact(summary("first", 1)).unwrap();
        forward.set_artifact(summary("second", 2)).unwrap();

        let backward = SessionStore::new();
        backward.set_artifact(summary("second", 2)).unwrap();
        assert!(!backward.set_artifact(summary("first", 1)).unwrap());

        assert_eq!(forward.get().summary(), Some("second"));
        assert_eq!(backward.get().summary(), Some("second"));
    }

    #[test]
    fn identical_write_is_idempotent_and_silent() {
        let store = SessionStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.set_artifact(summary("same", 5)).unwrap());
        let after_first = store.get();
        assert!(!store.set_artifact(summary("same", 5)).unwrap());

        assert_eq!(store.get(), after_first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let store = SessionStore::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            store.subscribe(move |_| order.lock().unwrap().push(i));
        }

        store.set_artifact(summary("x", 1)).unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn listener_sees_new_value() {
        let store = SessionStore::new();
        let seen = Arc::new(Mutex::new(None));
        let slot = seen.clone();
        store.subscribe(move |view| {
            *slot.lock().unwrap() = view.summary().map(str::to_string);
        });

        store.set_artifact(summary("fresh", 1)).unwrap();
        assert_eq!(seen.lock().unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = SessionStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let token = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.set_artifact(summary("a", 1)).unwrap();
        assert!(store.unsubscribe(token));
        assert!(!store.unsubscribe(token));
        store.set_artifact(summary("b", 2)).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn writing_from_a_listener_is_rejected() {
        let store = SessionStore::new();
        let inner = store.clone();
        let result = Arc::new(Mutex::new(None));
        let slot = result.clone();
        store.subscribe(move |_| {
            *slot.lock().unwrap() = Some(inner.set_artifact(summary("storm", 99)));
        });

        store.set_artifact(summary("trigger", 1)).unwrap();

        assert_eq!(
            *result.lock().unwrap(),
            Some(Err(StoreError::Reentrant))
        );
        assert_eq!(store.get().summary(), Some("trigger"));
        // The guard is released once notification finishes.
        assert!(store.set_artifact(summary("later", 2)).unwrap());
    }

    #[test]
    fn reading_from_a_listener_is_allowed() {
        let store = SessionStore::new();
        let inner = store.clone();
        let seen = Arc::new(Mutex::new(None));
        let slot = seen.clone();
        store.subscribe(move |_| {
            *slot.lock().unwrap() = Some(inner.get().summary().map(str::to_string));
        });

        store.set_artifact(summary("readable", 1)).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            Some(Some("readable".to_string()))
        );
    }

    #[test]
    fn one_live_session_at_a_time() {
        let store = SessionStore::new();
        let first = store.begin_session("room-1", "alice").unwrap();
        assert_eq!(store.get().lifecycle, LifecycleState::Connecting);
        assert_eq!(
            store.begin_session("room-2", "alice"),
            Err(SessionError::AlreadyLive)
        );

        store.apply(first, SessionEvent::ConnectFailed).unwrap();
        assert_eq!(store.get().lifecycle, LifecycleState::Ended);

        let second = store.begin_session("room-2", "alice").unwrap();
        assert_ne!(first, second);
        assert_eq!(store.get().room.as_deref(), Some("room-2"));
    }

    #[test]
    fn events_for_stale_sessions_are_ignored() {
        let store = SessionStore::new();
        let first = store.begin_session("room-1", "alice").unwrap();
        store.apply(first, SessionEvent::Leave).unwrap();
        let second = store.begin_session("room-1", "alice").unwrap();

        assert_eq!(store.apply(first, SessionEvent::Connected).unwrap(), None);
        assert_eq!(store.get().session_id, Some(second));
        assert_eq!(store.get().lifecycle, LifecycleState::Connecting);
    }

    #[test]
    fn entering_active_stamps_start_time() {
        let store = SessionStore::new();
        let id = store.begin_session("room-1", "alice").unwrap();
        assert!(store.get().started_at.is_none());
        store.apply(id, SessionEvent::Connected).unwrap();
        let view = store.get();
        assert!(view.is_session_active());
        assert!(view.started_at.is_some());
    }

    #[test]
    fn artifact_survives_session_boundaries() {
        let store = SessionStore::new();
        store.set_artifact(summary("kept", 1)).unwrap();
        let id = store.begin_session("room-1", "alice").unwrap();
        store.apply(id, SessionEvent::Leave).unwrap();
        assert_eq!(store.get().summary(), Some("kept"));
    }
}
