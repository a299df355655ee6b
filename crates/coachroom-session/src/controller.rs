//! Drives one session at a time through its lifecycle.
//!
//! `start` opens a session entity in the store and spawns a driver task
//! that owns the room connection for the session's whole life. The task
//! races the connect against the connect timeout and a leave signal, then
//! pumps room events into the subscriber until leave, the duration bound,
//! or a transport failure. Every exit goes through the same teardown:
//! stop reading events and leave requests, apply the ending event, then
//! release the link within [`DISCONNECT_GRACE`].

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::lifecycle::SessionEvent;
use crate::store::{SessionId, SessionStore};
use crate::subscriber::SummarySubscriber;
use coachroom_voice::{RoomConnection, RoomConnector, RoomEvent};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long teardown waits for the transport to acknowledge a disconnect.
/// The session is already `Ended` by then.
pub const DISCONNECT_GRACE: Duration = Duration::from_secs(5);

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// `leave()` was called, or the controller was dropped.
    Left,
    /// The maximum session duration elapsed.
    TimedOut,
    /// The connector refused the connection.
    ConnectFailed(String),
    /// The connection was not established within the connect timeout.
    ConnectTimedOut,
    /// The transport dropped an active connection.
    TransportLost(String),
}

impl EndReason {
    fn event(&self) -> SessionEvent {
        match self {
            EndReason::Left => SessionEvent::Leave,
            EndReason::TimedOut | EndReason::ConnectTimedOut => SessionEvent::Timeout,
            EndReason::ConnectFailed(_) => SessionEvent::ConnectFailed,
            EndReason::TransportLost(_) => SessionEvent::TransportError,
        }
    }
}

struct LiveSession {
    id: SessionId,
    leave_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<EndReason>>,
}

pub struct SessionController {
    store: SessionStore,
    connector: Arc<dyn RoomConnector>,
    config: SessionConfig,
    live: Mutex<Option<LiveSession>>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("config", &self.config)
            .field("session_id", &self.live().as_ref().map(|s| s.id))
            .finish_non_exhaustive()
    }
}

impl SessionController {
    pub fn new(store: SessionStore, connector: Arc<dyn RoomConnector>, config: SessionConfig) -> Self {
        Self {
            store,
            connector,
            config,
            live: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn live(&self) -> MutexGuard<'_, Option<LiveSession>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts a new session joining `room` as `identity`.
    ///
    /// Returns once the session is `Connecting`; the connection itself is
    /// established by a spawned task. Outside a tokio runtime this fails
    /// with [`SessionError::NoRuntime`] and the store is left untouched.
    pub fn start(&self, room: &str, identity: &str) -> Result<SessionId, SessionError> {
        let room = room.trim();
        let identity = identity.trim();
        if room.is_empty() {
            return Err(SessionError::InvalidTarget("room name is empty".to_string()));
        }
        if identity.is_empty() {
            return Err(SessionError::InvalidTarget("identity is empty".to_string()));
        }
        if self.config.require_artifact && self.store.get().artifact.is_none() {
            return Err(SessionError::ArtifactRequired);
        }

        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;

        let id = self.store.begin_session(room, identity)?;
        let (leave_tx, leave_rx) = oneshot::channel();
        let task = runtime.spawn(drive(
            Driver {
                store: self.store.clone(),
                connector: Arc::clone(&self.connector),
                config: self.config.clone(),
                id,
                room: room.to_string(),
                identity: identity.to_string(),
            },
            leave_rx,
        ));
        *self.live() = Some(LiveSession {
            id,
            leave_tx: Some(leave_tx),
            task: Some(task),
        });
        Ok(id)
    }

    /// Asks the live session to end. Returns `false` if no session was
    /// live to receive the request, including one that already ended on its
    /// own and is still releasing its link.
    pub fn leave(&self) -> bool {
        let sender = self.live().as_mut().and_then(|s| s.leave_tx.take());
        match sender {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Waits for the most recently started session to end and returns why.
    /// Returns `None` if there is nothing to wait for, or another caller
    /// already collected the result.
    pub async fn wait_ended(&self) -> Option<EndReason> {
        let task = self.live().as_mut().and_then(|s| s.task.take())?;
        match task.await {
            Ok(reason) => Some(reason),
            Err(e) => {
                warn!(error = %e, "session task failed");
                None
            }
        }
    }
}

struct Driver {
    store: SessionStore,
    connector: Arc<dyn RoomConnector>,
    config: SessionConfig,
    id: SessionId,
    room: String,
    identity: String,
}

impl Driver {
    fn finish(&self, reason: EndReason) -> EndReason {
        if let Err(e) = self.store.apply(self.id, reason.event()) {
            warn!(session_id = %self.id, error = %e, "failed to record session end");
        }
        info!(session_id = %self.id, room = %self.room, ?reason, "session ended");
        reason
    }
}

async fn drive(driver: Driver, mut leave_rx: oneshot::Receiver<()>) -> EndReason {
    let connect = tokio::time::timeout(
        driver.config.connect_timeout(),
        driver.connector.connect(&driver.room, &driver.identity),
    );

    // A dropped sender means the controller is gone; treat it as leave.
    let connected = tokio::select! {
        biased;
        _ = &mut leave_rx => Err(EndReason::Left),
        outcome = connect => match outcome {
            Ok(Ok(connection)) => Ok(connection),
            Ok(Err(e)) => Err(EndReason::ConnectFailed(e.to_string())),
            Err(_) => Err(EndReason::ConnectTimedOut),
        },
    };
    let connection: RoomConnection = match connected {
        Ok(connection) => connection,
        Err(reason) => {
            drop(leave_rx);
            return driver.finish(reason);
        }
    };

    let RoomConnection { link, mut events, .. } = connection;
    if let Err(e) = driver.store.apply(driver.id, SessionEvent::Connected) {
        warn!(session_id = %driver.id, error = %e, "failed to record connection");
    }
    // Counted from entry into Active.
    let deadline = tokio::time::sleep(driver.config.max_duration());
    tokio::pin!(deadline);

    let subscriber = SummarySubscriber::new(driver.store.clone());
    let reason = loop {
        tokio::select! {
            biased;
            _ = &mut leave_rx => break EndReason::Left,
            _ = &mut deadline => break EndReason::TimedOut,
            event = events.recv() => match event {
                Some(RoomEvent::Data(packet)) => {
                    let delivery = subscriber.on_packet(&packet);
                    debug!(session_id = %driver.id, ?delivery, "room packet handled");
                }
                Some(RoomEvent::Disconnected(reason)) => break EndReason::TransportLost(reason),
                None => break EndReason::TransportLost("event stream closed".to_string()),
            },
        }
    };

    drop(leave_rx);
    drop(subscriber);
    drop(events);
    let reason = driver.finish(reason);

    if tokio::time::timeout(DISCONNECT_GRACE, link.disconnect())
        .await
        .is_err()
    {
        warn!(session_id = %driver.id, room = %driver.room, "room disconnect did not complete; abandoning link");
    }
    reason
}
