//! Participant-side session logic.
//!
//! A client process holds one [`SessionStore`] and one
//! [`SessionController`]. The controller drives the session lifecycle
//! (idle → connecting → active → ended) against a
//! [`RoomConnector`](coachroom_voice::RoomConnector), feeds inbound room
//! data to a [`SummarySubscriber`], and enforces the hard session
//! duration bound. The store is the single source of truth the UI reads.
//!
//! # Writers
//!
//! Only the controller writes lifecycle fields. Only the subscriber, or the
//! local upload flow before a session exists, writes the artifact.

pub mod config;
pub mod controller;
pub mod error;
pub mod lifecycle;
pub mod store;
pub mod subscriber;

pub use config::SessionConfig;
pub use controller::{EndReason, SessionController, DISCONNECT_GRACE};
pub use error::{SessionError, StoreError};
pub use lifecycle::{next_state, SessionEvent};
pub use store::{ListenerToken, SessionId, SessionStore, SessionView};
pub use subscriber::{Delivery, SummarySubscriber};
