//! Room transport for coachroom sessions.
//!
//! Sessions run inside a LiveKit room: the browser participant, the AI
//! agent, and the server all address the same room by name. This crate
//! provides:
//!
//! - [`VoiceService`]: server-side LiveKit access, meaning join tokens and
//!   the room service's `SendData` call.
//! - The transport seams: [`DataTransport`] for sending into a room by
//!   name, [`RoomConnector`]/[`RoomLink`] for a participant that joins a
//!   room and receives its data packets as an explicit event queue.
//! - [`LoopbackHub`]: an in-process room implementing every seam, used
//!   for local development and tests.
//! - [`BroadcastPublisher`]: wraps an artifact in an envelope and sends it
//!   reliably to an audience.

pub mod config;
pub mod error;
pub mod loopback;
pub mod publisher;
pub mod service;
pub mod transport;

pub use config::{LiveKitConfig, DEV_LIVEKIT_API_KEY, DEV_LIVEKIT_API_SECRET, DEV_LIVEKIT_URL};
pub use error::{PublishError, TransportError};
pub use loopback::LoopbackHub;
pub use publisher::BroadcastPublisher;
pub use service::VoiceService;
pub use transport::{
    DataTransport, InboundPacket, OutboundPacket, Reliability, RoomConnection, RoomConnector,
    RoomEvent, RoomLink,
};
