//! Seams between session logic and the real-time platform.

use crate::error::TransportError;
use async_trait::async_trait;
use coachroom_types::Audience;
use tokio::sync::mpsc;

/// Delivery mode requested from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reliability {
    /// Retransmitted until delivered or the connection drops.
    #[default]
    Reliable,
    /// Best effort; may be dropped under load.
    Lossy,
}

impl From<Reliability> for livekit_protocol::data_packet::Kind {
    fn from(value: Reliability) -> Self {
        match value {
            Reliability::Reliable => Self::Reliable,
            Reliability::Lossy => Self::Lossy,
        }
    }
}

/// A data packet to send into a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPacket {
    pub topic: String,
    pub payload: Vec<u8>,
    pub reliability: Reliability,
    pub audience: Audience,
}

/// A data packet received from a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPacket {
    pub topic: Option<String>,
    pub payload: Vec<u8>,
    /// Sending participant; `None` for server-originated packets.
    pub sender: Option<String>,
}

/// Everything a joined participant can observe from its room, in delivery
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    Data(InboundPacket),
    /// The transport dropped this participant. No further events follow.
    Disconnected(String),
}

/// Sends data into a room addressed by name, without being a participant.
#[async_trait]
pub trait DataTransport: Send + Sync {
    /// Hands `packet` to the transport. Returns once the transport accepted
    /// it; there is no delivery acknowledgement.
    async fn send_data(&self, room: &str, packet: OutboundPacket) -> Result<(), TransportError>;
}

/// A joined participant's handle on its room. Sending goes through the
/// server-side [`DataTransport`]; the link only holds membership.
#[async_trait]
pub trait RoomLink: Send + Sync {
    /// Leaves the room. Idempotent.
    async fn disconnect(&self);
}

/// A live room connection: the link that holds membership plus the
/// inbound event queue. Dropping `events` stops delivery to this participant.
pub struct RoomConnection {
    pub room: String,
    pub identity: String,
    pub link: Box<dyn RoomLink>,
    pub events: mpsc::UnboundedReceiver<RoomEvent>,
}

impl std::fmt::Debug for RoomConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomConnection")
            .field("room", &self.room)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Joins rooms as a participant.
#[async_trait]
pub trait RoomConnector: Send + Sync {
    async fn connect(&self, room: &str, identity: &str) -> Result<RoomConnection, TransportError>;
}
