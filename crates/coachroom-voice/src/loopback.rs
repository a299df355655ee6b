//! In-process room hub.
//!
//! Rooms exist while they have participants. Packets are fanned out to the
//! addressed members in send order over unbounded queues, so the hub never
//! drops a packet for a member that is still connected.

use crate::error::TransportError;
use crate::transport::{
    DataTransport, InboundPacket, OutboundPacket, RoomConnection, RoomConnector, RoomEvent,
    RoomLink,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug)]
struct Member {
    connection_id: u64,
    tx: mpsc::UnboundedSender<RoomEvent>,
}

type Rooms = HashMap<String, HashMap<String, Member>>;

/// Shared in-memory rooms. Clones refer to the same hub.
///
/// Uses `std::sync::Mutex`: every critical section is a short map
/// operation that never spans an `.await`.
#[derive(Debug, Clone, Default)]
pub struct LoopbackHub {
    rooms: Arc<Mutex<Rooms>>,
    next_connection_id: Arc<AtomicU64>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, Rooms> {
        self.rooms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Identities currently in `room`, sorted.
    pub fn participants(&self, room: &str) -> Vec<String> {
        let mut identities: Vec<String> = self
            .rooms()
            .get(room)
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default();
        identities.sort();
        identities
    }

    /// Forcibly removes a participant, as a transport failure would.
    /// Returns `false` if the participant was not in the room.
    pub fn drop_participant(&self, room: &str, identity: &str, reason: &str) -> bool {
        let mut rooms = self.rooms();
        let Some(members) = rooms.get_mut(room) else {
            return false;
        };
        let Some(member) = members.remove(identity) else {
            return false;
        };
        let _ = member.tx.send(RoomEvent::Disconnected(reason.to_string()));
        if members.is_empty() {
            rooms.remove(room);
        }
        info!(room, identity, reason, "loopback participant dropped");
        true
    }

    fn deliver(
        &self,
        room: &str,
        sender: Option<&str>,
        packet: OutboundPacket,
    ) -> Result<usize, TransportError> {
        let rooms = self.rooms();
        let members = rooms
            .get(room)
            .ok_or_else(|| TransportError::RoomNotFound(room.to_string()))?;

        let mut delivered = 0;
        for (identity, member) in members {
            if Some(identity.as_str()) == sender || !packet.audience.includes(identity) {
                continue;
            }
            let event = RoomEvent::Data(InboundPacket {
                topic: Some(packet.topic.clone()),
                payload: packet.payload.clone(),
                sender: sender.map(str::to_string),
            });
            if member.tx.send(event).is_ok() {
                delivered += 1;
            }
        }
        debug!(room, delivered, topic = %packet.topic, "loopback packet delivered");
        Ok(delivered)
    }

    fn leave(&self, room: &str, identity: &str, connection_id: u64) {
        let mut rooms = self.rooms();
        if let Some(members) = rooms.get_mut(room) {
            // A newer connection may have reused the identity.
            if members
                .get(identity)
                .is_some_and(|m| m.connection_id == connection_id)
            {
                members.remove(identity);
            }
            if members.is_empty() {
                rooms.remove(room);
            }
        }
    }
}

#[async_trait]
impl DataTransport for LoopbackHub {
    async fn send_data(&self, room: &str, packet: OutboundPacket) -> Result<(), TransportError> {
        self.deliver(room, None, packet).map(|_| ())
    }
}

#[async_trait]
impl RoomConnector for LoopbackHub {
    async fn connect(&self, room: &str, identity: &str) -> Result<RoomConnection, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut rooms = self.rooms();
            let members = rooms.entry(room.to_string()).or_default();
            if members.contains_key(identity) {
                return Err(TransportError::DuplicateIdentity(identity.to_string()));
            }
            members.insert(identity.to_string(), Member { connection_id, tx });
        }
        info!(room, identity, "loopback participant joined");

        Ok(RoomConnection {
            room: room.to_string(),
            identity: identity.to_string(),
            link: Box::new(LoopbackLink {
                hub: self.clone(),
                room: room.to_string(),
                identity: identity.to_string(),
                connection_id,
                connected: AtomicBool::new(true),
            }),
            events: rx,
        })
    }
}

struct LoopbackLink {
    hub: LoopbackHub,
    room: String,
    identity: String,
    connection_id: u64,
    connected: AtomicBool,
}

#[async_trait]
impl RoomLink for LoopbackLink {
    async fn disconnect(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            self.hub.leave(&self.room, &self.identity, self.connection_id);
            info!(room = %self.room, identity = %self.identity, "loopback participant left");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Reliability;
    use coachroom_types::Audience;

    fn packet(payload: &str, audience: Audience) -> OutboundPacket {
        OutboundPacket {
            topic: "cv-summary".to_string(),
            payload: payload.as_bytes().to_vec(),
            reliability: Reliability::Reliable,
            audience,
        }
    }

    fn data(event: RoomEvent) -> InboundPacket {
        match event {
            RoomEvent::Data(packet) => packet,
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn server_send_reaches_every_member() {
        let hub = LoopbackHub::new();
        let mut alice = hub.connect("room-1", "alice").await.unwrap();
        let mut agent = hub.connect("room-1", "agent").await.unwrap();

        hub.send_data("room-1", packet("hi", Audience::All))
            .await
            .unwrap();

        for conn in [&mut alice, &mut agent] {
            let received = data(conn.events.recv().await.unwrap());
            assert_eq!(received.payload, b"hi");
            assert_eq!(received.topic.as_deref(), Some("cv-summary"));
            assert_eq!(received.sender, None);
        }
    }

    #[tokio::test]
    async fn targeted_send_skips_others() {
        let hub = LoopbackHub::new();
        let mut alice = hub.connect("room-1", "alice").await.unwrap();
        let mut agent = hub.connect("room-1", "agent").await.unwrap();

        hub.send_data("room-1", packet("for agent", Audience::targets(["agent"])))
            .await
            .unwrap();

        assert_eq!(data(agent.events.recv().await.unwrap()).payload, b"for agent");
        assert!(alice.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn sender_is_not_delivered_its_own_packet() {
        let hub = LoopbackHub::new();
        let mut alice = hub.connect("room-1", "alice").await.unwrap();
        let mut agent = hub.connect("room-1", "agent").await.unwrap();

        let delivered = hub
            .deliver("room-1", Some("alice"), packet("from alice", Audience::All))
            .unwrap();

        assert_eq!(delivered, 1);
        let received = data(agent.events.recv().await.unwrap());
        assert_eq!(received.sender.as_deref(), Some("alice"));
        assert!(alice.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn unknown_room_is_an_error() {
        let hub = LoopbackHub::new();
        let result = hub.send_data("nowhere", packet("x", Audience::All)).await;
        assert!(matches!(result, Err(TransportError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_identity_is_rejected() {
        let hub = LoopbackHub::new();
        let _alice = hub.connect("room-1", "alice").await.unwrap();
        let result = hub.connect("room-1", "alice").await;
        assert!(matches!(result, Err(TransportError::DuplicateIdentity(_))));
    }

    #[tokio::test]
    async fn disconnect_removes_member_and_empty_room() {
        let hub = LoopbackHub::new();
        let alice = hub.connect("room-1", "alice").await.unwrap();
        assert_eq!(hub.participants("room-1"), vec!["alice".to_string()]);

        alice.link.disconnect().await;
        alice.link.disconnect().await;
        assert!(hub.participants("room-1").is_empty());

        let result = hub.send_data("room-1", packet("late", Audience::All)).await;
        assert!(matches!(result, Err(TransportError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn stale_disconnect_does_not_evict_rejoined_identity() {
        let hub = LoopbackHub::new();
        let first = hub.connect("room-1", "alice").await.unwrap();
        assert!(hub.drop_participant("room-1", "alice", "network"));
        let _second = hub.connect("room-1", "alice").await.unwrap();

        first.link.disconnect().await;
        assert_eq!(hub.participants("room-1"), vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn drop_participant_emits_disconnected() {
        let hub = LoopbackHub::new();
        let mut alice = hub.connect("room-1", "alice").await.unwrap();

        assert!(hub.drop_participant("room-1", "alice", "ice failure"));
        assert_eq!(
            alice.events.recv().await.unwrap(),
            RoomEvent::Disconnected("ice failure".to_string())
        );
        assert!(!hub.drop_participant("room-1", "alice", "again"));
    }

    #[tokio::test]
    async fn delivery_preserves_send_order() {
        let hub = LoopbackHub::new();
        let mut alice = hub.connect("room-1", "alice").await.unwrap();

        for i in 0..5 {
            hub.send_data("room-1", packet(&i.to_string(), Audience::All))
                .await
                .unwrap();
        }
        for i in 0..5 {
            assert_eq!(
                data(alice.events.recv().await.unwrap()).payload,
                i.to_string().into_bytes()
            );
        }
    }
}
