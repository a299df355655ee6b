//! Applies summary envelopes received from the room to the session store.

use crate::store::SessionStore;
use coachroom_types::envelope::{Decoded, Envelope, CV_SUMMARY_TOPIC};
use coachroom_voice::InboundPacket;
use tracing::{debug, trace, warn};

/// What happened to one inbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The artifact replaced the stored one.
    Accepted,
    /// Well-formed, but not newer than what the store holds.
    Unchanged,
    /// Another topic or message type; not ours to handle.
    Ignored,
    /// Malformed, or the store refused the write.
    Dropped,
}

/// Stateless apart from its store handle; safe to clone per connection.
#[derive(Debug, Clone)]
pub struct SummarySubscriber {
    store: SessionStore,
}

impl SummarySubscriber {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Handles a packet from the room. Packets on another named topic are
    /// ignored; untagged packets are inspected by message type.
    pub fn on_packet(&self, packet: &InboundPacket) -> Delivery {
        if let Some(topic) = packet.topic.as_deref() {
            if topic != CV_SUMMARY_TOPIC {
                trace!(topic, "ignoring packet on foreign topic");
                return Delivery::Ignored;
            }
        }
        self.on_envelope(&packet.payload)
    }

    /// Decodes and applies one raw envelope. Never fails: malformed input
    /// is logged and dropped without touching the store.
    pub fn on_envelope(&self, raw: &[u8]) -> Delivery {
        let envelope = match Envelope::decode(raw) {
            Ok(Decoded::Summary(envelope)) => envelope,
            Ok(Decoded::Other(kind)) => {
                trace!(kind = %kind, "ignoring envelope of another type");
                return Delivery::Ignored;
            }
            Err(e) => {
                debug!(error = %e, len = raw.len(), "dropping malformed envelope");
                return Delivery::Dropped;
            }
        };

        let received_bytes = envelope.payload.trim().len();
        let artifact = match envelope.into_artifact() {
            Ok(artifact) => artifact,
            Err(e) => {
                debug!(error = %e, "dropping envelope without usable payload");
                return Delivery::Dropped;
            }
        };
        let kept_bytes = artifact.payload().len();
        if kept_bytes < received_bytes {
            debug!(received_bytes, kept_bytes, "inbound summary truncated to payload bound");
        }

        match self.store.set_artifact(artifact) {
            Ok(true) => {
                debug!("summary updated from room");
                Delivery::Accepted
            }
            Ok(false) => Delivery::Unchanged,
            Err(e) => {
                warn!(error = %e, "summary write refused");
                Delivery::Dropped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachroom_types::{Artifact, MAX_ARTIFACT_PAYLOAD_BYTES};

    fn envelope(payload: &str, timestamp: u64) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "type": "cv_summary",
            "payload": payload,
            "timestamp": timestamp,
        }))
        .unwrap()
    }

    fn subscriber() -> (SummarySubscriber, SessionStore) {
        let store = SessionStore::new();
        (SummarySubscriber::new(store.clone()), store)
    }

    #[test]
    fn accepts_summary() {
        let (sub, store) = subscriber();
        assert_eq!(sub.on_envelope(&envelope("Ten years of Rust.", 10)), Delivery::Accepted);
        assert_eq!(store.get().summary(), Some("Ten years of Rust."));
    }

    #[test]
    fn duplicate_is_unchanged() {
        let (sub, store) = subscriber();
        let raw = envelope("same", 10);
        sub.on_envelope(&raw);
        let before = store.get();
        assert_eq!(sub.on_envelope(&raw), Delivery::Unchanged);
        assert_eq!(store.get(), before);
    }

    #[test]
    fn older_envelope_does_not_regress() {
        let (sub, store) = subscriber();
        sub.on_envelope(&envelope("newer", 20));
        assert_eq!(sub.on_envelope(&envelope("older", 10)), Delivery::Unchanged);
        assert_eq!(store.get().summary(), Some("newer"));
    }

    #[test]
    fn legacy_summary_field_is_accepted() {
        let (sub, store) = subscriber();
        let raw = br#"{"type":"cv_summary","summary":"legacy","timestamp":3}"#;
        assert_eq!(sub.on_envelope(raw), Delivery::Accepted);
        assert_eq!(store.get().summary(), Some("legacy"));
    }

    #[test]
    fn oversized_summary_is_accepted_truncated() {
        let (sub, store) = subscriber();
        let long = "é".repeat(MAX_ARTIFACT_PAYLOAD_BYTES);
        assert_eq!(sub.on_envelope(&envelope(&long, 4)), Delivery::Accepted);

        let kept = store.get().summary().unwrap().to_string();
        assert!(kept.len() <= MAX_ARTIFACT_PAYLOAD_BYTES);
        assert!(kept.len() > MAX_ARTIFACT_PAYLOAD_BYTES - 2);
        assert!(long.starts_with(&kept));
    }

    #[test]
    fn other_types_are_ignored() {
        let (sub, store) = subscriber();
        let raw = br#"{"type":"transcript","payload":"hello","timestamp":3}"#;
        assert_eq!(sub.on_envelope(raw), Delivery::Ignored);
        assert!(store.get().artifact.is_none());
    }

    #[test]
    fn malformed_input_is_dropped() {
        let (sub, store) = subscriber();
        store
            .set_artifact(Artifact::summary("existing", 1).unwrap())
            .unwrap();
        let before = store.get();

        for raw in [
            &b"not json"[..],
            &[0xff, 0xfe, 0x00][..],
            &br#"{"type":"cv_summary","timestamp":3}"#[..],
            &br#"{"type":"cv_summary","payload":"   ","timestamp":3}"#[..],
            &br#"{"payload":"no type","timestamp":3}"#[..],
        ] {
            assert_eq!(sub.on_envelope(raw), Delivery::Dropped);
        }
        assert_eq!(store.get(), before);
    }

    #[test]
    fn topic_filter() {
        let (sub, store) = subscriber();
        let mut packet = InboundPacket {
            topic: Some("chat".to_string()),
            payload: envelope("wrong topic", 5),
            sender: None,
        };
        assert_eq!(sub.on_packet(&packet), Delivery::Ignored);
        assert!(store.get().artifact.is_none());

        packet.topic = None;
        assert_eq!(sub.on_packet(&packet), Delivery::Accepted);

        packet.topic = Some(CV_SUMMARY_TOPIC.to_string());
        packet.payload = envelope("tagged", 6);
        assert_eq!(sub.on_packet(&packet), Delivery::Accepted);
        assert_eq!(store.get().summary(), Some("tagged"));
    }
}
