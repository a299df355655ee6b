use crate::error::PublishError;
use crate::transport::{DataTransport, OutboundPacket, Reliability};
use coachroom_types::{now_millis, Artifact, Audience, Envelope, CV_SUMMARY_TOPIC};
use std::sync::Arc;
use tracing::info;

/// Sends artifacts into a room over the reliable data channel.
///
/// Fire-and-forget: a successful return means the transport accepted the
/// packet, not that anyone received it. Nothing is retried and no local
/// state is touched.
#[derive(Clone)]
pub struct BroadcastPublisher {
    transport: Arc<dyn DataTransport>,
}

impl BroadcastPublisher {
    pub fn new(transport: Arc<dyn DataTransport>) -> Self {
        Self { transport }
    }

    /// Publishes `artifact` to `audience` in `room` on the summary topic.
    ///
    /// # Errors
    ///
    /// - [`PublishError::NoRoom`] if `room` is blank.
    /// - [`PublishError::EmptyAudience`] for an explicit audience with no
    ///   identities.
    /// - [`PublishError::Transport`] if the transport refused the send.
    pub async fn publish(
        &self,
        room: &str,
        artifact: &Artifact,
        audience: &Audience,
    ) -> Result<(), PublishError> {
        if room.trim().is_empty() {
            return Err(PublishError::NoRoom);
        }
        if audience.is_empty() {
            return Err(PublishError::EmptyAudience);
        }

        let envelope = Envelope::for_artifact(artifact, now_millis());
        let payload = envelope.encode()?;
        let bytes = payload.len();

        self.transport
            .send_data(
                room,
                OutboundPacket {
                    topic: CV_SUMMARY_TOPIC.to_string(),
                    payload,
                    reliability: Reliability::Reliable,
                    audience: audience.clone(),
                },
            )
            .await?;

        info!(
            room,
            bytes,
            timestamp = envelope.timestamp,
            targeted = matches!(audience, Audience::Targets(_)),
            "summary published"
        );
        Ok(())
    }
}
