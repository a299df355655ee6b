use crate::config::LiveKitConfig;
use crate::error::TransportError;
use crate::transport::{DataTransport, OutboundPacket};
use async_trait::async_trait;
use livekit_api::access_token::{AccessToken, VideoGrants};
use livekit_api::services::room::{RoomClient, SendDataOptions};
use std::time::Duration;
use tracing::debug;

/// Server-side access to a LiveKit deployment.
#[derive(Debug)]
pub struct VoiceService {
    config: LiveKitConfig,
    room_client: RoomClient,
}

impl VoiceService {
    pub fn new(config: LiveKitConfig) -> Self {
        let room_client =
            RoomClient::with_api_key(&config.url, &config.api_key, &config.api_secret);
        Self {
            config,
            room_client,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    pub fn get_url(&self) -> &str {
        &self.config.url
    }

    /// Mints a join token that lets a participant publish media and data
    /// and subscribe to everyone else in `room_name`.
    pub fn generate_join_token(
        &self,
        room_name: &str,
        participant_identity: &str,
        participant_name: &str,
    ) -> Result<String, TransportError> {
        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(participant_identity)
            .with_name(participant_name)
            .with_grants(VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                can_publish: true,
                can_subscribe: true,
                can_publish_data: true,
                ..Default::default()
            })
            .with_ttl(Duration::from_secs(self.config.token_ttl_seconds));

        token.to_jwt().map_err(TransportError::Token)
    }
}

#[async_trait]
impl DataTransport for VoiceService {
    async fn send_data(&self, room: &str, packet: OutboundPacket) -> Result<(), TransportError> {
        let bytes = packet.payload.len();
        let options = SendDataOptions {
            kind: packet.reliability.into(),
            destination_identities: packet.audience.destination_identities(),
            topic: Some(packet.topic),
            ..Default::default()
        };

        self.room_client
            .send_data(room, packet.payload, options)
            .await
            .map_err(|e| TransportError::RoomService(e.to_string()))?;

        debug!(room, bytes, "data packet handed to LiveKit room service");
        Ok(())
    }
}
