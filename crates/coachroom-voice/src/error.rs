use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("LiveKit token error: {0}")]
    Token(#[from] livekit_api::access_token::AccessTokenError),

    #[error("Room service error: {0}")]
    RoomService(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Participant identity already in room: {0}")]
    DuplicateIdentity(String),
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("no room to publish to")]
    NoRoom,

    #[error("audience names no participants")]
    EmptyAudience,

    #[error("failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
