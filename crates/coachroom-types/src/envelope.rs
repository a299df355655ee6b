//! Wire form of an artifact on a room's data channel.
//!
//! Envelopes are UTF-8 JSON objects:
//!
//! ```json
//! {"type": "cv_summary", "payload": "...", "timestamp": 1700000000000}
//! ```
//!
//! Older clients put the text under `summary` instead of `payload`. Decode
//! takes a non-blank `payload` first and falls back to `summary`; encode
//! always writes `payload`.

use crate::artifact::{Artifact, ArtifactKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Envelope discriminator for document summaries.
pub const CV_SUMMARY_TYPE: &str = "cv_summary";

/// Data channel topic summaries are published on.
pub const CV_SUMMARY_TOPIC: &str = "cv-summary";

/// Errors decoding an inbound data packet.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("packet is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("packet is not a valid envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("envelope has an empty payload")]
    MissingPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: String,
    /// Epoch milliseconds at send time.
    pub timestamp: u64,
}

/// Result of decoding a packet that parsed as JSON with a `type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A summary envelope with a non-empty payload.
    Summary(Envelope),
    /// Some other message kind; carries the discriminator for logging.
    Other(String),
}

#[derive(Deserialize)]
struct Header {
    #[serde(rename = "type")]
    kind: String,
}

/// Inbound shape, tolerant of either text field or both.
#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    payload: Option<String>,
    summary: Option<String>,
    timestamp: u64,
}

impl Envelope {
    /// Wraps `artifact` for sending, stamped with `timestamp`.
    pub fn for_artifact(artifact: &Artifact, timestamp: u64) -> Self {
        Self {
            kind: artifact.kind().wire_type().to_string(),
            payload: artifact.payload().to_string(),
            timestamp,
        }
    }

    /// Serializes to UTF-8 JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes raw packet bytes.
    ///
    /// Only the `type` field is required to tell foreign messages apart, so
    /// unknown kinds with arbitrary shapes decode to [`Decoded::Other`]
    /// rather than failing.
    pub fn decode(raw: &[u8]) -> Result<Decoded, DecodeError> {
        let text = std::str::from_utf8(raw)?;
        let header: Header = serde_json::from_str(text)?;
        if header.kind != CV_SUMMARY_TYPE {
            return Ok(Decoded::Other(header.kind));
        }
        let raw: RawEnvelope = serde_json::from_str(text)?;
        let payload = raw
            .payload
            .filter(|text| !text.trim().is_empty())
            .or(raw.summary)
            .filter(|text| !text.trim().is_empty())
            .ok_or(DecodeError::MissingPayload)?;
        Ok(Decoded::Summary(Envelope {
            kind: raw.kind,
            payload,
            timestamp: raw.timestamp,
        }))
    }

    /// Converts a summary envelope into an artifact produced at the
    /// envelope's timestamp.
    pub fn into_artifact(self) -> Result<Artifact, DecodeError> {
        debug_assert_eq!(self.kind, ArtifactKind::Summary.wire_type());
        Artifact::summary(&self.payload, self.timestamp).ok_or(DecodeError::MissingPayload)
    }
}
