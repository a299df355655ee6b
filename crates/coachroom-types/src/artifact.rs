//! The artifact: a derived value shared with every session participant.

use crate::truncate_utf8;
use std::cmp::Ordering;

/// Upper bound on an artifact payload (4 KiB of UTF-8).
pub const MAX_ARTIFACT_PAYLOAD_BYTES: usize = 4 * 1024;

/// Kinds of artifact a session can hold. Only document summaries exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Summary,
}

impl ArtifactKind {
    /// The envelope `type` discriminator used on the wire for this kind.
    pub fn wire_type(self) -> &'static str {
        match self {
            Self::Summary => crate::CV_SUMMARY_TYPE,
        }
    }
}

/// An immutable, bounded text value with the time it was produced.
///
/// Only [`Artifact::summary`] and [`Artifact::summary_bounded`] build one,
/// so a held artifact is never empty or over the bound. The wire form is
/// [`crate::Envelope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    kind: ArtifactKind,
    payload: String,
    /// Epoch milliseconds.
    produced_at: u64,
}

impl Artifact {
    /// Builds a summary artifact, truncating the payload to
    /// [`MAX_ARTIFACT_PAYLOAD_BYTES`].
    ///
    /// Returns `None` when the payload is empty or whitespace only.
    pub fn summary(payload: &str, produced_at: u64) -> Option<Self> {
        Self::summary_bounded(payload, produced_at, MAX_ARTIFACT_PAYLOAD_BYTES)
    }

    /// Like [`Artifact::summary`] with a caller-chosen bound, itself capped at
    /// [`MAX_ARTIFACT_PAYLOAD_BYTES`].
    pub fn summary_bounded(payload: &str, produced_at: u64, max_bytes: usize) -> Option<Self> {
        let trimmed = payload.trim();
        if trimmed.is_empty() || max_bytes == 0 {
            return None;
        }
        let bounded = truncate_utf8(trimmed, max_bytes.min(MAX_ARTIFACT_PAYLOAD_BYTES));
        if bounded.is_empty() {
            return None;
        }
        Some(Self {
            kind: ArtifactKind::Summary,
            payload: bounded.to_string(),
            produced_at,
        })
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn produced_at(&self) -> u64 {
        self.produced_at
    }

    /// Last-write-wins ordering between two artifacts of the same kind.
    ///
    /// A later `produced_at` wins. Equal timestamps with different payloads
    /// are ordered by payload so that every participant converges on the
    /// same value whatever order the copies arrive in. Identical artifacts
    /// never supersede each other.
    pub fn supersedes(&self, current: &Artifact) -> bool {
        if self.kind != current.kind {
            return false;
        }
        match self.produced_at.cmp(&current.produced_at) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.payload > current.payload,
        }
    }
}
