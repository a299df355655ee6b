//! Shared types and wire constants for the coachroom workspace.
//!
//! Every other crate depends on `coachroom-types` for the artifact model,
//! the envelope that carries it over a room's data channel, audience
//! addressing, and the session lifecycle states. Keeping these here stops
//! the transport, session, and HTTP crates from depending on each other
//! just to share a struct.

pub mod artifact;
pub mod envelope;

pub use artifact::{Artifact, ArtifactKind, MAX_ARTIFACT_PAYLOAD_BYTES};
pub use envelope::{DecodeError, Decoded, Envelope, CV_SUMMARY_TOPIC, CV_SUMMARY_TYPE};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lifecycle of a single session entity.
///
/// `Ended` is terminal: a new session is a new entity that starts at
/// `Connecting` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No session has been started yet.
    Idle,
    /// A room connection is being established.
    Connecting,
    /// The room connection is live.
    Active,
    /// The session was torn down.
    Ended,
}

impl LifecycleState {
    /// Returns `true` while the session holds (or is acquiring) a room handle.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Active)
    }

    /// Returns the string label for this state.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

/// Who a broadcast is addressed to.
///
/// `All` resolves against room membership at send time. `Targets` names
/// participant identities explicitly; an empty target set addresses nobody
/// and is rejected by publishers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Audience {
    #[default]
    All,
    Targets(BTreeSet<String>),
}

impl Audience {
    /// Builds an explicit audience from participant identities.
    pub fn targets<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Targets(identities.into_iter().map(Into::into).collect())
    }

    /// Returns `true` if a participant with `identity` is addressed.
    pub fn includes(&self, identity: &str) -> bool {
        match self {
            Self::All => true,
            Self::Targets(set) => set.contains(identity),
        }
    }

    /// Returns `true` for an explicit audience with no identities.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Targets(set) if set.is_empty())
    }

    /// Destination identity list in LiveKit's convention, where an empty
    /// list means every participant.
    pub fn destination_identities(&self) -> Vec<String> {
        match self {
            Self::All => Vec::new(),
            Self::Targets(set) => set.iter().cloned().collect(),
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Truncates `text` to at most `max_bytes` bytes without splitting a UTF-8
/// character.
pub fn truncate_utf8(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_states() {
        assert!(!LifecycleState::Idle.is_live());
        assert!(LifecycleState::Connecting.is_live());
        assert!(LifecycleState::Active.is_live());
        assert!(!LifecycleState::Ended.is_live());
    }

    #[test]
    fn audience_all_maps_to_empty_destinations() {
        assert!(Audience::All.destination_identities().is_empty());
        assert!(Audience::All.includes("anyone"));
        assert!(!Audience::All.is_empty());
    }

    #[test]
    fn audience_targets_are_explicit() {
        let audience = Audience::targets(["agent", "alice"]);
        assert!(audience.includes("agent"));
        assert!(!audience.includes("bob"));
        assert_eq!(
            audience.destination_identities(),
            vec!["agent".to_string(), "alice".to_string()]
        );
        assert!(Audience::targets(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_utf8("hello", 10), "hello");
        assert_eq!(truncate_utf8("hello", 3), "hel");
        // 'é' is two bytes; cutting at 2 would split it.
        assert_eq!(truncate_utf8("aé", 2), "a");
        assert_eq!(truncate_utf8("", 0), "");
    }

    #[test]
    fn lifecycle_serializes_snake_case() {
        let json = serde_json::to_string(&LifecycleState::Connecting).unwrap();
        assert_eq!(json, "\"connecting\"");
    }
}
