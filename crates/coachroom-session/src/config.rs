use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_max_duration_secs() -> u64 {
    200
}

fn default_connect_timeout_secs() -> u64 {
    20
}

fn default_require_artifact() -> bool {
    true
}

/// Session bounds and start policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Hard upper bound on time spent in the active state.
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,

    /// How long a room connection may take before the session ends.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Refuse to start until a summary artifact is known.
    #[serde(default = "default_require_artifact")]
    pub require_artifact: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            require_artifact: default_require_artifact(),
        }
    }
}

impl SessionConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
