use serde::Deserialize;
use std::fmt;

/// Default model used for CV summaries.
pub const DEFAULT_SUMMARY_MODEL: &str = "claude-haiku-4-5";

/// Largest document accepted for summarisation (10 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

fn default_model() -> String {
    DEFAULT_SUMMARY_MODEL.to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_max_document_bytes() -> usize {
    DEFAULT_MAX_DOCUMENT_BYTES
}

fn default_max_summary_bytes() -> usize {
    coachroom_types::MAX_ARTIFACT_PAYLOAD_BYTES
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Settings for the summary extractor and its Anthropic client.
#[derive(Clone, Deserialize)]
pub struct SummaryConfig {
    /// Anthropic API key. Empty disables summarisation.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Documents above this size are rejected without calling the service.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
    /// Summaries are truncated to this many bytes.
    #[serde(default = "default_max_summary_bytes")]
    pub max_summary_bytes: usize,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            max_document_bytes: default_max_document_bytes(),
            max_summary_bytes: default_max_summary_bytes(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_document_bytes", &self.max_document_bytes)
            .field("max_summary_bytes", &self.max_summary_bytes)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl SummaryConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}
