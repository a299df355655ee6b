//! Document summarisation for coachroom sessions.
//!
//! A participant uploads a document (a CV) before the session starts. The
//! [`SummaryExtractor`] validates it, hands it to an external text
//! generation service behind the [`TextGenerator`] seam, and returns a
//! bounded [`Artifact`](coachroom_types::Artifact) that can be broadcast to
//! the room.
//!
//! The production generator is [`AnthropicClient`], which calls the
//! Anthropic Messages API with the document attached as a base64 content
//! block. No retries happen here; a failed call surfaces as
//! [`UpstreamError`] and the caller decides what to do.

pub mod anthropic;
pub mod config;
pub mod error;
pub mod extractor;

pub use anthropic::AnthropicClient;
pub use config::{SummaryConfig, DEFAULT_MAX_DOCUMENT_BYTES, DEFAULT_SUMMARY_MODEL};
pub use error::{ExtractError, UpstreamError, ValidationError};
pub use extractor::{
    GenerationRequest, SummaryExtractor, TextGenerator, ACCEPTED_DOCUMENT_TYPES,
    SUMMARY_INSTRUCTIONS,
};
