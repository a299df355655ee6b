use crate::config::SummaryConfig;
use crate::error::{ExtractError, UpstreamError, ValidationError};
use async_trait::async_trait;
use coachroom_types::{now_millis, Artifact};
use std::sync::Arc;
use tracing::{debug, info};

/// MIME types accepted as documents.
pub const ACCEPTED_DOCUMENT_TYPES: &[&str] = &["application/pdf"];

/// Fixed instructions sent alongside every document.
pub const SUMMARY_INSTRUCTIONS: &str = "You are a professional career coach reviewing a CV. \
Write a concise summary covering:

1. Professional identity (current role or title)
2. Years of experience and key domains
3. The top 3-5 technical skills or areas of expertise
4. Career goals or aspirations, if mentioned
5. Notable achievements or distinguishing qualities

Keep the summary under 200 words. An AI career coach will use it to personalise a live conversation.";

/// A single generation call: instructions plus one attached document.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub instructions: &'a str,
    pub attachment: &'a [u8],
    pub media_type: &'a str,
}

/// External text generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the service's text response for `request`.
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, UpstreamError>;
}

/// Turns an uploaded document into a summary artifact.
#[derive(Clone)]
pub struct SummaryExtractor {
    generator: Arc<dyn TextGenerator>,
    max_document_bytes: usize,
    max_summary_bytes: usize,
}

impl SummaryExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &SummaryConfig) -> Self {
        Self {
            generator,
            max_document_bytes: config.max_document_bytes,
            max_summary_bytes: config.max_summary_bytes,
        }
    }

    pub fn max_document_bytes(&self) -> usize {
        self.max_document_bytes
    }

    /// Checks type and size without contacting the service.
    pub fn validate(&self, document: &[u8], mime_type: &str) -> Result<(), ValidationError> {
        let essence = media_type_essence(mime_type);
        if !ACCEPTED_DOCUMENT_TYPES.contains(&essence.as_str()) {
            return Err(ValidationError::UnsupportedType(essence));
        }
        if document.is_empty() {
            return Err(ValidationError::Empty);
        }
        if document.len() > self.max_document_bytes {
            return Err(ValidationError::TooLarge {
                size: document.len(),
                limit: self.max_document_bytes,
            });
        }
        Ok(())
    }

    /// Validates `document`, asks the generator for a summary, and wraps the
    /// (possibly truncated) text in an [`Artifact`].
    ///
    /// # Errors
    ///
    /// [`ExtractError::Validation`] for bad input, in which case the
    /// generator is never called. [`ExtractError::Upstream`] when the call
    /// fails or yields only whitespace.
    pub async fn extract(&self, document: &[u8], mime_type: &str) -> Result<Artifact, ExtractError> {
        self.validate(document, mime_type)?;
        let media_type = media_type_essence(mime_type);

        debug!(bytes = document.len(), media_type = %media_type, "requesting document summary");
        let text = self
            .generator
            .generate(&GenerationRequest {
                instructions: SUMMARY_INSTRUCTIONS,
                attachment: document,
                media_type: &media_type,
            })
            .await?;

        let artifact = Artifact::summary_bounded(&text, now_millis(), self.max_summary_bytes)
            .ok_or(UpstreamError::EmptyResponse)?;
        if artifact.payload().len() < text.trim().len() {
            info!(
                original_bytes = text.len(),
                kept_bytes = artifact.payload().len(),
                "summary truncated to payload bound"
            );
        }
        Ok(artifact)
    }
}

/// Lowercased type/subtype with any parameters stripped.
fn media_type_essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
