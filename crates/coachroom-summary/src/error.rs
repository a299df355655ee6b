use thiserror::Error;

/// Input rejected before any external call is made. Messages are shown to
/// the end user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No file provided")]
    Empty,

    #[error("Only PDF files are supported")]
    UnsupportedType(String),

    #[error("File size must be less than {}MB", .limit / (1024 * 1024))]
    TooLarge { size: usize, limit: usize },
}

/// The text generation service failed or returned nothing usable.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("text generation service is not configured")]
    NotConfigured,

    #[error("request to text generation service failed: {0}")]
    Request(String),

    #[error("text generation service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("text generation service returned no text")]
    EmptyResponse,
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
