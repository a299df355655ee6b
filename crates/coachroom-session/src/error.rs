use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A listener tried to write to the store while being notified.
    #[error("session store written from inside a change notification")]
    Reentrant,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a session is already live")]
    AlreadyLive,

    #[error("a summary must be available before the session can start")]
    ArtifactRequired,

    #[error("no async runtime to drive the session")]
    NoRuntime,

    #[error("invalid session target: {0}")]
    InvalidTarget(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
