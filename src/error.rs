/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building a hook or sending a record.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("client configuration has no region")]
    MissingRegion,

    #[error("client configuration has no behavior version")]
    MissingBehaviorVersion,

    #[cfg(feature = "kinesis")]
    #[error("kinesis put record failed: {0}")]
    PutRecord(#[from] aws_sdk_kinesis::Error),

    #[error("record sink failed: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("no tokio runtime available to drive record writes")]
    NoRuntime,

    #[error("failed to install global subscriber: {0}")]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}

impl Error {
    /// Wrap an arbitrary sink failure.
    pub fn sink(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Sink(err.into())
    }
}
