//! Failure taxonomy for archive fetching and pipeline orchestration.

use thiserror::Error;

/// Errors from the archive fetcher.
///
/// The only unrecoverable case is a size-ceiling breach; everything else is
/// safe for the caller to retry with the same descriptor, since no partial
/// state survives a failed fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("archive exceeds maximum size of {limit} bytes")]
    ArchiveTooLarge { limit: u64 },

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Unrecoverable failures must not be requeued; the package is
    /// unprocessable until the ceiling configuration changes.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, FetchError::ArchiveTooLarge { .. })
    }
}

/// Terminal failure of one pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The package is gone from the registry. The orchestrator removes any
    /// stale index entry before surfacing this.
    #[error("package not found: {0}")]
    PackageNotFound(String),

    /// Archive crossed the configured size ceiling. Must not be retried.
    #[error("archive for {name} exceeds maximum size of {limit} bytes")]
    ArchiveTooLarge { name: String, limit: u64 },

    /// Network or upstream failure. Retry and backoff belong to the caller.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("failed to prepare working directory: {0}")]
    WorkDir(String),

    #[error("store error: {0}")]
    Store(String),

    /// Score-only run requested but no analysis document exists.
    #[error("no analysis stored for {0}")]
    AnalysisNotFound(String),
}

impl PipelineError {
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, PipelineError::ArchiveTooLarge { .. })
    }
}
