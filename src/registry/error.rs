//! Registry client errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("package not found: {0}")]
    PackageNotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected document shape for {0}")]
    InvalidDocument(String),
}
