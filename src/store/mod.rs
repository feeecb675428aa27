//! External collaborators of the pipeline: the document store holding
//! analysis records, the search index holding score records, and the scorer.
//!
//! The pipeline only depends on the traits; the HTTP-backed implementations
//! here make the CLI runnable end to end.

mod couch;
mod elastic;
mod scorer;

pub use couch::CouchStore;
pub use elastic::ElasticIndex;
pub use scorer::HttpScorer;

use std::future::Future;

use thiserror::Error;

use crate::types::{Analysis, ScoreRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistent store of analysis documents, keyed by package name.
pub trait DocumentStore: Send + Sync {
    fn get(&self, name: &str) -> impl Future<Output = Result<Analysis, StoreError>> + Send;

    fn put(
        &self,
        name: &str,
        analysis: &Analysis,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Search index of score records, keyed by package name.
pub trait SearchIndex: Send + Sync {
    fn put(
        &self,
        name: &str,
        score: &ScoreRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removing a name that is not indexed is not an error.
    fn remove(&self, name: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// External scoring service. The scoring model itself lives elsewhere; the
/// pipeline only hands over an analysis and takes back a score record.
pub trait Scorer: Send + Sync {
    fn score(
        &self,
        analysis: &Analysis,
    ) -> impl Future<Output = Result<ScoreRecord, StoreError>> + Send;
}
