//! Per-package orchestration: collect, score, and the compensating index
//! removal for packages that disappeared from the registry.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::fetcher::Fetcher;
use crate::metadata;
use crate::registry::{Registry, RegistryError};
use crate::store::{DocumentStore, Scorer, SearchIndex, StoreError};
use crate::types::{Analysis, Collected, FetchError, PackageDescriptor, PipelineError, ScoreRecord};

/// Terminal result of one pipeline run.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub analysis: Analysis,
    /// Absent when scoring failed; scoring is best-effort and never aborts
    /// the pipeline.
    pub score: Option<ScoreRecord>,
}

/// Sequences one package through collection, storage, and scoring.
///
/// Holds no per-package state; all of it lives in the working directory and
/// the records scoped to one `process` call, so multiple packages can run
/// concurrently on separate invocations.
pub struct Pipeline<R, D, I, S> {
    registry: R,
    fetcher: Fetcher,
    store: D,
    index: I,
    scorer: S,
}

impl<R, D, I, S> Pipeline<R, D, I, S>
where
    R: Registry,
    D: DocumentStore,
    I: SearchIndex,
    S: Scorer,
{
    pub fn new(registry: R, fetcher: Fetcher, store: D, index: I, scorer: S) -> Self {
        Self {
            registry,
            fetcher,
            store,
            index,
            scorer,
        }
    }

    /// Analyzes and scores one package.
    ///
    /// When the package turns out to be gone from the registry, any stale
    /// index entry is removed before the not-found failure is re-raised,
    /// regardless of how the removal itself fares.
    pub async fn process(&self, name: &str) -> Result<ProcessOutcome, PipelineError> {
        let analysis = match self.collect(name).await {
            Ok(analysis) => analysis,
            Err(PipelineError::PackageNotFound(name)) => {
                warn!(package = %name, "package gone from registry, cleaning up index entry");
                if let Err(err) = self.index.remove(&name).await {
                    warn!(package = %name, error = %err, "index cleanup failed");
                }
                return Err(PipelineError::PackageNotFound(name));
            }
            Err(err) => return Err(err),
        };

        let score = self.score(name, &analysis).await;

        Ok(ProcessOutcome { analysis, score })
    }

    /// Scores a previously stored analysis without re-collecting.
    pub async fn process_stored(&self, name: &str) -> Result<ProcessOutcome, PipelineError> {
        let analysis = self.store.get(name).await.map_err(|err| match err {
            StoreError::NotFound(name) => PipelineError::AnalysisNotFound(name),
            other => PipelineError::Store(other.to_string()),
        })?;

        let score = self.score(name, &analysis).await;

        Ok(ProcessOutcome { analysis, score })
    }

    async fn collect(&self, name: &str) -> Result<Analysis, PipelineError> {
        let doc = self.registry.get_document(name).await.map_err(|err| match err {
            RegistryError::PackageNotFound(name) => PipelineError::PackageNotFound(name),
            other => PipelineError::Transport(other.to_string()),
        })?;

        let mut descriptor = PackageDescriptor::from_document(name, &doc);

        // Fresh working directory per invocation; dropped (and deleted) when
        // the collection stage ends, on every exit path
        let workdir =
            tempfile::tempdir().map_err(|err| PipelineError::WorkDir(err.to_string()))?;

        let fetched = self
            .fetcher
            .fetch(&mut descriptor, workdir.path())
            .await
            .map_err(|err| classify_fetch(name, err))?;
        debug!(package = name, dir = %fetched.dir.display(), "archive ready");

        let metadata = metadata::collect(&doc, &descriptor.manifest, Utc::now());
        let analysis = Analysis {
            analyzed_at: Utc::now(),
            collected: Collected { metadata },
        };

        self.store
            .put(name, &analysis)
            .await
            .map_err(|err| PipelineError::Store(err.to_string()))?;

        info!(package = name, "analysis collected");
        Ok(analysis)
    }

    /// Best-effort scoring stage: failures are logged and swallowed, a
    /// package that fails to score still counts as analyzed.
    async fn score(&self, name: &str, analysis: &Analysis) -> Option<ScoreRecord> {
        let score = match self.scorer.score(analysis).await {
            Ok(score) => score,
            Err(err) => {
                warn!(package = name, error = %err, "scoring failed");
                return None;
            }
        };

        if let Err(err) = self.index.put(name, &score).await {
            warn!(package = name, error = %err, "failed to index score");
            return None;
        }

        Some(score)
    }
}

fn classify_fetch(name: &str, err: FetchError) -> PipelineError {
    match err {
        FetchError::ArchiveTooLarge { limit } => PipelineError::ArchiveTooLarge {
            name: name.to_string(),
            limit,
        },
        retryable => PipelineError::Transport(retryable.to_string()),
    }
}
