//! Process command - analyze and score a single package.

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::fetcher::Fetcher;
use crate::pipeline::Pipeline;
use crate::registry::NpmRegistry;
use crate::store::{CouchStore, ElasticIndex, HttpScorer};
use crate::types::PipelineError;

#[derive(Args)]
pub struct ProcessCmd {
    /// Package name to process
    pub package: String,

    /// Skip collection and score the stored analysis instead
    #[arg(long)]
    pub no_analyze: bool,

    /// Registry endpoint serving package documents
    #[arg(long, env = "PKGA_REGISTRY_URL", default_value = "https://registry.npmjs.org")]
    pub registry_url: String,

    /// CouchDB database holding analysis documents
    #[arg(long, env = "PKGA_COUCHDB_URL", default_value = "http://127.0.0.1:5984/pkg-analyzer")]
    pub couchdb_url: String,

    /// Elasticsearch index holding score records
    #[arg(long, env = "PKGA_ELASTICSEARCH_URL", default_value = "http://127.0.0.1:9200/pkg-analyzer")]
    pub elasticsearch_url: String,

    /// Scoring service endpoint
    #[arg(long, env = "PKGA_SCORER_URL", default_value = "http://127.0.0.1:9000")]
    pub scorer_url: String,

    /// Maximum archive size in bytes
    #[arg(long, env = "PKGA_MAX_ARCHIVE_SIZE", default_value_t = crate::fetcher::DEFAULT_MAX_ARCHIVE_SIZE)]
    pub max_archive_size: u64,
}

impl ProcessCmd {
    pub async fn run(&self) -> Result<()> {
        let pipeline = Pipeline::new(
            NpmRegistry::with_base_url(self.registry_url.clone()),
            Fetcher::with_max_archive_size(self.max_archive_size),
            CouchStore::new(&self.couchdb_url),
            ElasticIndex::new(&self.elasticsearch_url),
            HttpScorer::new(&self.scorer_url),
        );

        let result = if self.no_analyze {
            pipeline.process_stored(&self.package).await
        } else {
            pipeline.process(&self.package).await
        };
        let outcome = result.map_err(into_report)?;

        info!(analysis = %serde_json::to_string(&outcome.analysis)?, "analyze data");
        if let Some(score) = &outcome.score {
            info!(score = %serde_json::to_string(score)?, "score data");
        }

        Ok(())
    }
}

/// Unrecoverable failures are flagged so the surrounding scheduling layer
/// knows not to requeue the package; everything else is fair to retry.
fn into_report(err: PipelineError) -> anyhow::Error {
    if err.is_unrecoverable() {
        anyhow::Error::new(err).context("unrecoverable failure, do not requeue this package")
    } else {
        anyhow::Error::new(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecoverable_failures_are_flagged() {
        let err = into_report(PipelineError::ArchiveTooLarge {
            name: "big-module".to_string(),
            limit: 100,
        });
        assert!(format!("{err:#}").contains("do not requeue"));
    }

    #[test]
    fn test_retryable_failures_pass_through() {
        let err = into_report(PipelineError::Transport("connection reset".to_string()));
        assert!(!format!("{err:#}").contains("do not requeue"));
        assert!(format!("{err:#}").contains("connection reset"));
    }
}
