//! Client for the external scoring service.

use reqwest::Client;

use super::{Scorer, StoreError};
use crate::types::{Analysis, ScoreRecord};

/// Posts the analysis record to a scoring service and takes back the score.
pub struct HttpScorer {
    client: Client,
    base_url: String,
}

impl HttpScorer {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Scorer for HttpScorer {
    async fn score(&self, analysis: &Analysis) -> Result<ScoreRecord, StoreError> {
        let response = self
            .client
            .post(format!("{}/score", self.base_url))
            .json(analysis)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
