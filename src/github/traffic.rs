use reqwest::StatusCode;
use serde_json::{Map, Value};

use super::{GitHubClient, ensure_success};
use crate::error::StatsError;
use crate::history::{TrafficMetric, TrafficSample};

impl GitHubClient {
    /// Fetch the daily samples the API currently exposes for `metric`
    /// (roughly the last two weeks).
    ///
    /// A 404 means the repository has no traffic recorded yet and yields an
    /// empty series. Any other non-success status is an error.
    pub async fn fetch_traffic(
        &self,
        metric: TrafficMetric,
    ) -> Result<Vec<TrafficSample>, StatsError> {
        let endpoint = metric.endpoint();
        let url = self.url(&format!("repos/{}/traffic/{endpoint}", self.repository));

        let response = self.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!("No {endpoint} data available yet (new repository)");
            return Ok(Vec::new());
        }
        let response = ensure_success(response, endpoint).await?;

        let mut body: Map<String, Value> = response.json().await?;
        let samples: Vec<TrafficSample> = match body.remove(endpoint) {
            Some(list) => serde_json::from_value(list)?,
            None => Vec::new(),
        };

        tracing::debug!("fetched {} {endpoint} samples", samples.len());
        Ok(samples)
    }
}
