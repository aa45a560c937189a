use chrono::Utc;

use crate::config::Config;
use crate::error::StatsError;
use crate::github::GitHubClient;
use crate::github::gist::{HistorySource, PersistOutcome};
use crate::history::TrafficMetric;
use crate::snapshot;

#[derive(Debug)]
pub struct FetchSummary {
    pub total_views: u64,
    pub total_clones: u64,
    pub remote: PersistOutcome,
    pub history_source: HistorySource,
}

/// One fetch cycle: pull current traffic, merge it into the stored history,
/// write the local snapshot and push the merged history back to the gist.
pub async fn run(config: &Config) -> Result<FetchSummary, StatsError> {
    // Checked before anything touches the network.
    config.require_token()?;
    let client = GitHubClient::from_config(config)?;

    tracing::info!("Fetching traffic statistics for {}...", client.repository());

    let views = client.fetch_traffic(TrafficMetric::Views).await?;
    let clones = client.fetch_traffic(TrafficMetric::Clones).await?;

    let gist_id = config.gist_id.as_deref();
    let remote = client.fetch_remote_history(gist_id).await?;
    let mut history = remote.document;
    history.absorb(views, clones, Utc::now());

    snapshot::write_snapshot(&config.paths.snapshot, &history).await?;

    if remote.source == HistorySource::FellBack {
        // The write below replaces whatever the gist holds with this run's
        // samples only.
        tracing::warn!(
            "gist history was unreadable; overwriting gist {} with {} view and {} clone samples",
            gist_id.unwrap_or_default(),
            history.views.len(),
            history.clones.len(),
        );
    }
    let outcome = client.persist_remote(gist_id, &history).await?;

    tracing::info!("Total views: {}", history.total_views);
    tracing::info!("Total clones: {}", history.total_clones);

    Ok(FetchSummary {
        total_views: history.total_views,
        total_clones: history.total_clones,
        remote: outcome,
        history_source: remote.source,
    })
}
