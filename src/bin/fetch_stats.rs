use anyhow::Context;

use traffic_stats::config::Config;
use traffic_stats::fetch;
use traffic_stats::github::gist::PersistOutcome;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    traffic_stats::startup::init();

    let config = Config::load()?;
    let summary = fetch::run(&config)
        .await
        .context("failed to update traffic statistics")?;

    if let PersistOutcome::Created { id } = &summary.remote {
        // Stdout so the id can be captured by the calling workflow.
        println!("GIST_ID={id}");
    }
    tracing::info!("Stats updated successfully! (gist {})", summary.remote.id());
    Ok(())
}
