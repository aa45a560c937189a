use anyhow::Context;

use traffic_stats::config::Config;
use traffic_stats::readme;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    traffic_stats::startup::init();

    let config = Config::load()?;
    readme::run(&config)
        .await
        .with_context(|| format!("failed to update {}", config.paths.readme.display()))?;
    Ok(())
}
