use anyhow::Context;

use traffic_stats::config::Config;
use traffic_stats::render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    traffic_stats::startup::init();

    let config = Config::load()?;
    render::run(&config)
        .await
        .context("failed to render traffic graphs")?;
    Ok(())
}
