//! Hexsettle match host: runs self-played matches side by side.

use hexsettle_host::{selfplay, HostConfig, MatchRegistry};
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = HostConfig::from_env();
    info!(?config, "Starting hexsettle host...");

    let registry = MatchRegistry::new(config.queue_capacity);
    let mut matches = JoinSet::new();
    for index in 0..config.matches {
        let handle = registry.create(config.game_config(index))?;
        let seed = config.seed.wrapping_add(index as u64);
        matches.spawn(selfplay::play(handle, seed, config.max_intents));
    }

    let mut failures = 0;
    while let Some(joined) = matches.join_next().await {
        match joined? {
            Ok(report) => {
                println!("{}", serde_json::to_string(&report)?);
                registry.close(report.match_id).await?;
            }
            Err(e) => {
                failures += 1;
                error!("Self-play failed: {}", e);
            }
        }
    }

    info!(matches = config.matches, failures, "All matches done");
    if failures > 0 {
        anyhow::bail!("{} of {} matches failed", failures, config.matches);
    }
    Ok(())
}
