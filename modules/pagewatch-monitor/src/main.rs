use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use graph_client::{GraphClient, RetryPolicy};
use pagewatch_common::WatchConfig;
use pagewatch_monitor::sink::CommentSink;
use pagewatch_monitor::state::StateStore;
use pagewatch_monitor::watch::{GraphFeed, Watcher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("pagewatch_monitor=info".parse()?)
                .add_directive("graph_client=info".parse()?),
        )
        .init();

    info!("Page comment monitor starting...");

    // Load config
    let config = WatchConfig::from_env();
    config.log_redacted();

    let client = GraphClient::new(
        &config.base_url,
        &config.api_version,
        config.access_token.clone(),
        config.retry_delay,
    );
    let target = format!("{}_{}", config.page_id, config.post_id);

    // Startup precondition: the target must be reachable before looping.
    client
        .check_connectivity(&target)
        .await
        .context("Cannot reach target post; check credentials and network")?;
    info!(target = target.as_str(), "API connectivity check passed");

    let policy = RetryPolicy::Linear {
        max_attempts: config.max_retries,
        base_delay: config.retry_delay,
    };
    let feed = GraphFeed::new(client, target, policy);
    let mut watcher = Watcher::new(
        feed,
        StateStore::new(&config.state_file),
        CommentSink::new(&config.data_file),
        config.poll_interval,
    );

    watcher.run().await;
    info!("{}", watcher.stats());

    Ok(())
}
