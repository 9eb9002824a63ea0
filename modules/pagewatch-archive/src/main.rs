use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use graph_client::{GraphClient, RawComment, RetryPolicy};
use pagewatch_archive::{export, snapshot};
use pagewatch_common::WatchConfig;

/// One-shot snapshot of a page's posts and comments into a CSV table.
#[derive(Parser)]
#[command(name = "pagewatch-archive")]
struct Args {
    /// Output CSV path (defaults to DATA_FILE from the environment).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Page to archive (defaults to PAGE_ID from the environment).
    #[arg(long)]
    page_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("pagewatch_archive=info".parse()?)
                .add_directive("graph_client=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = WatchConfig::archive_from_env();
    config.log_redacted();

    let page_id = args.page_id.unwrap_or_else(|| config.page_id.clone());
    let output = args.output.unwrap_or_else(|| config.data_file.clone());

    info!(page_id = page_id.as_str(), output = %output.display(), "Starting page archive");

    let client = GraphClient::new(
        &config.base_url,
        &config.api_version,
        config.access_token.clone(),
        config.retry_delay,
    );

    let posts = client.fetch_posts(&page_id, RetryPolicy::None).await;
    if posts.is_empty() {
        info!("No posts found, nothing to archive");
        return Ok(());
    }
    let post_count = posts.len();

    let mut comments_by_post: HashMap<String, Vec<RawComment>> = HashMap::new();
    for post in &posts {
        if post.id.is_empty() {
            continue;
        }
        let comments = client
            .fetch_comments(&post.id, None, RetryPolicy::None)
            .await;
        comments_by_post.insert(post.id.clone(), comments);

        // Courtesy pause between posts to stay under the rate limit.
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    let comment_count: usize = comments_by_post.values().map(Vec::len).sum();

    let rows = snapshot::flatten(posts, &comments_by_post);
    export::write_csv(&output, &rows)?;

    info!(
        posts = post_count,
        comments = comment_count,
        rows = rows.len(),
        output = %output.display(),
        "Archive complete"
    );

    Ok(())
}
