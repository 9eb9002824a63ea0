use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

/// Application configuration loaded from environment variables.
///
/// The access token has no default of any kind; startup fails without it.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    // Target
    pub page_id: String,
    pub post_id: String,
    pub access_token: String,

    // API endpoint
    pub base_url: String,
    pub api_version: String,

    // Polling and retries
    pub poll_interval: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,

    // Output files
    pub data_file: PathBuf,
    pub state_file: PathBuf,
}

impl WatchConfig {
    /// Load configuration for the incremental monitor.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            page_id: required_env("PAGE_ID"),
            post_id: required_env("POST_ID"),
            access_token: required_env("PAGE_ACCESS_TOKEN"),
            base_url: env_or("GRAPH_BASE_URL", "https://graph.facebook.com"),
            api_version: env_or("GRAPH_API_VERSION", "v19.0"),
            poll_interval: Duration::from_secs(env_u64_or("POLL_INTERVAL_SECS", 5)),
            max_retries: env_u64_or("MAX_RETRIES", 3) as u32,
            retry_delay: Duration::from_secs(env_u64_or("RETRY_DELAY_SECS", 5)),
            data_file: PathBuf::from(env_or("DATA_FILE", "./page_comments.csv")),
            state_file: PathBuf::from(env_or("STATE_FILE", "./last_comment_state.json")),
        }
    }

    /// Load a minimal config for the one-shot archiver (no post target, no
    /// state file needed).
    pub fn archive_from_env() -> Self {
        Self {
            page_id: required_env("PAGE_ID"),
            post_id: env::var("POST_ID").unwrap_or_default(),
            access_token: required_env("PAGE_ACCESS_TOKEN"),
            base_url: env_or("GRAPH_BASE_URL", "https://graph.facebook.com"),
            api_version: env_or("GRAPH_API_VERSION", "v19.0"),
            poll_interval: Duration::from_secs(env_u64_or("POLL_INTERVAL_SECS", 60)),
            max_retries: env_u64_or("MAX_RETRIES", 3) as u32,
            retry_delay: Duration::from_secs(env_u64_or("RETRY_DELAY_SECS", 5)),
            data_file: PathBuf::from(env_or("DATA_FILE", "./page_posts_comments.csv")),
            state_file: PathBuf::new(),
        }
    }

    /// Log the loaded configuration with the token redacted.
    pub fn log_redacted(&self) {
        info!(
            page_id = self.page_id.as_str(),
            post_id = self.post_id.as_str(),
            base_url = self.base_url.as_str(),
            api_version = self.api_version.as_str(),
            poll_interval_secs = self.poll_interval.as_secs(),
            max_retries = self.max_retries,
            retry_delay_secs = self.retry_delay.as_secs(),
            data_file = %self.data_file.display(),
            state_file = %self.state_file.display(),
            "Configuration loaded (token redacted)"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64_or(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number, got {raw:?}")),
        Err(_) => default,
    }
}
