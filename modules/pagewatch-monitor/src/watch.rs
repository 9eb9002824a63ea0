//! The incremental poll loop: fetch, normalize, merge, persist state, sleep.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use graph_client::{GraphClient, RawComment, RetryPolicy};
use pagewatch_common::parse_state_time;

use crate::normalize::normalize_comments;
use crate::sink::CommentSink;
use crate::state::{PollState, StateStore};
use crate::stats::WatchStats;

/// Source of comment batches for the poll loop. Seam between the loop and
/// the HTTP client so cycles are testable with a scripted feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_comments(&self, since: Option<DateTime<Utc>>) -> Vec<RawComment>;
}

/// Live source backed by the Graph API client, pinned to one post.
pub struct GraphFeed {
    client: GraphClient,
    target: String,
    policy: RetryPolicy,
}

impl GraphFeed {
    pub fn new(client: GraphClient, target: String, policy: RetryPolicy) -> Self {
        Self {
            client,
            target,
            policy,
        }
    }
}

#[async_trait]
impl FeedSource for GraphFeed {
    async fn fetch_comments(&self, since: Option<DateTime<Utc>>) -> Vec<RawComment> {
        self.client
            .fetch_comments(&self.target, since, self.policy)
            .await
    }
}

/// Drives one post's comment feed through the fetch → normalize → merge →
/// save-state cycle on a fixed interval, forever.
pub struct Watcher<S: FeedSource> {
    source: S,
    store: StateStore,
    sink: CommentSink,
    state: PollState,
    poll_interval: Duration,
    stats: WatchStats,
}

impl<S: FeedSource> Watcher<S> {
    pub fn new(source: S, store: StateStore, sink: CommentSink, poll_interval: Duration) -> Self {
        let state = store.load();
        if let Some(id) = state.last_comment_id.as_deref() {
            info!(last_comment_id = id, "Resuming from persisted state");
        }
        Self {
            source,
            store,
            sink,
            state,
            poll_interval,
            stats: WatchStats::default(),
        }
    }

    /// Run cycles until interrupted. Ctrl-C lands during the sleep or at a
    /// cycle await point; file writes are synchronous, so cancellation never
    /// leaves a partial write.
    pub async fn run(&mut self) {
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping monitor");
                    return;
                }
                _ = self.cycle_then_sleep() => {}
            }
        }
    }

    async fn cycle_then_sleep(&mut self) {
        self.run_cycle().await;
        info!(
            wait_secs = self.poll_interval.as_secs(),
            "Waiting for next check"
        );
        tokio::time::sleep(self.poll_interval).await;
    }

    /// One Fetching → Processing → Saving pass.
    pub async fn run_cycle(&mut self) {
        self.stats.cycles += 1;
        info!(cycle = self.stats.cycles, "Checking for new comments");

        let raw = self.source.fetch_comments(self.since_floor()).await;
        self.stats.comments_fetched += raw.len() as u32;
        if raw.is_empty() {
            info!("No new comments found");
            return;
        }

        let rows = normalize_comments(raw);
        self.stats.rows_normalized += rows.len() as u32;
        if rows.is_empty() {
            info!("No comments survived normalization");
            return;
        }

        let outcome = self.sink.merge(rows);
        self.stats.rows_appended += outcome.appended as u32;
        self.stats.duplicates_skipped += outcome.duplicates as u32;

        if let Some((last_id, last_time)) = outcome.last {
            if !self.store.save(&last_id, &last_time) {
                self.stats.state_save_failures += 1;
            }
            self.state.last_comment_id = Some(last_id);
            self.state.last_comment_time = Some(last_time);
        }
    }

    /// Derive the since filter from stored state. An unparseable stored
    /// timestamp falls back to a full fetch, same as a fresh start.
    fn since_floor(&self) -> Option<DateTime<Utc>> {
        let raw = self.state.last_comment_time.as_deref()?;
        match parse_state_time(raw) {
            Some(floor) => Some(floor),
            None => {
                warn!(raw, "Invalid stored timestamp, fetching full history");
                None
            }
        }
    }

    pub fn stats(&self) -> &WatchStats {
        &self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct EmptyFeed;

    #[async_trait]
    impl FeedSource for EmptyFeed {
        async fn fetch_comments(&self, _since: Option<DateTime<Utc>>) -> Vec<RawComment> {
            Vec::new()
        }
    }

    fn watcher_with_state(dir: &TempDir, time: Option<&str>) -> Watcher<EmptyFeed> {
        let store = StateStore::new(dir.path().join("state.json"));
        if let Some(t) = time {
            assert!(store.save("1", t));
        }
        Watcher::new(
            EmptyFeed,
            store,
            CommentSink::new(dir.path().join("table.csv")),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn since_floor_from_display_format_state() {
        let dir = TempDir::new().unwrap();
        let watcher = watcher_with_state(&dir, Some("2024-05-01 10:30:00"));
        assert_eq!(
            watcher.since_floor(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn no_state_means_no_since_floor() {
        let dir = TempDir::new().unwrap();
        let watcher = watcher_with_state(&dir, None);
        assert_eq!(watcher.since_floor(), None);
    }

    #[test]
    fn invalid_state_time_means_full_fetch() {
        let dir = TempDir::new().unwrap();
        let watcher = watcher_with_state(&dir, Some("not a time"));
        assert_eq!(watcher.since_floor(), None);
    }
}
