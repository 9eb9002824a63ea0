pub mod error;
pub mod types;

pub use error::{GraphError, Result};
pub use types::{FeedPage, Paging, RawAuthor, RawComment, RawPost};

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};
use url::Url;

/// Field selection for comment requests.
const COMMENT_FIELDS: &str = "id,from{name},created_time,message";

/// Field selection for post requests.
const POST_FIELDS: &str = "id,created_time,message,permalink_url";

/// Largest page size the API accepts.
const PAGE_LIMIT: u32 = 100;

/// Timeout for data page requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the lightweight connectivity probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// How pagination reacts to a failed page request.
///
/// Rate-limit responses are handled the same under either policy: sleep for
/// the server-directed delay and retry without consuming an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Abandon on the first failure, keeping whatever was already fetched.
    None,
    /// Sleep `base_delay * attempt` and retry, up to `max_attempts` attempts
    /// per page, then abandon with partial results.
    Linear {
        max_attempts: u32,
        base_delay: Duration,
    },
}

/// Decision for a single failed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryStep {
    Wait { delay: Duration, next_attempt: u32 },
    Abandon,
}

fn retry_step(
    policy: RetryPolicy,
    err: &GraphError,
    attempt: u32,
    rate_limit_fallback: Duration,
) -> RetryStep {
    // Server-directed wait. Does not consume an attempt, so rate-limit
    // retries are unbounded under both policies.
    if let GraphError::RateLimited { retry_after } = err {
        return RetryStep::Wait {
            delay: retry_after.unwrap_or(rate_limit_fallback),
            next_attempt: attempt,
        };
    }

    match policy {
        RetryPolicy::None => RetryStep::Abandon,
        RetryPolicy::Linear {
            max_attempts,
            base_delay,
        } => {
            if attempt < max_attempts {
                RetryStep::Wait {
                    delay: base_delay * attempt,
                    next_attempt: attempt + 1,
                }
            } else {
                RetryStep::Abandon
            }
        }
    }
}

pub struct GraphClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    token: String,
    rate_limit_fallback: Duration,
}

impl GraphClient {
    pub fn new(
        base_url: &str,
        api_version: &str,
        token: String,
        rate_limit_fallback: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            token,
            rate_limit_fallback,
        }
    }

    /// Fetch every comment under an object, oldest first, following the
    /// server's next-page links until absent. With `since`, only comments
    /// created after that instant are requested.
    ///
    /// Never propagates request failures: errors are logged and whatever was
    /// accumulated before the failure is returned.
    pub async fn fetch_comments(
        &self,
        object_id: &str,
        since: Option<DateTime<Utc>>,
        policy: RetryPolicy,
    ) -> Vec<RawComment> {
        let first = match self.comments_url(object_id, since) {
            Ok(url) => url,
            Err(e) => {
                error!(object_id, error = %e, "Could not build comments URL");
                return Vec::new();
            }
        };

        let comments = self.fetch_paged(first, policy, "comments").await;
        info!(count = comments.len(), object_id, "Fetched comments");
        comments
    }

    /// Fetch every post on a page, following next-page links until absent.
    /// Same failure contract as [`fetch_comments`](Self::fetch_comments).
    pub async fn fetch_posts(&self, page_id: &str, policy: RetryPolicy) -> Vec<RawPost> {
        let first = match self.posts_url(page_id) {
            Ok(url) => url,
            Err(e) => {
                error!(page_id, error = %e, "Could not build posts URL");
                return Vec::new();
            }
        };

        let posts = self.fetch_paged(first, policy, "posts").await;
        info!(count = posts.len(), page_id, "Fetched posts");
        posts
    }

    /// Probe the target object with a minimal field selection. The only
    /// client operation whose failure propagates to the caller.
    pub async fn check_connectivity(&self, object_id: &str) -> Result<()> {
        let url = Url::parse_with_params(
            &self.object_path(object_id),
            &[("fields", "id"), ("access_token", self.token.as_str())],
        )?;

        let resp = self.client.get(url).timeout(PROBE_TIMEOUT).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GraphError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }

    /// Walk a paginated feed. Later pages come from the server's opaque
    /// `paging.next` URL verbatim; the query parameters ride along in it.
    async fn fetch_paged<T: DeserializeOwned>(
        &self,
        first_url: Url,
        policy: RetryPolicy,
        what: &'static str,
    ) -> Vec<T> {
        let mut items = Vec::new();
        let mut next = Some(first_url.to_string());
        let mut attempt = 1u32;

        while let Some(url) = next.take() {
            match self.get_page::<T>(&url).await {
                Ok(page) => {
                    debug!(count = page.data.len(), what, "Fetched page");
                    items.extend(page.data);
                    next = page.paging.and_then(|p| p.next);
                    attempt = 1;
                }
                Err(err) => match retry_step(policy, &err, attempt, self.rate_limit_fallback) {
                    RetryStep::Wait { delay, next_attempt } => {
                        warn!(
                            what,
                            attempt,
                            delay_secs = delay.as_secs(),
                            error = %err,
                            "Page request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt = next_attempt;
                        next = Some(url);
                    }
                    RetryStep::Abandon => {
                        error!(what, error = %err, "Abandoning pagination, returning partial results");
                        break;
                    }
                },
            }
        }

        items
    }

    async fn get_page<T: DeserializeOwned>(&self, url: &str) -> Result<FeedPage<T>> {
        let resp = self.client.get(url).timeout(REQUEST_TIMEOUT).send().await?;
        let status = resp.status();

        if status.as_u16() == 429 {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(GraphError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GraphError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let page: FeedPage<T> = resp.json().await?;
        Ok(page)
    }

    fn comments_url(&self, object_id: &str, since: Option<DateTime<Utc>>) -> Result<Url> {
        let mut params = vec![
            ("fields", COMMENT_FIELDS.to_string()),
            ("access_token", self.token.clone()),
            ("limit", PAGE_LIMIT.to_string()),
            ("order", "chronological".to_string()),
        ];
        if let Some(floor) = since {
            params.push(("since", floor.timestamp().to_string()));
        }

        let url = Url::parse_with_params(
            &format!("{}/comments", self.object_path(object_id)),
            &params,
        )?;
        Ok(url)
    }

    fn posts_url(&self, page_id: &str) -> Result<Url> {
        let url = Url::parse_with_params(
            &format!("{}/posts", self.object_path(page_id)),
            &[
                ("fields", POST_FIELDS),
                ("access_token", self.token.as_str()),
                ("limit", PAGE_LIMIT.to_string().as_str()),
            ],
        )?;
        Ok(url)
    }

    fn object_path(&self, object_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn test_client() -> GraphClient {
        GraphClient::new(
            "https://graph.example.com",
            "v19.0",
            "test-token".to_string(),
            Duration::from_secs(5),
        )
    }

    fn query_map(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn comments_url_without_since() {
        let client = test_client();
        let url = client.comments_url("123_456", None).unwrap();

        assert_eq!(url.path(), "/v19.0/123_456/comments");
        let q = query_map(&url);
        assert_eq!(q.get("fields").unwrap(), COMMENT_FIELDS);
        assert_eq!(q.get("limit").unwrap(), "100");
        assert_eq!(q.get("order").unwrap(), "chronological");
        assert!(!q.contains_key("since"), "no floor means no since filter");
    }

    #[test]
    fn comments_url_with_since_uses_epoch_seconds() {
        let client = test_client();
        let floor = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let url = client.comments_url("123_456", Some(floor)).unwrap();

        let q = query_map(&url);
        assert_eq!(q.get("since").unwrap(), &floor.timestamp().to_string());
    }

    #[test]
    fn posts_url_caps_page_size() {
        let client = test_client();
        let url = client.posts_url("123").unwrap();

        assert_eq!(url.path(), "/v19.0/123/posts");
        let q = query_map(&url);
        assert_eq!(q.get("fields").unwrap(), POST_FIELDS);
        assert_eq!(q.get("limit").unwrap(), "100");
    }

    #[test]
    fn rate_limit_waits_server_delay_without_consuming_attempt() {
        let err = GraphError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        let policy = RetryPolicy::Linear {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        };

        let step = retry_step(policy, &err, 2, Duration::from_secs(5));
        assert_eq!(
            step,
            RetryStep::Wait {
                delay: Duration::from_secs(30),
                next_attempt: 2,
            }
        );
    }

    #[test]
    fn rate_limit_without_header_uses_fallback_even_under_none_policy() {
        let err = GraphError::RateLimited { retry_after: None };
        let step = retry_step(RetryPolicy::None, &err, 1, Duration::from_secs(7));
        assert_eq!(
            step,
            RetryStep::Wait {
                delay: Duration::from_secs(7),
                next_attempt: 1,
            }
        );
    }

    #[test]
    fn linear_policy_scales_delay_with_attempt() {
        let err = GraphError::Network("connection reset".to_string());
        let policy = RetryPolicy::Linear {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        };

        let first = retry_step(policy, &err, 1, Duration::from_secs(5));
        assert_eq!(
            first,
            RetryStep::Wait {
                delay: Duration::from_secs(5),
                next_attempt: 2,
            }
        );

        let second = retry_step(policy, &err, 2, Duration::from_secs(5));
        assert_eq!(
            second,
            RetryStep::Wait {
                delay: Duration::from_secs(10),
                next_attempt: 3,
            }
        );
    }

    #[test]
    fn linear_policy_abandons_after_max_attempts() {
        let err = GraphError::Network("connection reset".to_string());
        let policy = RetryPolicy::Linear {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        };

        assert_eq!(
            retry_step(policy, &err, 3, Duration::from_secs(5)),
            RetryStep::Abandon
        );
    }

    #[test]
    fn none_policy_abandons_transport_errors_immediately() {
        let err = GraphError::Network("connection reset".to_string());
        assert_eq!(
            retry_step(RetryPolicy::None, &err, 1, Duration::from_secs(5)),
            RetryStep::Abandon
        );
    }
}
