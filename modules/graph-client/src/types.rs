use serde::Deserialize;

/// One page of a paginated feed response: a `data` array plus an optional
/// link to the following page.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct FeedPage<T> {
    #[serde(default)]
    pub data: Vec<T>,
    pub paging: Option<Paging>,
}

/// Pagination block. `next` is an opaque, fully-qualified URL for the next
/// page; absent on the last page.
#[derive(Debug, Clone, Deserialize)]
pub struct Paging {
    pub next: Option<String>,
}

/// Author info nested inside a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAuthor {
    pub name: Option<String>,
}

/// A single comment record as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    #[serde(default)]
    pub id: String,
    pub created_time: Option<String>,
    pub message: Option<String>,
    pub from: Option<RawAuthor>,
}

/// A single page post as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPost {
    #[serde(default)]
    pub id: String,
    pub created_time: Option<String>,
    pub message: Option<String>,
    pub permalink_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_page_with_next_link() {
        let json = r#"{
            "data": [
                {"id": "1_2", "created_time": "2024-05-01T10:00:00+0000",
                 "message": "first", "from": {"name": "Ada"}}
            ],
            "paging": {"next": "https://graph.example.com/v19.0/1_2/comments?after=xyz"}
        }"#;

        let page: FeedPage<RawComment> = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, "1_2");
        assert_eq!(page.data[0].from.as_ref().unwrap().name.as_deref(), Some("Ada"));
        assert!(page.paging.unwrap().next.is_some());
    }

    #[test]
    fn last_page_has_no_paging() {
        let json = r#"{"data": []}"#;
        let page: FeedPage<RawComment> = serde_json::from_str(json).unwrap();
        assert!(page.data.is_empty());
        assert!(page.paging.is_none());
    }

    #[test]
    fn comment_with_missing_fields() {
        let json = r#"{"id": "42"}"#;
        let comment: RawComment = serde_json::from_str(json).unwrap();
        assert_eq!(comment.id, "42");
        assert!(comment.message.is_none());
        assert!(comment.from.is_none());
    }

    #[test]
    fn post_record() {
        let json = r#"{
            "id": "99",
            "created_time": "2024-05-01T08:00:00+0000",
            "message": "announcement",
            "permalink_url": "https://example.com/posts/99"
        }"#;
        let post: RawPost = serde_json::from_str(json).unwrap();
        assert_eq!(post.id, "99");
        assert_eq!(post.permalink_url.as_deref(), Some("https://example.com/posts/99"));
    }
}
