//! Flattening of posts and their comments into wide snapshot rows.

use std::collections::HashMap;

use serde::Serialize;

use graph_client::{RawComment, RawPost};
use pagewatch_common::{normalize_display_time, NO_TEXT_PLACEHOLDER, UNKNOWN_AUTHOR};

/// Parent post text is clipped to this many characters in comment rows.
const PARENT_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKind {
    Post,
    Comment,
}

/// One row of the snapshot table. Posts and comments share the schema; the
/// parent columns are populated only for comments.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveRow {
    #[serde(rename = "Type")]
    pub kind: RowKind,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Parent ID")]
    pub parent_id: String,
    #[serde(rename = "Parent Content")]
    pub parent_content: String,
}

/// Flatten posts and their comments, preserving feed order: each post row
/// is followed immediately by its comment rows.
pub fn flatten(
    posts: Vec<RawPost>,
    comments_by_post: &HashMap<String, Vec<RawComment>>,
) -> Vec<ArchiveRow> {
    let mut rows = Vec::new();

    for post in posts {
        let post_url = post.permalink_url.clone().unwrap_or_default();
        let content = post
            .message
            .clone()
            .unwrap_or_else(|| NO_TEXT_PLACEHOLDER.to_string());
        let preview = parent_preview(&content);

        rows.push(ArchiveRow {
            kind: RowKind::Post,
            id: post.id.clone(),
            author: "Page".to_string(),
            time: display_time(post.created_time.as_deref()),
            content,
            url: post_url.clone(),
            parent_id: String::new(),
            parent_content: String::new(),
        });

        for comment in comments_by_post.get(&post.id).into_iter().flatten() {
            rows.push(comment_row(comment, &post.id, &post_url, &preview));
        }
    }

    rows
}

fn comment_row(
    comment: &RawComment,
    post_id: &str,
    post_url: &str,
    parent_preview: &str,
) -> ArchiveRow {
    ArchiveRow {
        kind: RowKind::Comment,
        id: comment.id.clone(),
        author: comment
            .from
            .as_ref()
            .and_then(|author| author.name.clone())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        time: display_time(comment.created_time.as_deref()),
        content: comment
            .message
            .clone()
            .unwrap_or_else(|| NO_TEXT_PLACEHOLDER.to_string()),
        url: format!("{post_url}?comment_id={}", comment.id),
        parent_id: post_id.to_string(),
        parent_content: parent_preview.to_string(),
    }
}

/// First characters of the parent post text, suffixed with an ellipsis.
/// Clips on character boundaries, so multi-byte text never splits.
fn parent_preview(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    let clipped: String = content.chars().take(PARENT_PREVIEW_CHARS).collect();
    format!("{clipped}...")
}

fn display_time(raw: Option<&str>) -> String {
    raw.and_then(normalize_display_time).unwrap_or_default()
}
