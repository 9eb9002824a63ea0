//! Raw API records into flat table rows.

use graph_client::RawComment;
use pagewatch_common::{CommentRow, NO_TEXT_PLACEHOLDER, UNKNOWN_AUTHOR};

/// Map raw comments into rows, preserving input order. Records whose id
/// trims to empty are dropped; missing text and author get placeholders.
pub fn normalize_comments(raw: Vec<RawComment>) -> Vec<CommentRow> {
    raw.into_iter().filter_map(normalize_comment).collect()
}

fn normalize_comment(comment: RawComment) -> Option<CommentRow> {
    let id = comment.id.trim();
    if id.is_empty() {
        return None;
    }
    Some(CommentRow {
        id: id.to_string(),
        name: comment
            .from
            .and_then(|author| author.name)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        time: comment.created_time.unwrap_or_default(),
        message: comment
            .message
            .unwrap_or_else(|| NO_TEXT_PLACEHOLDER.to_string()),
    })
}
