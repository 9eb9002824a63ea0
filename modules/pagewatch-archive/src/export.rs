//! CSV export of snapshot rows.

use std::fs;
use std::path::Path;

use tracing::info;

use pagewatch_common::WatchError;

use crate::snapshot::ArchiveRow;

/// Write all rows in one pass, creating the parent directory if missing.
/// Each run is a full snapshot; any existing file is replaced.
pub fn write_csv(path: &Path, rows: &[ArchiveRow]) -> Result<(), WatchError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(rows = rows.len(), path = %path.display(), "Snapshot written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::RowKind;
    use tempfile::TempDir;

    fn row(kind: RowKind, id: &str) -> ArchiveRow {
        ArchiveRow {
            kind,
            id: id.to_string(),
            author: "Page".to_string(),
            time: "2024-05-01 08:00:00".to_string(),
            content: "hello".to_string(),
            url: String::new(),
            parent_id: String::new(),
            parent_content: String::new(),
        }
    }

    #[test]
    fn writes_wide_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.csv");

        write_csv(&path, &[row(RowKind::Post, "p1"), row(RowKind::Comment, "c1")]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Type,ID,Author,Time,Content,URL,Parent ID,Parent Content"
        );
        assert!(lines.next().unwrap().starts_with("Post,p1,"));
        assert!(lines.next().unwrap().starts_with("Comment,c1,"));
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/snapshot.csv");

        write_csv(&path, &[row(RowKind::Post, "p1")]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_snapshot_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.csv");

        write_csv(&path, &[]).unwrap();
        assert!(path.exists());
    }
}
