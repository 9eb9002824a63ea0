//! CSV sink for the incremental comment table.
//!
//! The sink is the sole writer of the table file. A merge dedups by id
//! against everything already on disk, then rewrites the whole file through
//! a temp-file rename so a crash mid-write never leaves a torn table.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use tracing::{error, info};

use pagewatch_common::{normalize_display_time, CommentRow, WatchError};

/// Outcome of one merge. `last` carries the id and display timestamp of the
/// final appended row; `None` when every incoming row was already present.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub appended: usize,
    pub duplicates: usize,
    pub last: Option<(String, String)>,
}

impl MergeOutcome {
    fn nothing_new(duplicates: usize) -> Self {
        Self {
            appended: 0,
            duplicates,
            last: None,
        }
    }
}

pub struct CommentSink {
    path: PathBuf,
}

impl CommentSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Merge rows into the table, skipping ids already present and
    /// canonicalizing timestamps for display. The file is only touched when
    /// something new remains. I/O failures are logged; the cycle's write is
    /// abandoned and the caller keeps running.
    pub fn merge(&self, rows: Vec<CommentRow>) -> MergeOutcome {
        if rows.is_empty() {
            info!("No new comments to save");
            return MergeOutcome::nothing_new(0);
        }
        match self.merge_inner(rows) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Error saving comment table");
                MergeOutcome::nothing_new(0)
            }
        }
    }

    fn merge_inner(&self, rows: Vec<CommentRow>) -> Result<MergeOutcome, WatchError> {
        let existing = self.load_existing()?;
        let seen: HashSet<&str> = existing.iter().map(|row| row.id.as_str()).collect();

        let incoming = rows.len();
        let fresh: Vec<CommentRow> = rows
            .into_iter()
            .filter(|row| !seen.contains(row.id.as_str()))
            .map(|mut row| {
                row.time = normalize_display_time(&row.time).unwrap_or_default();
                row
            })
            .collect();

        if fresh.is_empty() {
            info!("No new comments after duplicate check");
            return Ok(MergeOutcome::nothing_new(incoming));
        }

        let last = fresh.last().map(|row| (row.id.clone(), row.time.clone()));
        let appended = fresh.len();
        let duplicates = incoming - appended;

        self.write_all(existing.iter().chain(fresh.iter()))?;
        info!(
            appended,
            duplicates,
            path = %self.path.display(),
            "Saved new comments"
        );

        Ok(MergeOutcome {
            appended,
            duplicates,
            last,
        })
    }

    fn load_existing(&self) -> Result<Vec<CommentRow>, WatchError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            rows.push(record?);
        }
        Ok(rows)
    }

    fn write_all<'a>(
        &self,
        rows: impl Iterator<Item = &'a CommentRow>,
    ) -> Result<(), WatchError> {
        let tmp = self.path.with_extension("tmp");
        let mut writer = csv::Writer::from_path(&tmp)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        drop(writer);
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
