//! Durable marker of the most recently processed comment.
//!
//! A single JSON file holding the last comment id and timestamp. Read once
//! at startup, overwritten after each successful save, survives restarts.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use pagewatch_common::WatchError;

/// Last processed comment id and timestamp. Both fields are absent until
/// the first successful save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollState {
    pub last_comment_id: Option<String>,
    pub last_comment_time: Option<String>,
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read persisted state. A missing, unreadable, or malformed file yields
    /// the empty state; so does a JSON object missing either key.
    pub fn load(&self) -> PollState {
        if !self.path.exists() {
            return PollState::default();
        }
        match self.read() {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Error loading state file, using defaults"
                );
                PollState::default()
            }
        }
    }

    fn read(&self) -> Result<PollState, WatchError> {
        let raw = fs::read_to_string(&self.path)?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        if value.get("last_comment_id").is_none() || value.get("last_comment_time").is_none() {
            warn!(path = %self.path.display(), "State file missing expected keys, using defaults");
            return Ok(PollState::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Atomically overwrite persisted state via a sibling temp file and
    /// rename. Failure is logged and reported through the flag; the caller
    /// keeps running.
    pub fn save(&self, last_comment_id: &str, last_comment_time: &str) -> bool {
        let state = PollState {
            last_comment_id: Some(last_comment_id.to_string()),
            last_comment_time: Some(last_comment_time.to_string()),
        };
        match self.write(&state) {
            Ok(()) => {
                info!(last_comment_id, last_comment_time, "Saved poll state");
                true
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Error saving state");
                false
            }
        }
    }

    fn write(&self, state: &PollState) -> Result<(), WatchError> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(state)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
