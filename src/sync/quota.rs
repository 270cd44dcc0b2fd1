// ABOUTME: Daily AI-quota latch with JSON persistence for daemon restarts
// ABOUTME: Once tripped on a calendar day, analysis stays off until the date changes
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::errors::{SyncError, SyncResult};

/// State file name under the platform data directory
const QUOTA_STATE_FILE: &str = "quota_state.json";

/// The quota circuit-breaker latch: a flag plus the calendar day it was set.
///
/// Injected into the orchestrator at cycle start and persisted after, rather
/// than living in ambient global state. Invariant: while `tripped_on` equals
/// the current date, no analysis call is attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    tripped_on: Option<NaiveDate>,
}

impl QuotaState {
    /// Fresh, untripped state
    #[must_use]
    pub const fn new() -> Self {
        Self { tripped_on: None }
    }

    /// Whether the latch blocks analysis for `today`
    #[must_use]
    pub fn is_tripped(&self, today: NaiveDate) -> bool {
        self.tripped_on == Some(today)
    }

    /// The day the latch was set, if any
    #[must_use]
    pub const fn tripped_on(&self) -> Option<NaiveDate> {
        self.tripped_on
    }

    /// Latch analysis off for the rest of `today`
    pub fn trip(&mut self, today: NaiveDate) {
        warn!(%today, "AI quota exhausted; no further analysis calls until the date changes");
        self.tripped_on = Some(today);
    }

    /// Clear the latch when the calendar date has rolled over.
    ///
    /// Returns whether the latch was cleared.
    pub fn clear_if_rolled_over(&mut self, today: NaiveDate) -> bool {
        match self.tripped_on {
            Some(day) if day != today => {
                info!(tripped_on = %day, %today, "Quota latch cleared after date rollover");
                self.tripped_on = None;
                true
            }
            _ => false,
        }
    }
}

/// File-backed persistence for [`QuotaState`] across daemon restarts
#[derive(Debug, Clone)]
pub struct QuotaStore {
    path: PathBuf,
}

impl QuotaStore {
    /// Store backed by the given file path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the platform data directory
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no platform data directory exists.
    pub fn default_path() -> SyncResult<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("stravai").join(QUOTA_STATE_FILE))
            .ok_or_else(|| SyncError::Config("no platform data directory available".into()))
    }

    /// The backing file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state. A missing file yields the default state; a
    /// corrupt file is logged and treated as default rather than killing the
    /// daemon.
    #[must_use]
    pub fn load(&self) -> QuotaState {
        match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), "Discarding corrupt quota state file: {e}");
                QuotaState::new()
            }),
            Err(_) => QuotaState::new(),
        }
    }

    /// Persist the state, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the file cannot be written.
    pub fn store(&self, state: &QuotaState) -> SyncResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(state)
            .map_err(|e| SyncError::Config(format!("failed to encode quota state: {e}")))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn latch_blocks_only_the_day_it_tripped() {
        let mut state = QuotaState::new();
        assert!(!state.is_tripped(day(1)));

        state.trip(day(1));
        assert!(state.is_tripped(day(1)));
        assert!(!state.is_tripped(day(2)));
    }

    #[test]
    fn rollover_clears_the_latch() {
        let mut state = QuotaState::new();
        state.trip(day(1));

        assert!(!state.clear_if_rolled_over(day(1)));
        assert!(state.is_tripped(day(1)));

        assert!(state.clear_if_rolled_over(day(2)));
        assert_eq!(state, QuotaState::new());
    }
}
