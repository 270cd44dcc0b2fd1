// ABOUTME: Cycle state machine: fetch, select per policy, analyze, write back
// ABOUTME: Continues or aborts on failure per policy; quota errors trip the latch
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::coach::CoachClient;
use crate::config::SyncConfig;
use crate::errors::{SyncError, SyncResult};
use crate::events::{CycleStats, EventKind, EventLog};
use crate::formatter::{append_report, format_report, strip_prior_report};
use crate::models::{Activity, GoalSettings};
use crate::providers::ActivitySource;
use crate::sync::quota::QuotaState;

/// Hours covered by the time-windowed selection policy
pub const TIME_WINDOW_HOURS: i64 = 24;

/// Which activities a cycle selects for analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Every unprocessed matching activity in the fetched window
    BatchAll,
    /// Only the single most-recent unprocessed matching activity
    Surgical,
    /// Unprocessed matching activities started within the last 24 hours
    TimeWindowed,
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BatchAll => "batch-all",
            Self::Surgical => "surgical",
            Self::TimeWindowed => "windowed",
        };
        f.write_str(label)
    }
}

impl FromStr for SyncPolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "batch-all" => Ok(Self::BatchAll),
            "surgical" => Ok(Self::Surgical),
            "windowed" => Ok(Self::TimeWindowed),
            other => Err(SyncError::Config(format!("unknown sync policy: {other}"))),
        }
    }
}

/// Engine configuration for one deployment
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Selection policy for periodic cycles
    pub policy: SyncPolicy,
    /// Category processed by the engine; everything else is ignored entirely
    pub activity_filter: String,
    /// Activities fetched per cycle
    pub fetch_depth: usize,
    /// Athlete goals passed to the coach
    pub goals: GoalSettings,
}

impl EngineConfig {
    /// Configuration with the default filter and depth
    #[must_use]
    pub fn new(policy: SyncPolicy, goals: GoalSettings) -> Self {
        Self {
            policy,
            activity_filter: "Run".into(),
            fetch_depth: 20,
            goals,
        }
    }

    /// Derive engine configuration from process configuration
    #[must_use]
    pub fn from_sync_config(config: &SyncConfig, policy: SyncPolicy) -> Self {
        Self {
            policy,
            activity_filter: config.activity_filter.clone(),
            fetch_depth: config.fetch_depth,
            goals: config.goals.clone(),
        }
    }
}

/// Counters for one completed cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Activities fetched from the source
    pub fetched: usize,
    /// Activities matching the category filter
    pub matching: usize,
    /// Activities updated with a new report
    pub updated: usize,
    /// Activities skipped after a per-activity failure
    pub skipped: usize,
}

/// The sync orchestrator.
///
/// Drives one cycle at a time: fetch, select per policy, analyze each target,
/// format, write back. The quota latch is injected per cycle; on a quota
/// error the engine trips it and aborts, and while it is set for the current
/// day a cycle performs zero analysis calls.
pub struct SyncEngine<S, C> {
    source: S,
    coach: C,
    config: EngineConfig,
    events: EventLog,
    stats: CycleStats,
}

impl<S: ActivitySource, C: CoachClient> SyncEngine<S, C> {
    /// Create an engine over an activity source and a coach
    pub fn new(source: S, coach: C, config: EngineConfig) -> Self {
        Self {
            source,
            coach,
            config,
            events: EventLog::new(),
            stats: CycleStats::default(),
        }
    }

    /// The narration stream recorded so far
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Counters accumulated across cycles
    #[must_use]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Run one sync cycle under the given quota latch.
    ///
    /// # Errors
    ///
    /// Fetch failures and quota exhaustion abort the cycle. Per-activity
    /// failures abort only under the surgical policy; batch policies log,
    /// skip, and continue.
    pub async fn run_cycle(&mut self, quota: &mut QuotaState) -> SyncResult<CycleOutcome> {
        let now = Utc::now();
        let today = now.date_naive();
        quota.clear_if_rolled_over(today);
        if quota.is_tripped(today) {
            self.events.record(
                EventKind::Info,
                "AI quota exhausted for today; skipping analysis until the date changes",
            );
            return Ok(CycleOutcome::default());
        }

        self.events.record(
            EventKind::Info,
            format!(
                "Sync pulse ({} policy, history depth: {})",
                self.config.policy, self.config.fetch_depth
            ),
        );

        let activities = match self
            .source
            .list_recent_activities(self.config.fetch_depth)
            .await
        {
            Ok(activities) => activities,
            Err(e) => {
                self.events
                    .record(EventKind::Error, format!("Activity fetch failed: {e}"));
                return Err(e);
            }
        };
        self.stats.cycles += 1;
        self.stats.last_run = Some(now);

        let mut outcome = CycleOutcome {
            fetched: activities.len(),
            ..CycleOutcome::default()
        };

        let runs: Vec<Activity> = activities
            .into_iter()
            .filter(|a| a.activity_type == self.config.activity_filter)
            .collect();
        outcome.matching = runs.len();

        let targets = self.select_targets(&runs, now);
        if targets.is_empty() {
            self.events
                .record(EventKind::Info, "No unprocessed activities to analyze");
            return Ok(outcome);
        }
        debug!(targets = targets.len(), "Selected activities for analysis");

        for activity in targets {
            match self.process_one(&activity, &runs, false).await {
                Ok(()) => outcome.updated += 1,
                Err(e) if e.is_quota() => {
                    quota.trip(today);
                    self.events
                        .record(EventKind::Error, format!("Cycle aborted: {e}"));
                    return Err(e);
                }
                Err(e) => {
                    self.events.record(
                        EventKind::Error,
                        format!("Failed to process \"{}\": {e}", activity.name),
                    );
                    if self.config.policy == SyncPolicy::Surgical {
                        return Err(e);
                    }
                    outcome.skipped += 1;
                }
            }
        }

        self.events.record(
            EventKind::Info,
            format!("Sync cycle complete: {} updated", outcome.updated),
        );
        Ok(outcome)
    }

    /// Force re-analysis of the single most-recent matching activity,
    /// bypassing the idempotency marker and stripping prior AI content.
    ///
    /// Used for on-demand verification, never for the periodic cycle.
    ///
    /// # Errors
    ///
    /// Aborts on any failure, including exhausted retries; quota exhaustion
    /// additionally trips the latch.
    pub async fn verify_latest(&mut self, quota: &mut QuotaState) -> SyncResult<u64> {
        let now = Utc::now();
        let today = now.date_naive();
        quota.clear_if_rolled_over(today);
        if quota.is_tripped(today) {
            let err = SyncError::QuotaExhausted {
                message: "daily quota latch is set".into(),
            };
            self.events
                .record(EventKind::Error, format!("Verification refused: {err}"));
            return Err(err);
        }

        self.events
            .record(EventKind::Info, "Starting deployment verification");

        let activities = match self
            .source
            .list_recent_activities(self.config.fetch_depth)
            .await
        {
            Ok(activities) => activities,
            Err(e) => {
                self.events
                    .record(EventKind::Error, format!("Activity fetch failed: {e}"));
                return Err(e);
            }
        };

        let runs: Vec<Activity> = activities
            .into_iter()
            .filter(|a| a.activity_type == self.config.activity_filter)
            .collect();

        let Some(latest) = runs.first().cloned() else {
            let err = SyncError::NoMatchingActivity(self.config.activity_filter.clone());
            self.events
                .record(EventKind::Error, format!("Verification failed: {err}"));
            return Err(err);
        };

        self.events.record(
            EventKind::Ai,
            format!("Forcing re-analysis of latest activity: {}", latest.name),
        );

        match self.process_one(&latest, &runs, true).await {
            Ok(()) => {
                self.events.record(
                    EventKind::Success,
                    format!("Verification successful: activity {} updated", latest.id),
                );
                Ok(latest.id)
            }
            Err(e) => {
                if e.is_quota() {
                    quota.trip(today);
                }
                self.events
                    .record(EventKind::Error, format!("Verification failed: {e}"));
                Err(e)
            }
        }
    }

    /// Apply the selection policy over the matching activities
    fn select_targets(&self, runs: &[Activity], now: DateTime<Utc>) -> Vec<Activity> {
        match self.config.policy {
            SyncPolicy::BatchAll => runs.iter().filter(|a| !a.is_processed()).cloned().collect(),
            SyncPolicy::Surgical => runs
                .iter()
                .find(|a| !a.is_processed())
                .cloned()
                .into_iter()
                .collect(),
            SyncPolicy::TimeWindowed => runs
                .iter()
                .filter(|a| {
                    !a.is_processed()
                        && now.signed_duration_since(a.start_date)
                            <= Duration::hours(TIME_WINDOW_HOURS)
                })
                .cloned()
                .collect(),
        }
    }

    /// Analyze one activity and write the report back.
    ///
    /// The history context is every other matching activity from this fetch.
    /// In the force path any prior AI block is stripped before appending.
    async fn process_one(
        &mut self,
        activity: &Activity,
        all_matching: &[Activity],
        force: bool,
    ) -> SyncResult<()> {
        self.events.record(
            EventKind::Ai,
            format!("Analyzing \"{}\"...", activity.name),
        );

        let history: Vec<Activity> = all_matching
            .iter()
            .filter(|a| a.id != activity.id)
            .cloned()
            .collect();

        let analysis = self
            .coach
            .analyze(activity, &history, &self.config.goals)
            .await?;
        let report = format_report(&analysis);

        let new_description = if force {
            let kept = strip_prior_report(activity.description.as_deref().unwrap_or(""));
            if kept.is_empty() {
                report
            } else {
                format!("{kept}\n\n{report}")
            }
        } else {
            append_report(activity.description.as_deref(), &report)
        };

        self.source
            .update_activity_description(activity.id, &new_description)
            .await?;

        self.stats.updated += 1;
        self.events.record(
            EventKind::Success,
            format!("AI coach updated activity {}", activity.id),
        );
        Ok(())
    }
}
