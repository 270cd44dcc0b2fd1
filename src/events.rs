// ABOUTME: Leveled narration stream and cycle counters emitted by the orchestrator
// ABOUTME: Mirrors every event into tracing and retains a bounded in-memory tail
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Event Stream
//!
//! The orchestrator narrates each cycle through [`EventLog`]: timestamped,
//! leveled messages describing progress. Events are mirrored into `tracing`
//! for CLI/daemon consumers and retained in a bounded buffer for embedding
//! consumers that render status directly.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{error, info};

/// Most recent events retained in the in-memory buffer
const EVENT_BUFFER_CAPACITY: usize = 100;

/// Severity/category of a narration event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Routine progress
    Info,
    /// A completed write-back
    Success,
    /// A failure (always at least one per failure path)
    Error,
    /// An AI analysis step
    Ai,
}

/// One timestamped narration event
#[derive(Debug, Clone, Serialize)]
pub struct SyncEvent {
    /// When the event was recorded
    pub at: DateTime<Utc>,
    /// Severity/category
    pub kind: EventKind,
    /// Human-readable message
    pub message: String,
}

/// Bounded narration buffer, newest events last
#[derive(Debug, Default)]
pub struct EventLog {
    events: VecDeque<SyncEvent>,
}

impl EventLog {
    /// Create an empty event log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, mirroring it into tracing
    pub fn record(&mut self, kind: EventKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            EventKind::Info => info!("{message}"),
            EventKind::Success => info!(kind = "success", "{message}"),
            EventKind::Ai => info!(kind = "ai", "{message}"),
            EventKind::Error => error!("{message}"),
        }
        if self.events.len() == EVENT_BUFFER_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(SyncEvent {
            at: Utc::now(),
            kind,
            message,
        });
    }

    /// Retained events, oldest first
    pub fn recent(&self) -> impl Iterator<Item = &SyncEvent> {
        self.events.iter()
    }

    /// Number of retained events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events have been retained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Accumulated counters across cycles
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CycleStats {
    /// Completed fetch cycles
    pub cycles: u64,
    /// Activities updated with a coaching report
    pub updated: u64,
    /// When the last cycle ran
    pub last_run: Option<DateTime<Utc>>,
}
