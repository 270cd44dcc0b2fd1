// ABOUTME: Sync orchestrator module: cycle engine, quota latch, daemon scheduler
// ABOUTME: Selects activities per policy and drives source, coach, and formatter
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Sync Orchestrator
//!
//! A cycle walks `Fetching -> Selecting -> Analyzing -> Writing` per target
//! activity, with a parallel quota latch: once the AI quota trips on a given
//! calendar day, every later cycle that day performs zero analysis calls.

/// Daemon scheduler driving cycles on a fixed interval
pub mod daemon;
/// Cycle state machine and selection policies
pub mod engine;
/// Daily quota latch and its persistence
pub mod quota;

pub use daemon::run_daemon;
pub use engine::{CycleOutcome, EngineConfig, SyncEngine, SyncPolicy};
pub use quota::{QuotaState, QuotaStore};
