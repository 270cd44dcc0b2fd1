// ABOUTME: Main library entry point for the StravAI coaching sync engine
// ABOUTME: Wires activity source, AI coach, report formatting, and the sync orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![deny(unsafe_code)]

//! # StravAI Sync
//!
//! A headless sync engine that watches a Strava account for new running
//! activities, asks a generative AI coach for a structured training analysis,
//! and writes the formatted report back into the activity description.
//!
//! ## Features
//!
//! - **Idempotent selection**: processed activities carry a sentinel marker
//!   in their description and are never analyzed twice
//! - **Selection policies**: batch-all, surgical single-activity, and
//!   24-hour windowed batch, plus an on-demand force/verify path
//! - **Quota circuit breaker**: a hard AI-quota error latches analysis off
//!   for the rest of the calendar day, persisted across daemon restarts
//! - **Retry with backoff**: transient AI failures retry with capped
//!   exponential backoff, honoring upstream retry hints
//!
//! ## Architecture
//!
//! - **Providers**: the Strava activity source behind the [`providers::ActivitySource`] trait
//! - **Coach**: the Gemini analysis client behind the [`coach::CoachClient`] trait
//! - **Formatter**: deterministic report rendering with the idempotency marker
//! - **Sync**: the cycle state machine, quota latch, and daemon scheduler
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use stravai::config::SyncConfig;
//! use stravai::errors::SyncResult;
//!
//! fn main() -> SyncResult<()> {
//!     let config = SyncConfig::from_env()?;
//!     println!("{}", config.summary());
//!     Ok(())
//! }
//! ```

/// Coaching analysis client (Gemini) with retry, backoff, and quota tagging
pub mod coach;
/// Environment-driven process configuration
pub mod config;
/// Unified error taxonomy for sync operations
pub mod errors;
/// Leveled narration stream emitted by the orchestrator
pub mod events;
/// Report formatting with the idempotency marker
pub mod formatter;
/// Logging configuration and structured logging setup
pub mod logging;
/// Domain data model shared across components
pub mod models;
/// Activity source client (Strava)
pub mod providers;
/// Sync orchestrator, quota latch, and daemon scheduler
pub mod sync;
