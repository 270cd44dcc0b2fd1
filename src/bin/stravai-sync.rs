// ABOUTME: CLI for the StravAI sync engine: one-shot, daemon, and verify modes
// ABOUTME: Loads configuration from the environment and wires up the engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # StravAI Sync CLI
//!
//! - `run`: a single sync cycle; non-quota failures exit non-zero, quota
//!   exhaustion exits zero as an expected no-op for scheduled runners
//! - `daemon`: continuous polling with the persisted quota latch
//! - `verify`: force re-analysis of the most recent matching activity

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use stravai::coach::{GeminiCoach, GeminiConfig, RetryBackoffConfig};
use stravai::config::SyncConfig;
use stravai::logging;
use stravai::providers::{StravaClient, StravaConfig};
use stravai::sync::{run_daemon, EngineConfig, QuotaState, QuotaStore, SyncEngine, SyncPolicy};

#[derive(Parser)]
#[command(name = "stravai-sync")]
#[command(about = "StravAI sync engine - AI coaching analysis for Strava activities")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single sync cycle and exit
    Run {
        /// Selection policy for this cycle
        #[arg(long, value_enum, default_value_t = PolicyArg::BatchAll)]
        policy: PolicyArg,
    },
    /// Poll continuously on a fixed interval
    Daemon {
        /// Selection policy for periodic cycles
        #[arg(long, value_enum, default_value_t = PolicyArg::Surgical)]
        policy: PolicyArg,
        /// Polling interval in seconds (overrides SYNC_INTERVAL_SECS)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Force re-analysis of the most recent matching activity
    Verify,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Every unprocessed matching activity in the fetched window
    BatchAll,
    /// Only the single most-recent unprocessed matching activity
    Surgical,
    /// Unprocessed matching activities from the last 24 hours
    Windowed,
}

impl From<PolicyArg> for SyncPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::BatchAll => Self::BatchAll,
            PolicyArg::Surgical => Self::Surgical,
            PolicyArg::Windowed => Self::TimeWindowed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let args = Args::parse();
    let config = SyncConfig::from_env()?;
    info!("{}", config.summary());

    let policy = match &args.command {
        Command::Run { policy } | Command::Daemon { policy, .. } => SyncPolicy::from(*policy),
        Command::Verify => SyncPolicy::Surgical,
    };

    let source = StravaClient::new(StravaConfig::new(config.credentials.clone()));
    let mut coach_config = GeminiConfig::new(config.gemini_api_key.clone())
        .with_retry(RetryBackoffConfig::from_env());
    if let Some(model) = &config.gemini_model {
        coach_config = coach_config.with_model(model.clone());
    }
    let coach = GeminiCoach::new(coach_config);
    let mut engine = SyncEngine::new(
        source,
        coach,
        EngineConfig::from_sync_config(&config, policy),
    );

    match args.command {
        Command::Run { .. } => {
            let mut quota = QuotaState::new();
            match engine.run_cycle(&mut quota).await {
                Ok(outcome) => {
                    info!(
                        fetched = outcome.fetched,
                        updated = outcome.updated,
                        skipped = outcome.skipped,
                        "Sync complete"
                    );
                }
                Err(e) if e.is_quota() => {
                    // Expected under a scheduled runner: the quota resets
                    // tomorrow, so this is a zero-exit no-op
                    warn!(error = %e, "Sync ended early on quota exhaustion");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Daemon { interval_secs, .. } => {
            let interval = interval_secs
                .map(std::time::Duration::from_secs)
                .unwrap_or(config.sync_interval);
            let store = match config.quota_state_path.clone() {
                Some(path) => QuotaStore::new(path),
                None => QuotaStore::new(QuotaStore::default_path()?),
            };
            run_daemon(&mut engine, interval, &store).await;
        }
        Command::Verify => {
            let mut quota = QuotaState::new();
            let id = engine.verify_latest(&mut quota).await?;
            info!(activity = id, "Verification successful");
        }
    }

    Ok(())
}
