// ABOUTME: Timer-driven daemon loop running one sync cycle per tick
// ABOUTME: Persists the quota latch around each cycle and shuts down between cycles
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::coach::CoachClient;
use crate::providers::ActivitySource;
use crate::sync::engine::SyncEngine;
use crate::sync::quota::QuotaStore;

/// Run sync cycles on a fixed interval until a shutdown signal arrives.
///
/// Exactly one cycle is in flight at a time: each tick awaits its cycle
/// inline, so a cycle outlasting the interval delays the next tick instead
/// of overlapping it. The shutdown signal is observed only between cycles,
/// so an in-flight cycle always runs to completion. The quota latch is
/// loaded once at startup and persisted after every cycle, surviving daemon
/// restarts.
///
/// Per-cycle failures are logged and the loop continues; the quota latch
/// keeps later cycles from attempting analysis for the rest of the day.
pub async fn run_daemon<S: ActivitySource, C: CoachClient>(
    engine: &mut SyncEngine<S, C>,
    interval: Duration,
    store: &QuotaStore,
) {
    let mut quota = store.load();

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(
        interval_secs = interval.as_secs(),
        quota_state = %store.path().display(),
        "Sync daemon started"
    );

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                match result {
                    Ok(()) => info!("Shutdown signal received; stopping sync daemon"),
                    Err(e) => error!(error = %e, "Shutdown signal handler failed; stopping sync daemon"),
                }
                break;
            }
            _ = ticker.tick() => {
                match engine.run_cycle(&mut quota).await {
                    Ok(outcome) => {
                        if outcome.updated > 0 || outcome.skipped > 0 {
                            info!(
                                updated = outcome.updated,
                                skipped = outcome.skipped,
                                "Sync cycle finished"
                            );
                        }
                    }
                    Err(e) if e.is_quota() => {
                        warn!("Cycles continue without AI calls until the date changes");
                    }
                    Err(e) => {
                        error!(error = %e, "Sync cycle failed; retrying on next tick");
                    }
                }
                if let Err(e) = store.store(&quota) {
                    error!(error = %e, "Failed to persist quota state");
                }
            }
        }
    }
}
