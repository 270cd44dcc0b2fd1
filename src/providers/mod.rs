// ABOUTME: Activity source abstraction and the Strava implementation
// ABOUTME: Defines the async trait seam the sync engine is tested against
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Activity Source Providers
//!
//! The sync engine talks to its activity source through [`ActivitySource`],
//! keeping the orchestrator testable against in-memory fakes. The production
//! implementation is [`StravaClient`].

use async_trait::async_trait;

use crate::errors::SyncResult;
use crate::models::Activity;

/// Strava activity source client
pub mod strava;

pub use strava::{StravaClient, StravaConfig};

/// Contract for fetching activities and writing back descriptions
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Return up to `limit` most-recent activities, newest first.
    ///
    /// # Errors
    ///
    /// Returns auth, permission, transport, or upstream errors per the
    /// response mapping of the concrete client.
    async fn list_recent_activities(&mut self, limit: usize) -> SyncResult<Vec<Activity>>;

    /// Overwrite the stored description for one activity.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`ActivitySource::list_recent_activities`].
    async fn update_activity_description(&mut self, id: u64, description: &str) -> SyncResult<()>;
}
