// ABOUTME: Environment-variable configuration for credentials, goals, and sync tuning
// ABOUTME: Presence checks only; values pass through to the clients unvalidated
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Environment Configuration
//!
//! All process configuration is environment-driven: the OAuth credential
//! triple (or a manual access token), the Gemini API key, the athlete's goal
//! fields, and sync tuning knobs. Read once at startup; the core performs
//! presence checks only and passes values through unchanged.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::errors::{SyncError, SyncResult};
use crate::models::GoalSettings;

/// Default number of activities fetched per cycle
const DEFAULT_FETCH_DEPTH: usize = 20;

/// Default daemon polling interval in seconds
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60;

/// Default activity category processed by the engine
const DEFAULT_ACTIVITY_FILTER: &str = "Run";

/// Strava OAuth credentials: a long-lived refresh triple and/or a manually
/// supplied short-lived access token.
#[derive(Debug, Clone, Default)]
pub struct StravaCredentials {
    /// OAuth client ID
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// Long-lived refresh token
    pub refresh_token: Option<String>,
    /// Manually supplied access token, used as-is until rejected
    pub access_token: Option<String>,
}

impl StravaCredentials {
    /// Whether the full id/secret/refresh triple is configured
    #[must_use]
    pub const fn has_refresh_triple(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.refresh_token.is_some()
    }

    /// Presence check: either a manual token or the full triple.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AuthConfiguration`] when neither is available.
    pub fn ensure_usable(&self) -> SyncResult<()> {
        if self.has_refresh_triple() || self.access_token.is_some() {
            Ok(())
        } else {
            Err(SyncError::AuthConfiguration(
                "missing Strava OAuth credentials (client id / client secret / refresh token) \
                 and no manual access token supplied"
                    .into(),
            ))
        }
    }
}

/// Complete process configuration for the sync engine
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Strava credentials
    pub credentials: StravaCredentials,
    /// Gemini API key
    pub gemini_api_key: String,
    /// Gemini model override, if any
    pub gemini_model: Option<String>,
    /// Athlete goal fields passed through to the prompt
    pub goals: GoalSettings,
    /// Activity category the engine processes; everything else is ignored
    pub activity_filter: String,
    /// Number of recent activities fetched per cycle
    pub fetch_depth: usize,
    /// Daemon polling interval
    pub sync_interval: Duration,
    /// Override for the persisted quota-state file location
    pub quota_state_path: Option<PathBuf>,
}

impl SyncConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error when neither Strava credential form is present, when
    /// the Gemini API key is missing, or when a numeric knob fails to parse.
    pub fn from_env() -> SyncResult<Self> {
        info!("Loading configuration from environment variables");

        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {e}");
        }

        let credentials = StravaCredentials {
            client_id: env_opt("STRAVA_CLIENT_ID"),
            client_secret: env_opt("STRAVA_CLIENT_SECRET"),
            refresh_token: env_opt("STRAVA_REFRESH_TOKEN"),
            access_token: env_opt("STRAVA_ACCESS_TOKEN"),
        };
        credentials.ensure_usable()?;

        let gemini_api_key = env_opt("GEMINI_API_KEY").ok_or_else(|| {
            SyncError::Config("GEMINI_API_KEY environment variable not set".into())
        })?;

        let goals = GoalSettings {
            race_type: env_var_or("GOAL_RACE_TYPE", "Marathon"),
            race_date: env_var_or("GOAL_RACE_DATE", "Not Set"),
            goal_time: env_var_or("GOAL_RACE_TIME", "Finish"),
        };

        let fetch_depth = parse_env("FETCH_DEPTH", DEFAULT_FETCH_DEPTH)?;
        let interval_secs = parse_env("SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS)?;

        Ok(Self {
            credentials,
            gemini_api_key,
            gemini_model: env_opt("GEMINI_MODEL"),
            goals,
            activity_filter: env_var_or("ACTIVITY_FILTER", DEFAULT_ACTIVITY_FILTER),
            fetch_depth,
            sync_interval: Duration::from_secs(interval_secs),
            quota_state_path: env_opt("QUOTA_STATE_PATH").map(PathBuf::from),
        })
    }

    /// Configuration summary for startup logging, without secrets
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "StravAI Sync Configuration:\n\
             - Strava auth: {}\n\
             - Goal: {} on {} (target: {})\n\
             - Activity filter: {}\n\
             - Fetch depth: {}\n\
             - Sync interval: {}s",
            if self.credentials.has_refresh_triple() {
                "refresh token"
            } else {
                "manual access token"
            },
            self.goals.race_type,
            self.goals.race_date,
            self.goals.goal_time,
            self.activity_filter,
            self.fetch_depth,
            self.sync_interval.as_secs(),
        )
    }
}

/// Read an env var, treating empty values as unset
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Read an env var with a default fallback
fn env_var_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_owned())
}

/// Parse a numeric env var, falling back to a default when unset
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> SyncResult<T> {
    match env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| SyncError::Config(format!("invalid {name} value: {raw}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_triple_requires_all_three_fields() {
        let mut creds = StravaCredentials {
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            refresh_token: None,
            access_token: None,
        };
        assert!(!creds.has_refresh_triple());
        assert!(creds.ensure_usable().is_err());

        creds.refresh_token = Some("refresh".into());
        assert!(creds.has_refresh_triple());
        assert!(creds.ensure_usable().is_ok());
    }

    #[test]
    fn manual_token_alone_is_usable() {
        let creds = StravaCredentials {
            access_token: Some("token".into()),
            ..StravaCredentials::default()
        };
        assert!(creds.ensure_usable().is_ok());
    }
}
