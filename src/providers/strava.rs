// ABOUTME: Strava API integration for activity listing and description write-back
// ABOUTME: Handles bearer-token installation and machine-to-machine refresh renewal
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ActivitySource;
use crate::config::StravaCredentials;
use crate::errors::{SyncError, SyncResult};
use crate::models::Activity;

/// Error-body bytes kept when building an upstream error message
const MAX_ERROR_BODY_LEN: usize = 500;

/// Configuration for Strava API integration
#[derive(Debug, Clone)]
pub struct StravaConfig {
    /// API base URL
    pub base_url: String,
    /// Token-issuance endpoint for the refresh-token grant
    pub token_url: String,
    /// OAuth credentials
    pub credentials: StravaCredentials,
}

impl StravaConfig {
    /// Configuration against the public Strava API
    #[must_use]
    pub fn new(credentials: StravaCredentials) -> Self {
        Self {
            base_url: "https://www.strava.com/api/v3".into(),
            token_url: "https://www.strava.com/oauth/token".into(),
            credentials,
        }
    }

    /// Override the API base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the token-issuance URL
    #[must_use]
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }
}

/// Strava activity source client
pub struct StravaClient {
    client: Client,
    config: StravaConfig,
    access_token: Option<String>,
}

impl StravaClient {
    /// Create a client; a manually supplied access token is installed directly
    #[must_use]
    pub fn new(config: StravaConfig) -> Self {
        let access_token = config.credentials.access_token.clone();
        Self {
            client: Client::new(),
            config,
            access_token,
        }
    }

    /// Install a directly supplied access token. No validation.
    pub fn set_bearer_token(&mut self, token: impl Into<String>) {
        self.access_token = Some(token.into());
    }

    /// Exchange the refresh credential for a fresh access token.
    ///
    /// With a refresh triple configured this always re-issues, since access
    /// tokens expire faster than the daemon polling interval. Without one, a
    /// manually supplied token is kept as-is.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AuthConfiguration`] when neither a manual token
    /// nor the full credential triple is available, or the mapped upstream
    /// error when the token endpoint rejects the exchange.
    pub async fn refresh_auth(&mut self) -> SyncResult<()> {
        let credentials = &self.config.credentials;
        if !credentials.has_refresh_triple() {
            if self.access_token.is_some() {
                warn!("No refresh credentials configured; relying on the supplied access token");
                return Ok(());
            }
            return Err(SyncError::AuthConfiguration(
                "missing Strava OAuth credentials (client id / client secret / refresh token) \
                 and no manual access token supplied"
                    .into(),
            ));
        }

        // has_refresh_triple() guarantees all three are present
        let request = TokenRefreshRequest {
            client_id: credentials.client_id.as_deref().unwrap_or_default(),
            client_secret: credentials.client_secret.as_deref().unwrap_or_default(),
            refresh_token: credentials.refresh_token.as_deref().unwrap_or_default(),
            grant_type: "refresh_token",
        };

        let response = self
            .client
            .post(&self.config.token_url)
            .json(&request)
            .send()
            .await?;

        let response = Self::check_response(response, "token refresh").await?;
        let token: TokenRefreshResponse = response.json().await?;
        self.access_token = Some(token.access_token);
        info!("Strava access token refreshed");
        Ok(())
    }

    /// Map non-success responses into the sync error taxonomy
    async fn check_response(
        response: reqwest::Response,
        operation: &str,
    ) -> SyncResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_else(|e| {
            warn!("Failed to read error response body: {e}");
            "unable to read error response".into()
        });
        let body = truncate(&body, MAX_ERROR_BODY_LEN);

        Err(match status.as_u16() {
            401 => SyncError::AuthExpired(format!(
                "Strava rejected the token during {operation} (401). \
                 Re-authorize or supply a fresh access token. {body}"
            )),
            403 => SyncError::Permission(format!(
                "Strava refused {operation} (403). The token needs the \
                 activity:read_all scope. {body}"
            )),
            code => SyncError::upstream(code, format!("Strava {operation} failed: {body}")),
        })
    }

    /// Ensure a usable bearer token before an API call.
    ///
    /// Re-issues whenever a refresh triple is configured; otherwise requires
    /// a cached manual token.
    async fn ensure_token(&mut self) -> SyncResult<String> {
        if self.access_token.is_none() || self.config.credentials.has_refresh_triple() {
            self.refresh_auth().await?;
        }
        self.access_token.clone().ok_or_else(|| {
            SyncError::AuthConfiguration("no access token available after refresh".into())
        })
    }
}

#[async_trait]
impl ActivitySource for StravaClient {
    async fn list_recent_activities(&mut self, limit: usize) -> SyncResult<Vec<Activity>> {
        let token = self.ensure_token().await?;

        let url = format!("{}/athlete/activities", self.config.base_url);
        debug!(%url, limit, "Fetching recent activities");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(&[("per_page", limit.to_string())])
            .send()
            .await?;

        let response = Self::check_response(response, "activity listing").await?;
        let activities: Vec<StravaActivity> = response.json().await?;

        debug!(count = activities.len(), "Fetched activities from Strava");
        Ok(activities.into_iter().map(Into::into).collect())
    }

    async fn update_activity_description(&mut self, id: u64, description: &str) -> SyncResult<()> {
        // Listing already refreshed this cycle's token; only recover from a
        // missing one here
        if self.access_token.is_none() {
            self.refresh_auth().await?;
        }
        let token = self.access_token.clone().ok_or_else(|| {
            SyncError::AuthConfiguration("no access token available after refresh".into())
        })?;

        let url = format!("{}/activities/{id}", self.config.base_url);
        let request = UpdateActivityRequest {
            description,
            name: None,
        };

        let response = self
            .client
            .put(&url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?;

        Self::check_response(response, "activity update").await?;
        debug!(id, "Updated activity description");
        Ok(())
    }
}

/// Clip an error body for log-friendly messages
fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_owned()
    } else {
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < max)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}...", &text[..cut])
    }
}

#[derive(Debug, Serialize)]
struct TokenRefreshRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenRefreshResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct UpdateActivityRequest<'a> {
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct StravaActivity {
    id: u64,
    name: String,
    #[serde(rename = "type")]
    activity_type: String,
    start_date: DateTime<Utc>,
    distance: Option<f64>,
    moving_time: Option<u64>,
    total_elevation_gain: Option<f64>,
    average_heartrate: Option<f32>,
    max_heartrate: Option<f32>,
    average_speed: Option<f64>,
    max_speed: Option<f64>,
    description: Option<String>,
    kilojoules: Option<f64>,
}

impl From<StravaActivity> for Activity {
    fn from(raw: StravaActivity) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            activity_type: raw.activity_type,
            start_date: raw.start_date,
            distance: raw.distance.unwrap_or_default(),
            moving_time: raw.moving_time.unwrap_or_default(),
            total_elevation_gain: raw.total_elevation_gain.unwrap_or_default(),
            average_heartrate: raw.average_heartrate,
            max_heartrate: raw.max_heartrate,
            average_speed: raw.average_speed,
            max_speed: raw.max_speed,
            description: raw.description,
            kilojoules: raw.kilojoules,
        }
    }
}
