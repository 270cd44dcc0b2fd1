// ABOUTME: Google Gemini coaching client with schema-enforced JSON output
// ABOUTME: Classifies failures as transient, quota, or fatal and retries with backoff
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Gemini Coach
//!
//! One `generateContent` request per analyzed activity. The request declares
//! a strict response schema mirroring [`AnalysisResult`], so the model must
//! answer with all fields present. Failures are classified into a tagged
//! `Transient | Quota | Fatal` decision from the HTTP status plus
//! message-text patterns; the pattern fallback is a best-effort heuristic
//! since upstream error shapes are not guaranteed stable.
//!
//! ## Configuration
//!
//! Set the `GEMINI_API_KEY` environment variable with your API key from
//! Google AI Studio. `GEMINI_MODEL` overrides the default model.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};

use super::backoff::RetryBackoffConfig;
use super::{prompt, CoachClient};
use crate::errors::{SyncError, SyncResult};
use crate::models::{Activity, AnalysisResult, GoalSettings};

/// Environment variable for the Gemini API key
const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default model to use
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Base URL for the Gemini API
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Gemini coaching client
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key
    pub api_key: String,
    /// Model name
    pub model: String,
    /// API base URL
    pub base_url: String,
    /// Backoff policy for transient failures
    pub retry: RetryBackoffConfig,
}

impl GeminiConfig {
    /// Create a configuration with an API key and defaults elsewhere
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            base_url: API_BASE_URL.into(),
            retry: RetryBackoffConfig::default(),
        }
    }

    /// Create a configuration from the `GEMINI_API_KEY` environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set.
    pub fn from_env() -> SyncResult<Self> {
        let api_key = env::var(GEMINI_API_KEY_ENV).map_err(|_| {
            SyncError::Config(format!("{GEMINI_API_KEY_ENV} environment variable not set"))
        })?;
        Ok(Self {
            retry: RetryBackoffConfig::from_env(),
            ..Self::new(api_key)
        })
    }

    /// Set a custom model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom API base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set a custom backoff policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryBackoffConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl Debug for GeminiConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Gemini coaching analysis client
pub struct GeminiCoach {
    client: Client,
    config: GeminiConfig,
}

impl GeminiCoach {
    /// Create a client for the given configuration
    #[must_use]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build the `generateContent` URL for the configured model
    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        )
    }

    /// One request attempt: send, map failure, parse the analysis
    async fn attempt_analysis(
        &self,
        url: &str,
        request: &GeminiRequest,
    ) -> Result<AnalysisResult, AttemptError> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| AttemptError::Terminal(SyncError::Transport(e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::Terminal(SyncError::Transport(e)))?;

        if !(200..300).contains(&status) {
            error!(status, "Gemini API error");
            return Err(classify_failure(status, &body).into_attempt_error(status));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            AttemptError::Terminal(SyncError::MalformedResponse(format!(
                "failed to parse Gemini response envelope: {e}"
            )))
        })?;

        if let Some(api_error) = parsed.error {
            let code = api_error.code.unwrap_or(status);
            let message = api_error.message.unwrap_or_else(|| body.clone());
            return Err(classify_failure(code, &message).into_attempt_error(code));
        }

        extract_analysis(&parsed).map_err(AttemptError::Terminal)
    }
}

#[async_trait]
impl CoachClient for GeminiCoach {
    async fn analyze(
        &self,
        activity: &Activity,
        history: &[Activity],
        goals: &GoalSettings,
    ) -> SyncResult<AnalysisResult> {
        let url = self.build_url();
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".into()),
                parts: vec![ContentPart {
                    text: prompt::build_prompt(activity, history, goals, Utc::now()),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        };

        let retry = &self.config.retry;
        let mut attempts: u32 = 0;
        loop {
            debug!(model = %self.config.model, attempt = attempts + 1, "Requesting coaching analysis");
            match self.attempt_analysis(&url, &request).await {
                Ok(result) => return Ok(result),
                Err(AttemptError::Terminal(e)) => return Err(e),
                Err(AttemptError::Transient {
                    retry_after,
                    message,
                }) => {
                    attempts += 1;
                    if attempts >= retry.max_attempts {
                        return Err(SyncError::RetriesExhausted {
                            attempts,
                            last: message,
                        });
                    }
                    // An upstream retry hint overrides the computed backoff
                    let delay = retry_after.unwrap_or_else(|| retry.delay_for_attempt(attempts));
                    warn!(
                        attempt = attempts,
                        max_attempts = retry.max_attempts,
                        delay_secs = delay.as_secs(),
                        "Gemini API busy, backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

// ============================================================================
// Failure Classification
// ============================================================================

/// Tagged failure decision for one API response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    /// Rate-limited, overloaded, or temporarily unavailable; retry with backoff
    Transient {
        /// Upstream-suggested retry delay, if the message carried one
        retry_after_secs: Option<u64>,
        /// Upstream error message
        message: String,
    },
    /// Hard quota exhaustion; will not clear within the retry window
    Quota {
        /// Upstream error message
        message: String,
    },
    /// Everything else
    Fatal {
        /// Upstream error message
        message: String,
    },
}

impl ApiFailure {
    fn into_attempt_error(self, status: u16) -> AttemptError {
        match self {
            Self::Transient {
                retry_after_secs,
                message,
            } => AttemptError::Transient {
                retry_after: retry_after_secs.map(Duration::from_secs),
                message,
            },
            Self::Quota { message } => {
                AttemptError::Terminal(SyncError::QuotaExhausted { message })
            }
            Self::Fatal { message } => {
                AttemptError::Terminal(SyncError::upstream(status, message))
            }
        }
    }
}

/// Internal per-attempt outcome for the retry loop
enum AttemptError {
    Transient {
        retry_after: Option<Duration>,
        message: String,
    },
    Terminal(SyncError),
}

/// Classify a failed response into `Transient | Quota | Fatal`.
///
/// Quota patterns win over the transient status codes: a 429 whose message
/// names the quota latches the day, while a bare 429 stays retryable.
#[must_use]
pub fn classify_failure(status: u16, body: &str) -> ApiFailure {
    let (message, api_status) = extract_error_message(body);
    let lower = message.to_lowercase();

    let quota = lower.contains("quota")
        || lower.contains("resource exhausted")
        || api_status.as_deref() == Some("RESOURCE_EXHAUSTED") && lower.contains("exceeded");
    if quota {
        return ApiFailure::Quota { message };
    }

    let transient = matches!(status, 429 | 503)
        || lower.contains("overloaded")
        || lower.contains("unavailable")
        || lower.contains("rate limit")
        || lower.contains("try again later");
    if transient {
        return ApiFailure::Transient {
            retry_after_secs: parse_retry_hint(&message),
            message,
        };
    }

    ApiFailure::Fatal { message }
}

/// Pull the error message and status label out of a Gemini error body
fn extract_error_message(body: &str) -> (String, Option<String>) {
    serde_json::from_str::<GeminiResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map_or_else(
            || (body.to_owned(), None),
            |e| (e.message.unwrap_or_else(|| body.to_owned()), e.status),
        )
}

/// Extract the seconds value from a "Please retry in 6.406453963s." hint
fn parse_retry_hint(message: &str) -> Option<u64> {
    let after = message.split("Please retry in ").nth(1)?;
    let seconds_str = after.split('s').next()?;
    let seconds: f64 = seconds_str.trim().parse().ok()?;
    Some(seconds.ceil() as u64)
}

// ============================================================================
// Response Extraction
// ============================================================================

/// Pull the analysis JSON out of the first candidate's first text part
fn extract_analysis(response: &GeminiResponse) -> Result<AnalysisResult, SyncError> {
    let text = response
        .candidates
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.first())
        .map(|p| p.text.as_str())
        .ok_or_else(|| SyncError::MalformedResponse("no content in Gemini response".into()))?;

    if text.trim().is_empty() {
        return Err(SyncError::MalformedResponse(
            "empty response from Gemini".into(),
        ));
    }

    serde_json::from_str(text).map_err(|e| {
        SyncError::MalformedResponse(format!("analysis violates the expected schema: {e}"))
    })
}

/// JSON schema declaration mirroring [`AnalysisResult`], all fields required
fn response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "activityClassification": {
                "type": "STRING",
                "enum": ["Easy", "Tempo", "Long Run", "Intervals", "Threshold", "Other"]
            },
            "effectivenessScore": { "type": "NUMBER" },
            "pros": { "type": "ARRAY", "items": { "type": "STRING" } },
            "cons": { "type": "ARRAY", "items": { "type": "STRING" } },
            "trendImpact": { "type": "STRING" },
            "nextTrainingSuggestion": {
                "type": "OBJECT",
                "properties": {
                    "type": { "type": "STRING" },
                    "distance": { "type": "STRING" },
                    "duration": { "type": "STRING" },
                    "description": { "type": "STRING" },
                    "targetMetrics": { "type": "STRING" }
                },
                "required": ["type", "distance", "duration", "description", "targetMetrics"]
            }
        },
        "required": [
            "summary", "activityClassification", "effectivenessScore",
            "pros", "cons", "trendImpact", "nextTrainingSuggestion"
        ]
    })
}

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Gemini API request structure
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

/// Content structure for the Gemini API
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

/// Text part of a content entry
#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    text: String,
}

/// Generation configuration enforcing JSON schema output
#[derive(Debug, Serialize)]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

/// Gemini API response structure
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<GeminiApiError>,
}

/// Response candidate
#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

/// API error payload from Gemini
#[derive(Debug, Deserialize)]
struct GeminiApiError {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_message_classifies_as_quota() {
        let body = r#"{"error": {"code": 429, "message": "You exceeded your current quota.", "status": "RESOURCE_EXHAUSTED"}}"#;
        let failure = classify_failure(429, body);
        assert!(matches!(failure, ApiFailure::Quota { .. }));
    }

    #[test]
    fn bare_rate_limit_stays_transient_with_hint() {
        let body = r#"{"error": {"code": 429, "message": "Rate limit hit. Please retry in 6.4s.", "status": "UNAVAILABLE"}}"#;
        match classify_failure(429, body) {
            ApiFailure::Transient {
                retry_after_secs, ..
            } => assert_eq!(retry_after_secs, Some(7)),
            other => panic!("expected transient, got {other:?}"),
        }
    }

    #[test]
    fn overloaded_message_is_transient_regardless_of_status() {
        let failure = classify_failure(400, "the model is overloaded");
        assert!(matches!(failure, ApiFailure::Transient { .. }));
    }

    #[test]
    fn unknown_client_error_is_fatal() {
        let failure = classify_failure(404, "model not found");
        assert!(matches!(failure, ApiFailure::Fatal { .. }));
    }

    #[test]
    fn retry_hint_parses_fractional_seconds() {
        assert_eq!(parse_retry_hint("Please retry in 6.406453963s."), Some(7));
        assert_eq!(parse_retry_hint("no hint here"), None);
    }

    #[test]
    fn analysis_parses_from_candidate_text() {
        let payload = json!({
            "activityClassification": "Easy",
            "summary": "Relaxed aerobic run.",
            "effectivenessScore": 70,
            "pros": ["consistent"],
            "cons": ["short"],
            "trendImpact": "Maintains base.",
            "nextTrainingSuggestion": {
                "type": "Tempo",
                "distance": "8 km",
                "duration": "40 min",
                "description": "Controlled push.",
                "targetMetrics": "HR 160-170"
            }
        });
        let envelope = json!({
            "candidates": [{ "content": { "parts": [{ "text": payload.to_string() }] } }]
        });

        let response: GeminiResponse = serde_json::from_value(envelope).unwrap();
        let analysis = extract_analysis(&response).unwrap();
        assert_eq!(analysis.summary, "Relaxed aerobic run.");
        assert_eq!(analysis.strengths, vec!["consistent".to_owned()]);
    }

    #[test]
    fn empty_candidates_are_malformed() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            extract_analysis(&response),
            Err(SyncError::MalformedResponse(_))
        ));
    }

    #[test]
    fn schema_requires_every_field() {
        let schema = response_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 7);
    }
}
