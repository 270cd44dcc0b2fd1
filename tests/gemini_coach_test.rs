// ABOUTME: Integration tests for the Gemini coach against a mock HTTP server
// ABOUTME: Covers transient retry, quota short-circuit, and malformed responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![allow(missing_docs)]

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stravai::coach::{CoachClient, GeminiCoach, GeminiConfig, RetryBackoffConfig};
use stravai::errors::SyncError;
use stravai::models::{Activity, ActivityClassification, GoalSettings};

const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

fn fast_retry() -> RetryBackoffConfig {
    RetryBackoffConfig {
        max_attempts: 4,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

fn coach_for(server: &MockServer) -> GeminiCoach {
    GeminiCoach::new(
        GeminiConfig::new("test-key")
            .with_base_url(server.uri())
            .with_retry(fast_retry()),
    )
}

fn target_activity() -> Activity {
    Activity {
        id: 7,
        name: "Tempo Tuesday".into(),
        activity_type: "Run".into(),
        start_date: Utc.with_ymd_and_hms(2025, 6, 10, 6, 30, 0).unwrap(),
        distance: 8000.0,
        moving_time: 2400,
        total_elevation_gain: 30.0,
        average_heartrate: Some(158.0),
        max_heartrate: Some(176.0),
        average_speed: Some(3.33),
        max_speed: Some(4.0),
        description: None,
        kilojoules: Some(500.0),
    }
}

fn analysis_payload() -> serde_json::Value {
    json!({
        "activityClassification": "Tempo",
        "summary": "Strong sustained effort.",
        "effectivenessScore": 84,
        "pros": ["Held target pace"],
        "cons": ["Started too fast"],
        "trendImpact": "Sharpening nicely.",
        "nextTrainingSuggestion": {
            "type": "Easy Run",
            "distance": "6 km",
            "duration": "35 min",
            "description": "Full recovery.",
            "targetMetrics": "HR < 140"
        }
    })
}

fn success_envelope() -> serde_json::Value {
    json!({
        "candidates": [
            { "content": { "role": "model", "parts": [{ "text": analysis_payload().to_string() }] } }
        ]
    })
}

fn overloaded_body() -> serde_json::Value {
    json!({
        "error": {
            "code": 503,
            "message": "The model is overloaded. Please try again later.",
            "status": "UNAVAILABLE"
        }
    })
}

#[tokio::test]
async fn transient_failures_retry_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(overloaded_body()))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_envelope()))
        .mount(&server)
        .await;

    let coach = coach_for(&server);
    let result = coach
        .analyze(&target_activity(), &[], &GoalSettings::default())
        .await
        .unwrap();

    assert_eq!(result.classification, ActivityClassification::Tempo);
    assert_eq!(result.effectiveness_score, 84.0);
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn persistent_transient_failures_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(overloaded_body()))
        .mount(&server)
        .await;

    let coach = coach_for(&server);
    let err = coach
        .analyze(&target_activity(), &[], &GoalSettings::default())
        .await
        .unwrap_err();

    match err {
        SyncError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 4),
        other => panic!("expected RetriesExhausted, got {other}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn quota_exhaustion_fails_immediately_with_zero_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "code": 429,
                "message": "You exceeded your current quota, please check your plan and billing details.",
                "status": "RESOURCE_EXHAUSTED"
            }
        })))
        .mount(&server)
        .await;

    let coach = coach_for(&server);
    let err = coach
        .analyze(&target_activity(), &[], &GoalSettings::default())
        .await
        .unwrap_err();

    assert!(err.is_quota());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn schema_violating_response_is_malformed_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "{\"summary\": \"missing everything else\"}" }] } }
            ]
        })))
        .mount(&server)
        .await;

    let coach = coach_for(&server);
    let err = coach
        .analyze(&target_activity(), &[], &GoalSettings::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::MalformedResponse(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_candidates_are_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let coach = coach_for(&server);
    let err = coach
        .analyze(&target_activity(), &[], &GoalSettings::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::MalformedResponse(_)));
}

#[tokio::test]
async fn request_declares_json_schema_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_envelope()))
        .mount(&server)
        .await;

    let coach = coach_for(&server);
    coach
        .analyze(&target_activity(), &[], &GoalSettings::default())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body["generation_config"]["response_mime_type"],
        "application/json"
    );
    let required = body["generation_config"]["response_schema"]["required"]
        .as_array()
        .unwrap();
    assert_eq!(required.len(), 7);
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Tempo Tuesday"));
    assert!(prompt.contains("Marathon"));
}
