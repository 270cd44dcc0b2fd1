// ABOUTME: Tests for environment-driven configuration loading and presence checks
// ABOUTME: Serialized because they mutate shared process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![allow(missing_docs)]

use serial_test::serial;
use std::env;

use stravai::config::SyncConfig;
use stravai::errors::SyncError;

const ALL_VARS: &[&str] = &[
    "STRAVA_CLIENT_ID",
    "STRAVA_CLIENT_SECRET",
    "STRAVA_REFRESH_TOKEN",
    "STRAVA_ACCESS_TOKEN",
    "GEMINI_API_KEY",
    "GEMINI_MODEL",
    "GOAL_RACE_TYPE",
    "GOAL_RACE_DATE",
    "GOAL_RACE_TIME",
    "ACTIVITY_FILTER",
    "FETCH_DEPTH",
    "SYNC_INTERVAL_SECS",
    "QUOTA_STATE_PATH",
];

fn clear_env() {
    for var in ALL_VARS {
        env::remove_var(var);
    }
}

fn set_minimal_env() {
    clear_env();
    env::set_var("STRAVA_CLIENT_ID", "1234");
    env::set_var("STRAVA_CLIENT_SECRET", "oauth-secret");
    env::set_var("STRAVA_REFRESH_TOKEN", "refresh-secret");
    env::set_var("GEMINI_API_KEY", "gemini-secret");
}

#[test]
#[serial]
fn missing_credentials_fail_the_presence_check() {
    clear_env();
    let err = SyncConfig::from_env().unwrap_err();
    assert!(matches!(err, SyncError::AuthConfiguration(_)));
}

#[test]
#[serial]
fn manual_token_satisfies_the_presence_check() {
    clear_env();
    env::set_var("STRAVA_ACCESS_TOKEN", "manual");
    env::set_var("GEMINI_API_KEY", "gemini-secret");

    let config = SyncConfig::from_env().unwrap();
    assert!(!config.credentials.has_refresh_triple());
    assert_eq!(config.credentials.access_token.as_deref(), Some("manual"));
}

#[test]
#[serial]
fn missing_gemini_key_is_a_config_error() {
    clear_env();
    env::set_var("STRAVA_ACCESS_TOKEN", "manual");

    let err = SyncConfig::from_env().unwrap_err();
    assert!(matches!(err, SyncError::Config(_)));
}

#[test]
#[serial]
fn defaults_apply_when_knobs_are_unset() {
    set_minimal_env();

    let config = SyncConfig::from_env().unwrap();
    assert_eq!(config.activity_filter, "Run");
    assert_eq!(config.fetch_depth, 20);
    assert_eq!(config.sync_interval.as_secs(), 60);
    assert_eq!(config.goals.race_type, "Marathon");
    assert_eq!(config.goals.race_date, "Not Set");
    assert_eq!(config.goals.goal_time, "Finish");
    assert!(config.gemini_model.is_none());
    assert!(config.quota_state_path.is_none());
}

#[test]
#[serial]
fn knobs_override_the_defaults() {
    set_minimal_env();
    env::set_var("GOAL_RACE_TYPE", "Half Marathon");
    env::set_var("ACTIVITY_FILTER", "TrailRun");
    env::set_var("FETCH_DEPTH", "50");
    env::set_var("SYNC_INTERVAL_SECS", "300");
    env::set_var("GEMINI_MODEL", "gemini-1.5-pro");

    let config = SyncConfig::from_env().unwrap();
    assert_eq!(config.goals.race_type, "Half Marathon");
    assert_eq!(config.activity_filter, "TrailRun");
    assert_eq!(config.fetch_depth, 50);
    assert_eq!(config.sync_interval.as_secs(), 300);
    assert_eq!(config.gemini_model.as_deref(), Some("gemini-1.5-pro"));
}

#[test]
#[serial]
fn unparseable_knob_is_a_config_error() {
    set_minimal_env();
    env::set_var("FETCH_DEPTH", "many");

    let err = SyncConfig::from_env().unwrap_err();
    assert!(matches!(err, SyncError::Config(_)));
}

#[test]
#[serial]
fn summary_never_leaks_secrets() {
    set_minimal_env();

    let config = SyncConfig::from_env().unwrap();
    let summary = config.summary();
    assert!(!summary.contains("oauth-secret"));
    assert!(!summary.contains("refresh-secret"));
    assert!(!summary.contains("gemini-secret"));
    assert!(summary.contains("refresh token"));
    assert!(summary.contains("Marathon"));
}
