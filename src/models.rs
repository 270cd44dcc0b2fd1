// ABOUTME: Domain data model for activities, goals, and AI analysis results
// ABOUTME: Shared across the activity source, coaching client, and orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::formatter::PROCESSED_MARKER;

/// One recorded exercise session fetched from the activity source.
///
/// Immutable once fetched except for `description`, which the orchestrator
/// rewrites when it appends a coaching report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Source-assigned activity identifier
    pub id: u64,
    /// Activity title as shown to the athlete
    pub name: String,
    /// Category string from the source, e.g. `"Run"` or `"Ride"`
    pub activity_type: String,
    /// Start timestamp in UTC
    pub start_date: DateTime<Utc>,
    /// Distance in meters
    pub distance: f64,
    /// Moving time in seconds
    pub moving_time: u64,
    /// Total elevation gain in meters
    pub total_elevation_gain: f64,
    /// Average heart rate in bpm, if recorded
    pub average_heartrate: Option<f32>,
    /// Maximum heart rate in bpm, if recorded
    pub max_heartrate: Option<f32>,
    /// Average speed in m/s, if provided by the source
    pub average_speed: Option<f64>,
    /// Maximum speed in m/s, if provided by the source
    pub max_speed: Option<f64>,
    /// Free-text description; carries the coaching report after processing
    pub description: Option<String>,
    /// Energy expenditure in kilojoules, if recorded
    pub kilojoules: Option<f64>,
}

impl Activity {
    /// Distance in kilometers
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance / 1000.0
    }

    /// Pace in minutes per kilometer, or `None` for zero-distance entries
    #[must_use]
    pub fn pace_min_per_km(&self) -> Option<f64> {
        if self.distance > 0.0 {
            Some((self.moving_time as f64 / 60.0) / (self.distance / 1000.0))
        } else {
            None
        }
    }

    /// Whether this activity already carries a coaching report.
    ///
    /// Marker presence in the description is the sole already-processed
    /// signal; only the force/verify path bypasses it.
    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| d.contains(PROCESSED_MARKER))
    }
}

/// Athlete goal settings passed through to the coaching prompt unchanged.
///
/// Three free-text fields, no validation; owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalSettings {
    /// Target race category, e.g. "Marathon"
    pub race_type: String,
    /// Target race date
    pub race_date: String,
    /// Target finish time
    pub goal_time: String,
}

impl Default for GoalSettings {
    fn default() -> Self {
        Self {
            race_type: "Marathon".into(),
            race_date: "Not Set".into(),
            goal_time: "Finish".into(),
        }
    }
}

/// Session classification assigned by the coaching model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityClassification {
    /// Recovery or conversational-pace session
    Easy,
    /// Sustained comfortably-hard effort
    Tempo,
    /// Endurance-building long session
    #[serde(rename = "Long Run")]
    LongRun,
    /// Repeated high-intensity efforts with recovery
    Intervals,
    /// Lactate-threshold work
    Threshold,
    /// Anything the model could not fit into the above
    Other,
}

impl fmt::Display for ActivityClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Easy => "Easy",
            Self::Tempo => "Tempo",
            Self::LongRun => "Long Run",
            Self::Intervals => "Intervals",
            Self::Threshold => "Threshold",
            Self::Other => "Other",
        };
        f.write_str(label)
    }
}

/// Structured coaching analysis for one activity.
///
/// Produced once per analyzed activity and never mutated afterwards. Wire
/// field names match the JSON schema sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Session classification
    #[serde(rename = "activityClassification")]
    pub classification: ActivityClassification,
    /// 2-3 sentence performance summary
    pub summary: String,
    /// Goal-alignment score, documented range 1-100, forwarded unclamped
    #[serde(rename = "effectivenessScore")]
    pub effectiveness_score: f64,
    /// Observations on what went well, in model order
    #[serde(rename = "pros")]
    pub strengths: Vec<String>,
    /// Observations on what to improve, in model order
    #[serde(rename = "cons")]
    pub weaknesses: Vec<String>,
    /// How the session fits the recent training trend
    #[serde(rename = "trendImpact")]
    pub trend_impact: String,
    /// Prescription for the next workout
    #[serde(rename = "nextTrainingSuggestion")]
    pub next_training_suggestion: TrainingSuggestion,
}

/// Next-workout prescription nested inside an [`AnalysisResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSuggestion {
    /// Workout type, e.g. "Interval session"
    #[serde(rename = "type")]
    pub workout_type: String,
    /// Suggested distance, free text
    pub distance: String,
    /// Suggested duration, free text
    pub duration: String,
    /// What to focus on during the workout
    pub description: String,
    /// Target metrics to hit, free text
    #[serde(rename = "targetMetrics")]
    pub target_metrics: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn run(distance: f64, moving_time: u64) -> Activity {
        Activity {
            id: 1,
            name: "Morning Run".into(),
            activity_type: "Run".into(),
            start_date: Utc.with_ymd_and_hms(2025, 6, 1, 7, 0, 0).unwrap(),
            distance,
            moving_time,
            total_elevation_gain: 40.0,
            average_heartrate: Some(150.0),
            max_heartrate: Some(175.0),
            average_speed: Some(3.3),
            max_speed: Some(4.5),
            description: None,
            kilojoules: None,
        }
    }

    #[test]
    fn pace_for_10k_in_3000s_is_5_min_per_km() {
        let pace = run(10_000.0, 3000).pace_min_per_km().unwrap();
        assert!((pace - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn pace_is_none_for_zero_distance() {
        assert!(run(0.0, 1800).pace_min_per_km().is_none());
    }

    #[test]
    fn marker_presence_flags_processed() {
        let mut a = run(5000.0, 1500);
        assert!(!a.is_processed());
        a.description = Some(format!("Nice run\n\n*{PROCESSED_MARKER}*"));
        assert!(a.is_processed());
    }

    #[test]
    fn classification_round_trips_through_serde() {
        let json = serde_json::to_string(&ActivityClassification::LongRun).unwrap();
        assert_eq!(json, "\"Long Run\"");
        let back: ActivityClassification = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ActivityClassification::LongRun);
    }
}
