// ABOUTME: Coaching prompt construction with 30-day and deep-baseline history windows
// ABOUTME: Renders per-entry lines with distance, pace, and heart rate
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, Duration, Utc};

use crate::models::{Activity, GoalSettings};

/// Days covered by the recent-trends window
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Maximum entries in the deep-baseline window
pub const BASELINE_DEPTH: usize = 50;

/// Build the analysis prompt for one activity.
///
/// Two historical windows are derived from `history` (assumed newest first):
/// entries within the last [`RECENT_WINDOW_DAYS`] days, and up to
/// [`BASELINE_DEPTH`] most-recent entries overall. Both exclude the target
/// activity.
#[must_use]
pub fn build_prompt(
    activity: &Activity,
    history: &[Activity],
    goals: &GoalSettings,
    now: DateTime<Utc>,
) -> String {
    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);

    let recent: Vec<&Activity> = history
        .iter()
        .filter(|h| h.id != activity.id && h.start_date > cutoff)
        .collect();
    let baseline: Vec<&Activity> = history
        .iter()
        .filter(|h| h.id != activity.id)
        .take(BASELINE_DEPTH)
        .collect();

    let avg_hr = activity
        .average_heartrate
        .map_or_else(|| "N/A".to_owned(), |hr| format!("{hr:.0}"));

    format!(
        "ROLE: Professional Athletic Performance Coach.\n\
         ATHLETE GOAL: {race_type} on {race_date} (Target: {goal_time}).\n\
         \n\
         ANALYSIS TARGET (Current Activity):\n\
         - Name: {name}\n\
         - Distance: {distance_km:.2} km\n\
         - Moving Time: {moving_mins:.1} mins\n\
         - Avg HR: {avg_hr} bpm\n\
         \n\
         CONTEXT A: RECENT TRENDS (Last {window} Days)\n\
         {recent_lines}\n\
         \n\
         CONTEXT B: DEEP BASELINE (Up to {depth} Activities)\n\
         {baseline_lines}\n\
         \n\
         TASK:\n\
         1. Classify: Easy, Tempo, Long Run, Intervals, Threshold.\n\
         2. Performance Summary: 2-3 sentences analyzing efficiency.\n\
         3. Trend Assessment: How does this fit into the last {window} days? \
         Are we overtraining or peaking?\n\
         4. Long-term Progress: Based on the baseline, has the aerobic threshold improved?\n\
         5. Goal Alignment: Score 1-100 how effectively this session serves the \
         {race_type} goal.\n\
         6. Next Prescription: Recommend the specific next workout.\n\
         \n\
         OUTPUT: JSON only.",
        race_type = goals.race_type,
        race_date = goals.race_date,
        goal_time = goals.goal_time,
        name = activity.name,
        distance_km = activity.distance_km(),
        moving_mins = activity.moving_time as f64 / 60.0,
        avg_hr = avg_hr,
        window = RECENT_WINDOW_DAYS,
        depth = BASELINE_DEPTH,
        recent_lines = history_lines(&recent),
        baseline_lines = history_lines(&baseline),
    )
}

/// Render one line per history entry
fn history_lines(entries: &[&Activity]) -> String {
    entries
        .iter()
        .map(|a| entry_line(a))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `- {type} ({date}): {km}km, Pace: {pace} min/km, HR: {hr}`
fn entry_line(activity: &Activity) -> String {
    let pace = activity
        .pace_min_per_km()
        .map_or_else(|| "?".to_owned(), |p| format!("{p:.2}"));
    let hr = activity
        .average_heartrate
        .map_or_else(|| "?".to_owned(), |h| format!("{h:.0}"));

    format!(
        "- {} ({}): {:.2}km, Pace: {} min/km, HR: {}",
        activity.activity_type,
        activity.start_date.format("%Y-%m-%d"),
        activity.distance_km(),
        pace,
        hr,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn activity(id: u64, days_ago: i64, now: DateTime<Utc>) -> Activity {
        Activity {
            id,
            name: format!("Run {id}"),
            activity_type: "Run".into(),
            start_date: now - Duration::days(days_ago),
            distance: 10_000.0,
            moving_time: 3000,
            total_elevation_gain: 0.0,
            average_heartrate: Some(148.0),
            max_heartrate: None,
            average_speed: None,
            max_speed: None,
            description: None,
            kilojoules: None,
        }
    }

    #[test]
    fn entry_line_computes_pace_from_distance_and_time() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 8, 0, 0).unwrap();
        let line = entry_line(&activity(1, 2, now));
        assert_eq!(line, "- Run (2025-06-13): 10.00km, Pace: 5.00 min/km, HR: 148");
    }

    #[test]
    fn entry_line_uses_placeholder_without_heart_rate() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 8, 0, 0).unwrap();
        let mut a = activity(1, 0, now);
        a.average_heartrate = None;
        assert!(entry_line(&a).ends_with("HR: ?"));
    }

    #[test]
    fn recent_window_excludes_old_entries_and_the_target() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 8, 0, 0).unwrap();
        let target = activity(1, 0, now);
        let history = vec![
            activity(1, 0, now),  // target itself, must be filtered
            activity(2, 10, now), // inside the window
            activity(3, 45, now), // outside the window
        ];

        let prompt = build_prompt(&target, &history, &GoalSettings::default(), now);

        let section_a = prompt
            .split("CONTEXT B")
            .next()
            .unwrap_or("");
        assert!(section_a.contains("2025-06-05")); // id 2
        assert!(!section_a.contains("2025-05-01")); // id 3, 45 days ago
        // the target's own date appears in the header but not as a history line
        assert_eq!(section_a.matches("- Run (2025-06-15)").count(), 0);
    }

    #[test]
    fn baseline_includes_older_entries() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 8, 0, 0).unwrap();
        let target = activity(1, 0, now);
        let history = vec![activity(2, 10, now), activity(3, 45, now)];

        let prompt = build_prompt(&target, &history, &GoalSettings::default(), now);
        let section_b = prompt.split("CONTEXT B").nth(1).unwrap_or("");
        assert!(section_b.contains("2025-05-01"));
    }
}
