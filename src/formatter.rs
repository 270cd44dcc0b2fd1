// ABOUTME: Deterministic rendering of an analysis result into a bordered report block
// ABOUTME: Owns the idempotency marker and the append/strip description rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Report Formatter
//!
//! Pure functions turning an [`AnalysisResult`] into the annotated text block
//! appended to an activity description. The marker and border literals are
//! load-bearing: descriptions written by earlier deployments are recognized
//! by exact substring match, so neither may change.

use std::fmt::Write as _;

use crate::models::AnalysisResult;

/// Sentinel proving an activity already received AI analysis
pub const PROCESSED_MARKER: &str = "[StravAI-Processed]";

/// Border line delimiting a report block inside a description
pub const REPORT_BORDER: &str = "################################";

/// Render an analysis into the bordered report block.
///
/// Deterministic: identical input yields byte-identical output. The block is
/// terminated by the idempotency marker line and the closing border.
#[must_use]
pub fn format_report(analysis: &AnalysisResult) -> String {
    let mut out = String::new();

    // Infallible: fmt::Write to String never errors
    let _ = writeln!(out, "{REPORT_BORDER}");
    let _ = writeln!(out, "Strava AI analysis");
    let _ = writeln!(out, "---");
    let _ = writeln!(out, "**Coach's Summary:**");
    let _ = writeln!(out, "[{}] {}", analysis.classification, analysis.summary);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "**Effectiveness Score:** {}/100",
        format_score(analysis.effectiveness_score)
    );
    for strength in &analysis.strengths {
        let _ = writeln!(out, "+ {strength}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "**Trend & Progress:**");
    let _ = writeln!(out, "{}", analysis.trend_impact);
    let _ = writeln!(out);
    let _ = writeln!(out, "**Next Training Suggestion:**");
    let suggestion = &analysis.next_training_suggestion;
    let _ = writeln!(out, "- **Type:** {}", suggestion.workout_type);
    let _ = writeln!(
        out,
        "- **Volume:** {} | {}",
        suggestion.distance, suggestion.duration
    );
    let _ = writeln!(out, "- **Target Metrics:** {}", suggestion.target_metrics);
    let _ = writeln!(out, "- **Focus:** {}", suggestion.description);
    let _ = writeln!(out);
    let _ = writeln!(out, "*{PROCESSED_MARKER}*");
    let _ = write!(out, "{REPORT_BORDER}");

    out
}

/// Append a report to an existing description, separated by a blank line.
///
/// A missing or empty prior description yields the report alone. The prior
/// text is never replaced outside the explicit force path.
#[must_use]
pub fn append_report(existing: Option<&str>, report: &str) -> String {
    match existing {
        Some(prior) if !prior.is_empty() => format!("{prior}\n\n{report}"),
        _ => report.to_owned(),
    }
}

/// Strip any prior report from a description for the force/verify path.
///
/// Returns everything before the first border line, trimmed. A description
/// without a border is returned trimmed and otherwise unchanged.
#[must_use]
pub fn strip_prior_report(description: &str) -> String {
    description
        .split(REPORT_BORDER)
        .next()
        .unwrap_or("")
        .trim()
        .to_owned()
}

/// Integer scores print without a decimal point, fractional ones as-is
fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score}")
    }
}
