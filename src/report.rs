use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{RiskDistribution, RiskProfile, RiskTier};

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub distribution: RiskDistribution,
    pub alert: bool,
    pub profiles: &'a [RiskProfile],
}

pub fn build_json(
    profiles: &[RiskProfile],
    distribution: &RiskDistribution,
    alert_threshold: usize,
    generated_at: DateTime<Utc>,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        generated_at,
        distribution: *distribution,
        alert: distribution.needs_alert(alert_threshold),
        profiles,
    })
}

pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "-".to_string(),
    }
}

pub fn format_factors(profile: &RiskProfile) -> String {
    if profile.triggered_factors.is_empty() {
        return "no risk factors".to_string();
    }
    profile
        .triggered_factors
        .iter()
        .map(|factor| format!("{} (+{})", factor.label, factor.points))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn alert_message(distribution: &RiskDistribution) -> String {
    let noun = if distribution.at_risk == 1 {
        "student is"
    } else {
        "students are"
    };
    format!("ALERT: {} {} At Risk.", distribution.at_risk, noun)
}

/// Plain-text table for the terminal. `profiles` should already be sorted.
pub fn build_table(profiles: &[RiskProfile], limit: usize) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<12} {:>5}  {:<10} {:>10} {:>7} {:>8}  Factors",
        "Student", "Score", "Tier", "Attendance", "Avg", "Attempts"
    );

    for profile in profiles.iter().take(limit) {
        let record = &profile.source_record;
        let attempts = record
            .attempts_used
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            output,
            "{:<12} {:>5}  {:<10} {:>10} {:>7} {:>8}  {}",
            profile.student_id,
            profile.score,
            profile.tier.as_str(),
            format_value(record.attendance_percentage),
            format_value(record.average_score()),
            attempts,
            format_factors(profile)
        );
    }

    if profiles.len() > limit {
        let _ = writeln!(output, "... {} more students", profiles.len() - limit);
    }

    output
}

pub fn build_distribution(distribution: &RiskDistribution) -> String {
    let mut output = String::new();
    for tier in RiskTier::ALL {
        let _ = writeln!(
            output,
            "- {}: {} ({:.1}%)",
            tier,
            distribution.count(tier),
            distribution.percentage(tier)
        );
    }
    output
}

/// Markdown report. `profiles` should already be sorted by score.
pub fn build_report(
    profiles: &[RiskProfile],
    distribution: &RiskDistribution,
    alert_threshold: usize,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Student Early Warning Report");
    let _ = writeln!(
        output,
        "Generated {} for {} students",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        distribution.total()
    );
    let _ = writeln!(output);

    if distribution.needs_alert(alert_threshold) {
        let _ = writeln!(output, "> {}", alert_message(distribution));
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "## Risk Distribution");
    if distribution.total() == 0 {
        let _ = writeln!(output, "No students found in the uploaded datasets.");
    } else {
        output.push_str(&build_distribution(distribution));
    }

    let flagged: Vec<&RiskProfile> = profiles
        .iter()
        .filter(|profile| profile.tier != RiskTier::Safe)
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students Needing Attention");
    if flagged.is_empty() {
        let _ = writeln!(output, "No students on the watchlist or at risk.");
    } else {
        for profile in flagged {
            let _ = writeln!(
                output,
                "- {} score {} ({}): {}",
                profile.student_id,
                profile.score,
                profile.tier,
                format_factors(profile)
            );
        }
    }

    let incomplete: Vec<&RiskProfile> = profiles
        .iter()
        .filter(|profile| !profile.source_record.sources.is_complete())
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Data Coverage");
    if incomplete.is_empty() {
        let _ = writeln!(output, "Every student appears in all three datasets.");
    } else {
        for profile in incomplete {
            let missing = profile
                .source_record
                .sources
                .missing()
                .iter()
                .map(|kind| kind.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(output, "- {} missing {}", profile.student_id, missing);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::distribution;
    use crate::models::CompositeStudentRecord;
    use crate::risk::{evaluate, sort_by_score};
    use chrono::TimeZone;

    fn sample_profiles() -> Vec<RiskProfile> {
        let mut complete = CompositeStudentRecord::new("STU002");
        complete.attendance_percentage = Some(62.0);
        complete.scores = [Some(45.0), Some(38.0), Some(32.0)];
        complete.attempts_used = Some(3);
        complete.sources.attendance = true;
        complete.sources.assessment = true;
        complete.sources.attempts = true;

        let mut partial = CompositeStudentRecord::new("STU005");
        partial.attendance_percentage = Some(95.0);
        partial.sources.attendance = true;

        let mut profiles = vec![evaluate(&partial), evaluate(&complete)];
        sort_by_score(&mut profiles);
        profiles
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 2, 9, 30, 0).unwrap()
    }

    #[test]
    fn report_lists_flagged_students_and_gaps() {
        let profiles = sample_profiles();
        let counts = distribution(&profiles);
        let report = build_report(&profiles, &counts, 1, fixed_time());

        assert!(report.contains("Generated 2026-02-02 09:30 UTC for 2 students"));
        assert!(report.contains("> ALERT: 1 student is At Risk"));
        assert!(report.contains("- At Risk: 1 (50.0%)"));
        assert!(report.contains("- STU002 score 100 (At Risk): Low attendance (+30)"));
        assert!(report.contains("- STU005 missing assessment, attempts"));
        assert!(!report.contains("- STU002 missing"));
    }

    #[test]
    fn report_handles_empty_population() {
        let report = build_report(&[], &RiskDistribution::default(), 1, fixed_time());
        assert!(report.contains("No students found"));
        assert!(!report.contains("ALERT"));
    }

    #[test]
    fn table_respects_limit() {
        let profiles = sample_profiles();
        let table = build_table(&profiles, 1);
        assert!(table.contains("STU002"));
        assert!(!table.contains("STU005"));
        assert!(table.contains("... 1 more students"));
    }

    #[test]
    fn json_carries_distribution_and_factors() {
        let profiles = sample_profiles();
        let counts = distribution(&profiles);
        let json = build_json(&profiles, &counts, 5, fixed_time()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["distribution"]["at_risk"], 1);
        assert_eq!(value["alert"], false);
        assert_eq!(value["profiles"][0]["student_id"], "STU002");
        assert_eq!(
            value["profiles"][0]["triggered_factors"][2]["label"],
            "Declining trend"
        );
        assert_eq!(value["profiles"][1]["triggered_factors"].as_array().unwrap().len(), 0);
    }
}
