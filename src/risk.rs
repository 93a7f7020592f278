use crate::merge::merge;
use crate::models::{
    AssessmentRecord, AttemptsRecord, AttendanceRecord, CompositeStudentRecord, RiskFactor,
    RiskProfile, RiskTier, TriggeredFactor,
};

pub const MAX_SCORE: u32 = 100;

/// Point values and thresholds for the four scoring rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskRules {
    pub attendance_threshold: f64,
    pub attendance_points: u32,
    pub average_threshold: f64,
    pub average_points: u32,
    pub decline_points: u32,
    pub attempts_threshold: u32,
    pub attempts_points: u32,
}

impl Default for RiskRules {
    fn default() -> Self {
        RiskRules {
            attendance_threshold: 75.0,
            attendance_points: 30,
            average_threshold: 40.0,
            average_points: 30,
            decline_points: 20,
            attempts_threshold: 2,
            attempts_points: 20,
        }
    }
}

pub fn evaluate(record: &CompositeStudentRecord) -> RiskProfile {
    evaluate_with_rules(record, &RiskRules::default())
}

pub fn evaluate_with_rules(record: &CompositeStudentRecord, rules: &RiskRules) -> RiskProfile {
    let mut factors = Vec::new();

    if record
        .attendance_percentage
        .is_some_and(|pct| pct < rules.attendance_threshold)
    {
        factors.push(TriggeredFactor::new(
            RiskFactor::LowAttendance,
            rules.attendance_points,
        ));
    }

    if record
        .average_score()
        .is_some_and(|avg| avg < rules.average_threshold)
    {
        factors.push(TriggeredFactor::new(
            RiskFactor::LowAverageScore,
            rules.average_points,
        ));
    }

    if is_declining(&record.scores) {
        factors.push(TriggeredFactor::new(
            RiskFactor::DecliningTrend,
            rules.decline_points,
        ));
    }

    if record
        .attempts_used
        .is_some_and(|used| used >= rules.attempts_threshold)
    {
        factors.push(TriggeredFactor::new(
            RiskFactor::RepeatedAttempts,
            rules.attempts_points,
        ));
    }

    let total: u32 = factors.iter().map(|factor| factor.points).sum();
    let score = total.min(MAX_SCORE);

    RiskProfile {
        student_id: record.student_id.clone(),
        score,
        tier: tier_for_score(score),
        triggered_factors: factors,
        source_record: record.clone(),
    }
}

/// True when at least two scores are defined and each defined score is strictly
/// below the previous defined one. Missing tests are skipped, so `[80, -, 70]`
/// counts as a decline.
pub fn is_declining(scores: &[Option<f64>]) -> bool {
    let defined: Vec<f64> = scores.iter().flatten().copied().collect();
    defined.len() >= 2 && defined.windows(2).all(|pair| pair[0] > pair[1])
}

pub fn tier_for_score(score: u32) -> RiskTier {
    match score {
        0..=30 => RiskTier::Safe,
        31..=60 => RiskTier::Watchlist,
        _ => RiskTier::AtRisk,
    }
}

pub fn analyze_all_students(
    attendance: &[AttendanceRecord],
    assessment: &[AssessmentRecord],
    attempts: &[AttemptsRecord],
) -> Vec<RiskProfile> {
    analyze_with_rules(attendance, assessment, attempts, &RiskRules::default())
}

pub fn analyze_with_rules(
    attendance: &[AttendanceRecord],
    assessment: &[AssessmentRecord],
    attempts: &[AttemptsRecord],
    rules: &RiskRules,
) -> Vec<RiskProfile> {
    merge(attendance, assessment, attempts)
        .iter()
        .map(|record| evaluate_with_rules(record, rules))
        .collect()
}

/// Highest score first; equal scores fall back to student id.
pub fn sort_by_score(profiles: &mut [RiskProfile]) {
    profiles.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
}
