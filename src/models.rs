use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub attendance_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub student_id: String,
    pub test_score_1: Option<f64>,
    pub test_score_2: Option<f64>,
    pub test_score_3: Option<f64>,
}

impl AssessmentRecord {
    /// Scores in chronological order, gaps kept.
    pub fn scores(&self) -> [Option<f64>; 3] {
        [self.test_score_1, self.test_score_2, self.test_score_3]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptsRecord {
    pub student_id: String,
    pub attempts_used: Option<u32>,
}

/// Which of the three uploads mentioned a student.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourcePresence {
    pub attendance: bool,
    pub assessment: bool,
    pub attempts: bool,
}

impl SourcePresence {
    pub fn is_complete(&self) -> bool {
        self.attendance && self.assessment && self.attempts
    }

    pub fn missing(&self) -> Vec<SourceKind> {
        let mut missing = Vec::new();
        if !self.attendance {
            missing.push(SourceKind::Attendance);
        }
        if !self.assessment {
            missing.push(SourceKind::Assessment);
        }
        if !self.attempts {
            missing.push(SourceKind::Attempts);
        }
        missing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Attendance,
    Assessment,
    Attempts,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Attendance => "attendance",
            SourceKind::Assessment => "assessment",
            SourceKind::Attempts => "attempts",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeStudentRecord {
    pub student_id: String,
    pub attendance_percentage: Option<f64>,
    pub scores: [Option<f64>; 3],
    pub attempts_used: Option<u32>,
    pub sources: SourcePresence,
}

impl CompositeStudentRecord {
    pub fn new(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            attendance_percentage: None,
            scores: [None; 3],
            attempts_used: None,
            sources: SourcePresence::default(),
        }
    }

    pub fn defined_scores(&self) -> Vec<f64> {
        self.scores.iter().flatten().copied().collect()
    }

    pub fn average_score(&self) -> Option<f64> {
        let defined = self.defined_scores();
        if defined.is_empty() {
            return None;
        }
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskTier {
    Safe,
    Watchlist,
    AtRisk,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Safe, RiskTier::Watchlist, RiskTier::AtRisk];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Safe => "Safe",
            RiskTier::Watchlist => "Watchlist",
            RiskTier::AtRisk => "At Risk",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskTier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "safe" => Ok(RiskTier::Safe),
            "watchlist" => Ok(RiskTier::Watchlist),
            "atrisk" => Ok(RiskTier::AtRisk),
            _ => Err(format!("unknown risk tier: {value}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    LowAttendance,
    LowAverageScore,
    DecliningTrend,
    RepeatedAttempts,
}

impl RiskFactor {
    pub fn label(&self) -> &'static str {
        match self {
            RiskFactor::LowAttendance => "Low attendance",
            RiskFactor::LowAverageScore => "Low average score",
            RiskFactor::DecliningTrend => "Declining trend",
            RiskFactor::RepeatedAttempts => "Repeated attempts",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggeredFactor {
    pub factor: RiskFactor,
    pub label: &'static str,
    pub points: u32,
}

impl TriggeredFactor {
    pub fn new(factor: RiskFactor, points: u32) -> Self {
        Self {
            factor,
            label: factor.label(),
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskProfile {
    pub student_id: String,
    pub score: u32,
    pub tier: RiskTier,
    pub triggered_factors: Vec<TriggeredFactor>,
    pub source_record: CompositeStudentRecord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskDistribution {
    pub safe: usize,
    pub watchlist: usize,
    pub at_risk: usize,
}
