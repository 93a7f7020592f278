use crate::error::EngineError;
use crate::models::{
    AssessmentRecord, AttemptsRecord, AttendanceRecord, RiskProfile, SourceKind,
};
use crate::risk::{analyze_with_rules, RiskRules};

/// The three uploads as they arrive. Analysis only runs once all are present.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub attendance: Option<Vec<AttendanceRecord>>,
    pub assessment: Option<Vec<AssessmentRecord>>,
    pub attempts: Option<Vec<AttemptsRecord>>,
}

impl SourceSet {
    pub fn new(
        attendance: Vec<AttendanceRecord>,
        assessment: Vec<AssessmentRecord>,
        attempts: Vec<AttemptsRecord>,
    ) -> Self {
        Self {
            attendance: Some(attendance),
            assessment: Some(assessment),
            attempts: Some(attempts),
        }
    }

    pub fn missing(&self) -> Option<SourceKind> {
        if self.attendance.is_none() {
            Some(SourceKind::Attendance)
        } else if self.assessment.is_none() {
            Some(SourceKind::Assessment)
        } else if self.attempts.is_none() {
            Some(SourceKind::Attempts)
        } else {
            None
        }
    }

    pub fn analyze(&self) -> Result<Vec<RiskProfile>, EngineError> {
        self.analyze_with_rules(&RiskRules::default())
    }

    pub fn analyze_with_rules(&self, rules: &RiskRules) -> Result<Vec<RiskProfile>, EngineError> {
        let attendance = self
            .attendance
            .as_deref()
            .ok_or(EngineError::MissingSource(SourceKind::Attendance))?;
        let assessment = self
            .assessment
            .as_deref()
            .ok_or(EngineError::MissingSource(SourceKind::Assessment))?;
        let attempts = self
            .attempts
            .as_deref()
            .ok_or(EngineError::MissingSource(SourceKind::Attempts))?;

        Ok(analyze_with_rules(attendance, assessment, attempts, rules))
    }
}
