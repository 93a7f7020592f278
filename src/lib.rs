//! Rule-based dropout risk scoring over attendance, assessment and exam-attempt
//! datasets joined by student id.

pub mod distribution;
pub mod error;
pub mod loader;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod risk;

pub use error::EngineError;
pub use models::{
    AssessmentRecord, AttemptsRecord, AttendanceRecord, CompositeStudentRecord, RiskDistribution,
    RiskFactor, RiskProfile, RiskTier, SourceKind, SourcePresence, TriggeredFactor,
};
pub use pipeline::SourceSet;
pub use risk::{analyze_all_students, analyze_with_rules, RiskRules};

pub fn get_risk_distribution(profiles: &[RiskProfile]) -> RiskDistribution {
    distribution::distribution(profiles)
}
