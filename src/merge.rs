use std::collections::HashMap;

use tracing::debug;

use crate::models::{AssessmentRecord, AttemptsRecord, AttendanceRecord, CompositeStudentRecord};

/// Outer-joins the three datasets on student id.
///
/// Output holds one record per distinct id, ordered by first sighting across
/// attendance, then assessment, then attempts. Within a source the last row for
/// an id wins. Rows with an empty id are skipped.
pub fn merge(
    attendance: &[AttendanceRecord],
    assessment: &[AssessmentRecord],
    attempts: &[AttemptsRecord],
) -> Vec<CompositeStudentRecord> {
    let mut builder = MergeBuilder::default();

    for row in attendance {
        if let Some(entry) = builder.entry(&row.student_id, "attendance") {
            if entry.sources.attendance {
                debug!(student_id = %row.student_id, "duplicate attendance row overwrites earlier one");
            }
            entry.attendance_percentage = row.attendance_percentage;
            entry.sources.attendance = true;
        }
    }

    for row in assessment {
        if let Some(entry) = builder.entry(&row.student_id, "assessment") {
            if entry.sources.assessment {
                debug!(student_id = %row.student_id, "duplicate assessment row overwrites earlier one");
            }
            entry.scores = row.scores();
            entry.sources.assessment = true;
        }
    }

    for row in attempts {
        if let Some(entry) = builder.entry(&row.student_id, "attempts") {
            if entry.sources.attempts {
                debug!(student_id = %row.student_id, "duplicate attempts row overwrites earlier one");
            }
            entry.attempts_used = row.attempts_used;
            entry.sources.attempts = true;
        }
    }

    let records = builder.finish();
    debug!(
        attendance = attendance.len(),
        assessment = assessment.len(),
        attempts = attempts.len(),
        students = records.len(),
        "merged datasets"
    );
    records
}

#[derive(Default)]
struct MergeBuilder {
    index: HashMap<String, usize>,
    records: Vec<CompositeStudentRecord>,
}

impl MergeBuilder {
    fn entry(&mut self, student_id: &str, source: &str) -> Option<&mut CompositeStudentRecord> {
        let key = student_id.trim();
        if key.is_empty() {
            debug!(source, "skipping row with empty student id");
            return None;
        }

        let position = match self.index.get(key).copied() {
            Some(position) => position,
            None => {
                self.records.push(CompositeStudentRecord::new(key));
                self.index.insert(key.to_string(), self.records.len() - 1);
                self.records.len() - 1
            }
        };
        self.records.get_mut(position)
    }

    fn finish(self) -> Vec<CompositeStudentRecord> {
        self.records
    }
}
