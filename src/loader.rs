use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{AssessmentRecord, AttemptsRecord, AttendanceRecord};

const STUDENT_ID_COLUMN: &str = "StudentID";
const ATTENDANCE_COLUMNS: &[&str] = &["AttendancePercentage"];
const ASSESSMENT_COLUMNS: &[&str] = &["TestScore1", "TestScore2", "TestScore3"];
const ATTEMPTS_COLUMNS: &[&str] = &["AttemptsUsed"];

#[derive(Deserialize)]
struct AttendanceRow {
    #[serde(rename = "StudentID")]
    student_id: String,
    #[serde(rename = "AttendancePercentage", default, deserialize_with = "csv::invalid_option")]
    attendance_percentage: Option<f64>,
}

#[derive(Deserialize)]
struct AssessmentRow {
    #[serde(rename = "StudentID")]
    student_id: String,
    #[serde(rename = "TestScore1", default, deserialize_with = "csv::invalid_option")]
    test_score_1: Option<f64>,
    #[serde(rename = "TestScore2", default, deserialize_with = "csv::invalid_option")]
    test_score_2: Option<f64>,
    #[serde(rename = "TestScore3", default, deserialize_with = "csv::invalid_option")]
    test_score_3: Option<f64>,
}

#[derive(Deserialize)]
struct AttemptsRow {
    #[serde(rename = "StudentID")]
    student_id: String,
    #[serde(rename = "AttemptsUsed", default, deserialize_with = "csv::invalid_option")]
    attempts_used: Option<u32>,
}

pub fn load_attendance(path: &Path) -> anyhow::Result<Vec<AttendanceRecord>> {
    let file = open(path)?;
    load_attendance_from_reader(file).with_context(|| format!("reading {}", path.display()))
}

pub fn load_assessment(path: &Path) -> anyhow::Result<Vec<AssessmentRecord>> {
    let file = open(path)?;
    load_assessment_from_reader(file).with_context(|| format!("reading {}", path.display()))
}

pub fn load_attempts(path: &Path) -> anyhow::Result<Vec<AttemptsRecord>> {
    let file = open(path)?;
    load_attempts_from_reader(file).with_context(|| format!("reading {}", path.display()))
}

pub fn load_attendance_from_reader<R: Read>(reader: R) -> anyhow::Result<Vec<AttendanceRecord>> {
    read_rows::<_, AttendanceRow>(reader, "attendance", ATTENDANCE_COLUMNS).map(|rows| {
        rows.into_iter()
            .map(|row| AttendanceRecord {
                student_id: row.student_id,
                attendance_percentage: percentage(row.attendance_percentage),
            })
            .collect()
    })
}

pub fn load_assessment_from_reader<R: Read>(reader: R) -> anyhow::Result<Vec<AssessmentRecord>> {
    read_rows::<_, AssessmentRow>(reader, "assessment", ASSESSMENT_COLUMNS).map(|rows| {
        rows.into_iter()
            .map(|row| AssessmentRecord {
                student_id: row.student_id,
                test_score_1: percentage(row.test_score_1),
                test_score_2: percentage(row.test_score_2),
                test_score_3: percentage(row.test_score_3),
            })
            .collect()
    })
}

pub fn load_attempts_from_reader<R: Read>(reader: R) -> anyhow::Result<Vec<AttemptsRecord>> {
    read_rows::<_, AttemptsRow>(reader, "attempts", ATTEMPTS_COLUMNS).map(|rows| {
        rows.into_iter()
            .map(|row| AttemptsRecord {
                student_id: row.student_id,
                attempts_used: row.attempts_used,
            })
            .collect()
    })
}

trait HasStudentId {
    fn student_id(&self) -> &str;
}

impl HasStudentId for AttendanceRow {
    fn student_id(&self) -> &str {
        &self.student_id
    }
}

impl HasStudentId for AssessmentRow {
    fn student_id(&self) -> &str {
        &self.student_id
    }
}

impl HasStudentId for AttemptsRow {
    fn student_id(&self) -> &str {
        &self.student_id
    }
}

fn open(path: &Path) -> anyhow::Result<File> {
    File::open(path).with_context(|| format!("failed to open {}", path.display()))
}

fn read_rows<R, T>(reader: R, dataset: &str, columns: &[&str]) -> anyhow::Result<Vec<T>>
where
    R: Read,
    T: DeserializeOwned + HasStudentId,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?;
    let missing: Vec<&str> = std::iter::once(STUDENT_ID_COLUMN)
        .chain(columns.iter().copied())
        .filter(|column| !headers.iter().any(|header| header == *column))
        .collect();
    if !missing.is_empty() {
        bail!(
            "{dataset} file is missing column(s) {}; was the wrong file supplied?",
            missing.join(", ")
        );
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (index, result) in reader.deserialize::<T>().enumerate() {
        let row = result.with_context(|| format!("{dataset} row {}", index + 2))?;
        if row.student_id().is_empty() {
            skipped += 1;
            continue;
        }
        rows.push(row);
    }

    if skipped > 0 {
        warn!(dataset, skipped, "skipped rows with an empty StudentID");
    }
    debug!(dataset, rows = rows.len(), "loaded dataset");

    Ok(rows)
}

/// Percentages and test scores outside 0-100 are treated as unreadable.
fn percentage(value: Option<f64>) -> Option<f64> {
    value.filter(|v| (0.0..=100.0).contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_attendance_and_blanks_bad_numbers() {
        let data = "StudentID,AttendancePercentage\nSTU001,85\nSTU002, n/a \nSTU003,\nSTU004,NaN\nSTU005,150\nSTU006,-5\nSTU007,0\n";
        let records = load_attendance_from_reader(data.as_bytes()).unwrap();
        let values: Vec<(&str, Option<f64>)> = records
            .iter()
            .map(|r| (r.student_id.as_str(), r.attendance_percentage))
            .collect();
        assert_eq!(
            values,
            vec![
                ("STU001", Some(85.0)),
                ("STU002", None),
                ("STU003", None),
                ("STU004", None),
                ("STU005", None),
                ("STU006", None),
                ("STU007", Some(0.0)),
            ]
        );
    }

    #[test]
    fn parses_assessment_scores_in_column_order() {
        let data = "StudentID,TestScore1,TestScore2,TestScore3\nSTU002,45,38,32\nSTU005,80,,abc\nSTU006,101,100,inf\n";
        let records = load_assessment_from_reader(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].scores(), [Some(45.0), Some(38.0), Some(32.0)]);
        assert_eq!(records[1].scores(), [Some(80.0), None, None]);
        assert_eq!(records[2].scores(), [None, Some(100.0), None]);
    }

    #[test]
    fn attempts_must_be_non_negative_integers() {
        let data = "StudentID,AttemptsUsed\nSTU001,1\nSTU002,-1\nSTU003,two\nSTU004,3\n";
        let records = load_attempts_from_reader(data.as_bytes()).unwrap();
        let values: Vec<Option<u32>> = records.iter().map(|r| r.attempts_used).collect();
        assert_eq!(values, vec![Some(1), None, None, Some(3)]);
    }

    #[test]
    fn skips_rows_with_empty_student_id() {
        let data = "StudentID,AttemptsUsed\n,4\n  ,2\nSTU009,0\n";
        let records = load_attempts_from_reader(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].student_id, "STU009");
    }

    #[test]
    fn rejects_file_without_student_id_column() {
        let data = "Name,AttendancePercentage\nAvery,90\n";
        let err = load_attendance_from_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("StudentID"));
    }

    #[test]
    fn rejects_assessment_file_passed_as_attendance() {
        let data = "StudentID,TestScore1,TestScore2,TestScore3\nSTU002,45,38,32\n";
        let err = load_attendance_from_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("AttendancePercentage"));
    }

    #[test]
    fn rejects_attempts_file_passed_as_assessment() {
        let data = "StudentID,AttemptsUsed\nSTU002,3\n";
        let err = load_assessment_from_reader(data.as_bytes()).unwrap_err();
        assert!(err
            .to_string()
            .contains("missing column(s) TestScore1, TestScore2, TestScore3"));
    }

    #[test]
    fn rejects_attendance_file_passed_as_attempts() {
        let data = "StudentID,AttendancePercentage\nSTU002,62\n";
        assert!(load_attempts_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn loads_from_disk_with_path_in_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.csv");
        std::fs::write(&path, "StudentID,AttendancePercentage\nSTU001,72.5\n").unwrap();

        let records = load_attendance(&path).unwrap();
        assert_eq!(records[0].attendance_percentage, Some(72.5));

        let missing = dir.path().join("missing.csv");
        let err = load_attendance(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
    }
}
