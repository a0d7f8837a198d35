//! Academic records owned by the records-management layer.
//!
//! The conversational subsystem only reads these (plus one grade upsert
//! path that triggers notifications).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: Uuid,
    pub lecturer_id: Uuid,
    pub code: String,
    pub name: String,
}

impl Subject {
    /// Short label used in summaries: the code, or the name when no code is set.
    pub fn label(&self) -> &str {
        if self.code.trim().is_empty() {
            &self.name
        } else {
            &self.code
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub name: String,
    pub max_score: f64,
    /// Percentage weight in `0..=100`.
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub student_id: Uuid,
    pub student_number: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A student as seen on a lecturer's roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub student_number: Option<String>,
}

/// Body of `POST /grades`: create a grade or overwrite the existing one for
/// the same (assessment, student) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeInput {
    pub assessment_id: Uuid,
    pub student_id: Uuid,
    pub student_number: String,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_label_falls_back_to_name() {
        let mut subject = Subject {
            id: Uuid::now_v7(),
            lecturer_id: Uuid::now_v7(),
            code: "MAT101".to_string(),
            name: "Calculus".to_string(),
        };
        assert_eq!(subject.label(), "MAT101");
        subject.code = String::new();
        assert_eq!(subject.label(), "Calculus");
    }

    #[test]
    fn test_grade_input_camel_case() {
        let json = r#"{"assessmentId":"0192b5c8-0000-7000-8000-000000000001","studentId":"0192b5c8-0000-7000-8000-000000000002","studentNumber":"S1","score":42.5}"#;
        let input: GradeInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.student_number, "S1");
        assert_eq!(input.score, 42.5);
    }
}
