//! The per-turn academic snapshot handed to the prompt builder.
//!
//! Built fresh on every turn and never persisted. The shape differs by role,
//! so it is a sum type rather than one struct with optional lists.

use serde::{Deserialize, Serialize};

/// Weighted performance summary for one student.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpaSummary {
    /// On a 0-5 scale (`percentage / 20`).
    pub gpa: f64,
    pub percentage: f64,
    /// Sum of the weights of graded assessments with a positive weight.
    pub recorded_weight: f64,
    pub graded_assessments: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentSnapshot {
    pub profile: String,
    pub stats: String,
    pub gpa: GpaSummary,
    pub subjects: Vec<String>,
    pub assessments: Vec<String>,
    pub grades: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LecturerSnapshot {
    pub profile: String,
    pub stats: String,
    pub subjects: Vec<String>,
    pub assessments: Vec<String>,
    pub students: Vec<String>,
    pub recent_grades: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum AcademicSnapshot {
    Student(StudentSnapshot),
    Lecturer(LecturerSnapshot),
}

impl AcademicSnapshot {
    pub fn role_label(&self) -> &'static str {
        match self {
            AcademicSnapshot::Student(_) => "student",
            AcademicSnapshot::Lecturer(_) => "lecturer",
        }
    }

    pub fn profile(&self) -> &str {
        match self {
            AcademicSnapshot::Student(s) => &s.profile,
            AcademicSnapshot::Lecturer(l) => &l.profile,
        }
    }

    pub fn stats(&self) -> &str {
        match self {
            AcademicSnapshot::Student(s) => &s.stats,
            AcademicSnapshot::Lecturer(l) => &l.stats,
        }
    }

    pub fn subjects(&self) -> &[String] {
        match self {
            AcademicSnapshot::Student(s) => &s.subjects,
            AcademicSnapshot::Lecturer(l) => &l.subjects,
        }
    }

    pub fn assessments(&self) -> &[String] {
        match self {
            AcademicSnapshot::Student(s) => &s.assessments,
            AcademicSnapshot::Lecturer(l) => &l.assessments,
        }
    }
}
