//! One-line renderings of records used inside the snapshot lists.

use std::collections::HashMap;

use gradepal_types::identity::ChatUser;
use gradepal_types::records::{Assessment, Grade, StudentProfile, Subject};
use gradepal_types::snapshot::GpaSummary;
use uuid::Uuid;

/// `User: name | Role: role[ | Student number: n]`
pub fn profile_line(user: &ChatUser) -> String {
    let mut parts = vec![format!("User: {}", user.username), format!("Role: {}", user.role)];
    if let Some(number) = user.student_number.as_deref().filter(|n| !n.trim().is_empty()) {
        parts.push(format!("Student number: {number}"));
    }
    parts.join(" | ")
}

/// `CODE: Name`
pub fn subject_line(subject: &Subject) -> String {
    format!("{}: {}", subject.label(), subject.name)
}

/// `CODE — Name (weight W%, max M, N grades recorded)`
pub fn assessment_line(
    assessment: &Assessment,
    subjects: &HashMap<Uuid, &Subject>,
    grade_count: u64,
) -> String {
    let subject = subjects
        .get(&assessment.subject_id)
        .map(|s| s.label())
        .unwrap_or("Unknown subject");
    format!(
        "{subject} — {} (weight {}%, max {}, {grade_count} grades recorded)",
        assessment.name, assessment.weight, assessment.max_score
    )
}

/// `CODE — Assessment: S/M (weight W%)`
pub fn student_grade_line(
    grade: &Grade,
    assessments: &HashMap<Uuid, &Assessment>,
    subjects: &HashMap<Uuid, &Subject>,
) -> String {
    format!(
        "{}: {}",
        grade_target(grade, assessments, subjects, " — "),
        score_suffix(grade, assessments)
    )
}

/// `STUDENTNO — CODE / Assessment: S/M (weight W%)`
pub fn recent_grade_line(
    grade: &Grade,
    assessments: &HashMap<Uuid, &Assessment>,
    subjects: &HashMap<Uuid, &Subject>,
) -> String {
    let student = if grade.student_number.trim().is_empty() {
        "Student"
    } else {
        &grade.student_number
    };
    format!(
        "{student} — {}: {}",
        grade_target(grade, assessments, subjects, " / "),
        score_suffix(grade, assessments)
    )
}

/// `Full Name (studentNumber)`, falling back to the username.
pub fn student_line(student: &StudentProfile) -> String {
    let name = if student.full_name.trim().is_empty() {
        &student.username
    } else {
        &student.full_name
    };
    let key = student
        .student_number
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(&student.username);
    format!("{name} ({key})")
}

/// `GPA 3.55 | 71.0% across 2 assessments (recorded weight 100%)`
pub fn student_stats_line(gpa: &GpaSummary) -> String {
    format!(
        "GPA {:.2} | {:.1}% across {} assessments (recorded weight {}%)",
        gpa.gpa, gpa.percentage, gpa.graded_assessments, gpa.recorded_weight
    )
}

pub fn lecturer_stats_line(subjects: usize, assessments: usize, grades: usize) -> String {
    format!(
        "Role: lecturer. Total subjects: {subjects}. Total assessments: {assessments}. Recorded grades (your subjects): {grades}."
    )
}

fn grade_target(
    grade: &Grade,
    assessments: &HashMap<Uuid, &Assessment>,
    subjects: &HashMap<Uuid, &Subject>,
    separator: &str,
) -> String {
    let assessment = assessments.get(&grade.assessment_id);
    let subject = assessment
        .and_then(|a| subjects.get(&a.subject_id))
        .map(|s| s.label())
        .unwrap_or("Subject");
    let name = assessment.map(|a| a.name.as_str()).unwrap_or("Assessment");
    format!("{subject}{separator}{name}")
}

fn score_suffix(grade: &Grade, assessments: &HashMap<Uuid, &Assessment>) -> String {
    match assessments.get(&grade.assessment_id) {
        Some(a) => format!("{}/{} (weight {}%)", grade.score, a.max_score, a.weight),
        None => format!("{}/? (weight 0%)", grade.score),
    }
}
