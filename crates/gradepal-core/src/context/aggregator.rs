//! Context aggregator: records in, bounded snapshot out.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use gradepal_types::config::ContextLimits;
use gradepal_types::error::RepositoryError;
use gradepal_types::identity::{ChatUser, UserRole};
use gradepal_types::records::{Assessment, Subject};
use gradepal_types::snapshot::{AcademicSnapshot, LecturerSnapshot, StudentSnapshot};

use crate::records::repository::RecordsRepository;

use super::gpa::{GradedItem, compute_gpa};
use super::lines;
use super::truncate::cap_list;

/// Builds an [`AcademicSnapshot`] for the caller on every turn.
///
/// Nothing is cached between calls; the GPA is recomputed from a fresh
/// grade query each time.
pub struct ContextAggregator<R: RecordsRepository> {
    records: R,
    limits: ContextLimits,
}

impl<R: RecordsRepository> ContextAggregator<R> {
    pub fn new(records: R, limits: ContextLimits) -> Self {
        Self { records, limits }
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    /// Build the snapshot for `user`, branching entirely on role.
    pub async fn snapshot(&self, user: &ChatUser) -> Result<AcademicSnapshot, RepositoryError> {
        match user.role {
            UserRole::Lecturer => {
                self.lecturer_snapshot(user).await.map(AcademicSnapshot::Lecturer)
            }
            UserRole::Student => self.student_snapshot(user).await.map(AcademicSnapshot::Student),
        }
    }

    async fn student_snapshot(&self, user: &ChatUser) -> Result<StudentSnapshot, RepositoryError> {
        let subjects = self.records.subjects_for_student(&user.id).await?;
        let (assessments, assessment_lines) = self.assessments_with_lines(&subjects).await?;

        let grades = self
            .records
            .grades_for_student_number(user.grade_key())
            .await?;

        // Grades may reference assessments outside current enrollments.
        let graded_ids: Vec<Uuid> = grades.iter().map(|g| g.assessment_id).collect();
        let graded_assessments = self.records.assessments_by_ids(&graded_ids).await?;
        let graded_by_id: HashMap<Uuid, &Assessment> =
            graded_assessments.iter().map(|a| (a.id, a)).collect();

        let gpa = compute_gpa(
            &grades
                .iter()
                .map(|g| {
                    let meta = graded_by_id.get(&g.assessment_id);
                    GradedItem {
                        score: g.score,
                        max_score: meta.map(|a| a.max_score).unwrap_or(0.0),
                        weight: meta.map(|a| a.weight).unwrap_or(0.0),
                    }
                })
                .collect::<Vec<_>>(),
        );

        let subjects_by_id = index_subjects(&subjects);
        let grade_lines = grades
            .iter()
            .map(|g| lines::student_grade_line(g, &graded_by_id, &subjects_by_id))
            .collect();

        debug!(
            user_id = %user.id,
            subjects = subjects.len(),
            assessments = assessments.len(),
            grades = grades.len(),
            "Built student snapshot"
        );

        Ok(StudentSnapshot {
            profile: lines::profile_line(user),
            stats: lines::student_stats_line(&gpa),
            gpa,
            subjects: cap_list(
                subjects.iter().map(lines::subject_line).collect(),
                self.limits.subjects,
            ),
            assessments: cap_list(assessment_lines, self.limits.assessments),
            grades: cap_list(grade_lines, self.limits.grades),
        })
    }

    async fn lecturer_snapshot(
        &self,
        user: &ChatUser,
    ) -> Result<LecturerSnapshot, RepositoryError> {
        let subjects = self.records.subjects_for_lecturer(&user.id).await?;
        let (assessments, assessment_lines) = self.assessments_with_lines(&subjects).await?;

        let students = self.records.students_for_lecturer(&user.id).await?;

        let assessment_ids: Vec<Uuid> = assessments.iter().map(|a| a.id).collect();
        let recent = self.records.grades_for_assessments(&assessment_ids).await?;

        let subjects_by_id = index_subjects(&subjects);
        let assessments_by_id: HashMap<Uuid, &Assessment> =
            assessments.iter().map(|a| (a.id, a)).collect();
        let recent_lines = recent
            .iter()
            .map(|g| lines::recent_grade_line(g, &assessments_by_id, &subjects_by_id))
            .collect();

        debug!(
            user_id = %user.id,
            subjects = subjects.len(),
            assessments = assessments.len(),
            students = students.len(),
            grades = recent.len(),
            "Built lecturer snapshot"
        );

        Ok(LecturerSnapshot {
            profile: lines::profile_line(user),
            stats: lines::lecturer_stats_line(subjects.len(), assessments.len(), recent.len()),
            subjects: cap_list(
                subjects.iter().map(lines::subject_line).collect(),
                self.limits.subjects,
            ),
            assessments: cap_list(assessment_lines, self.limits.assessments),
            students: cap_list(
                students.iter().map(lines::student_line).collect(),
                self.limits.students,
            ),
            recent_grades: cap_list(recent_lines, self.limits.recent_grades),
        })
    }

    /// Assessments under `subjects` (newest first) and their summary lines.
    async fn assessments_with_lines(
        &self,
        subjects: &[Subject],
    ) -> Result<(Vec<Assessment>, Vec<String>), RepositoryError> {
        let subject_ids: Vec<Uuid> = subjects.iter().map(|s| s.id).collect();
        let assessments = self.records.assessments_for_subjects(&subject_ids).await?;
        let ids: Vec<Uuid> = assessments.iter().map(|a| a.id).collect();
        let counts = self.records.grade_counts(&ids).await?;

        let subjects_by_id = index_subjects(subjects);
        let lines = assessments
            .iter()
            .map(|a| {
                let count = counts.get(&a.id).copied().unwrap_or(0);
                lines::assessment_line(a, &subjects_by_id, count)
            })
            .collect();
        Ok((assessments, lines))
    }
}

fn index_subjects(subjects: &[Subject]) -> HashMap<Uuid, &Subject> {
    subjects.iter().map(|s| (s.id, s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryRecords;

    fn limits() -> ContextLimits {
        ContextLimits::default()
    }

    #[tokio::test]
    async fn test_student_snapshot_lists_enrolled_records_and_gpa() {
        let records = InMemoryRecords::default();
        let lecturer = records.add_user("prof", UserRole::Lecturer, None);
        let student = records.add_user("thandi", UserRole::Student, Some("S1001"));
        let maths = records.add_subject(lecturer.id, "MAT101", "Calculus");
        records.enroll(student.id, maths.id);
        let test = records.add_assessment(maths.id, "Test 1", 100.0, 30.0);
        let exam = records.add_assessment(maths.id, "Exam", 100.0, 70.0);
        records.add_grade(test.id, &student, 50.0);
        records.add_grade(exam.id, &student, 80.0);

        let aggregator = ContextAggregator::new(records, limits());
        let snapshot = aggregator.snapshot(&student).await.unwrap();

        let AcademicSnapshot::Student(s) = snapshot else {
            panic!("expected a student snapshot");
        };
        assert_eq!(s.profile, "User: thandi | Role: student | Student number: S1001");
        assert_eq!(s.stats, "GPA 3.55 | 71.0% across 2 assessments (recorded weight 100%)");
        assert_eq!(s.subjects, vec!["MAT101: Calculus".to_string()]);
        assert_eq!(s.assessments.len(), 2);
        assert!(
            s.assessments
                .iter()
                .any(|l| l == "MAT101 — Exam (weight 70%, max 100, 1 grades recorded)")
        );
        assert_eq!(s.grades.len(), 2);
        assert!(s.grades.iter().any(|l| l == "MAT101 — Test 1: 50/100 (weight 30%)"));
    }

    #[tokio::test]
    async fn test_student_without_grades_has_zero_gpa() {
        let records = InMemoryRecords::default();
        let student = records.add_user("new", UserRole::Student, None);
        let aggregator = ContextAggregator::new(records, limits());

        let AcademicSnapshot::Student(s) = aggregator.snapshot(&student).await.unwrap() else {
            panic!("expected a student snapshot");
        };
        assert_eq!(s.gpa.graded_assessments, 0);
        assert_eq!(s.stats, "GPA 0.00 | 0.0% across 0 assessments (recorded weight 0%)");
        assert!(s.subjects.is_empty());
        assert!(s.grades.is_empty());
    }

    #[tokio::test]
    async fn test_lecturer_snapshot_has_roster_and_recent_grades() {
        let records = InMemoryRecords::default();
        let lecturer = records.add_user("prof", UserRole::Lecturer, None);
        let other = records.add_user("other", UserRole::Lecturer, None);
        let student = records.add_user("thandi", UserRole::Student, Some("S1001"));
        let maths = records.add_subject(lecturer.id, "MAT101", "Calculus");
        let history = records.add_subject(other.id, "HIS200", "History");
        records.enroll(student.id, maths.id);
        records.enroll(student.id, history.id);
        let mine = records.add_assessment(maths.id, "Test 1", 50.0, 20.0);
        let theirs = records.add_assessment(history.id, "Essay", 100.0, 50.0);
        records.add_grade(mine.id, &student, 40.0);
        records.add_grade(theirs.id, &student, 90.0);

        let aggregator = ContextAggregator::new(records, limits());
        let AcademicSnapshot::Lecturer(l) = aggregator.snapshot(&lecturer).await.unwrap() else {
            panic!("expected a lecturer snapshot");
        };

        assert_eq!(
            l.stats,
            "Role: lecturer. Total subjects: 1. Total assessments: 1. Recorded grades (your subjects): 1."
        );
        assert_eq!(l.subjects, vec!["MAT101: Calculus".to_string()]);
        assert_eq!(l.students.len(), 1);
        assert!(l.students[0].contains("S1001"));
        assert_eq!(
            l.recent_grades,
            vec!["S1001 — MAT101 / Test 1: 40/50 (weight 20%)".to_string()]
        );
    }

    #[tokio::test]
    async fn test_lists_are_capped_with_omission_marker() {
        let records = InMemoryRecords::default();
        let lecturer = records.add_user("prof", UserRole::Lecturer, None);
        for i in 0..30 {
            records.add_subject(lecturer.id, &format!("S{i:02}"), &format!("Subject {i:02}"));
        }

        let aggregator = ContextAggregator::new(records, limits());
        let snapshot = aggregator.snapshot(&lecturer).await.unwrap();
        let subjects = snapshot.subjects();
        assert_eq!(subjects.len(), 25);
        assert_eq!(subjects[24], "…and 6 more");
    }

    #[tokio::test]
    async fn test_gpa_is_recomputed_on_every_call() {
        let records = InMemoryRecords::default();
        let lecturer = records.add_user("prof", UserRole::Lecturer, None);
        let student = records.add_user("thandi", UserRole::Student, Some("S1001"));
        let maths = records.add_subject(lecturer.id, "MAT101", "Calculus");
        records.enroll(student.id, maths.id);
        let test = records.add_assessment(maths.id, "Test 1", 100.0, 50.0);

        let aggregator = ContextAggregator::new(records, limits());
        let before = aggregator.snapshot(&student).await.unwrap();
        aggregator.records().add_grade(test.id, &student, 90.0);
        let after = aggregator.snapshot(&student).await.unwrap();

        assert!(before.stats().starts_with("GPA 0.00"));
        assert!(after.stats().starts_with("GPA 4.50"));
    }
}
