//! RecordsRepository trait definition.

use gradepal_types::error::RepositoryError;
use gradepal_types::records::{Assessment, Grade, GradeInput, StudentProfile, Subject};
use uuid::Uuid;

use std::collections::HashMap;

/// Queries over subjects, enrollments, assessments and grades.
///
/// Implementations live in gradepal-infra (e.g., `SqliteRecordsRepository`).
pub trait RecordsRepository: Send + Sync {
    /// Subjects taught by a lecturer, ordered by name.
    fn subjects_for_lecturer(
        &self,
        lecturer_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Subject>, RepositoryError>> + Send;

    /// Subjects a student is enrolled in, ordered by name.
    fn subjects_for_student(
        &self,
        student_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Subject>, RepositoryError>> + Send;

    /// Assessments under the given subjects, newest first.
    fn assessments_for_subjects(
        &self,
        subject_ids: &[Uuid],
    ) -> impl std::future::Future<Output = Result<Vec<Assessment>, RepositoryError>> + Send;

    /// Look up assessments by id, in no particular order.
    fn assessments_by_ids(
        &self,
        assessment_ids: &[Uuid],
    ) -> impl std::future::Future<Output = Result<Vec<Assessment>, RepositoryError>> + Send;

    /// Number of grades recorded per assessment. Assessments without grades
    /// may be absent from the map.
    fn grade_counts(
        &self,
        assessment_ids: &[Uuid],
    ) -> impl std::future::Future<Output = Result<HashMap<Uuid, u64>, RepositoryError>> + Send;

    /// Every grade recorded under a student number, newest first.
    fn grades_for_student_number(
        &self,
        student_number: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Grade>, RepositoryError>> + Send;

    /// Grades recorded against the given assessments, newest first.
    fn grades_for_assessments(
        &self,
        assessment_ids: &[Uuid],
    ) -> impl std::future::Future<Output = Result<Vec<Grade>, RepositoryError>> + Send;

    /// Distinct students enrolled in any subject of the lecturer, ordered by
    /// full name.
    fn students_for_lecturer(
        &self,
        lecturer_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<StudentProfile>, RepositoryError>> + Send;

    /// The subject an assessment belongs to.
    fn subject_for_assessment(
        &self,
        assessment_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Subject>, RepositoryError>> + Send;

    /// Create the grade for (assessment, student), or overwrite its score.
    fn upsert_grade(
        &self,
        input: &GradeInput,
    ) -> impl std::future::Future<Output = Result<Grade, RepositoryError>> + Send;
}
