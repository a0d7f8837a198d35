//! SQLite academic records repository.
//!
//! Implements `RecordsRepository` from `gradepal-core`. The inherent
//! `create_*`/`enroll` methods are the seeding path used by the operator CLI
//! and tests; record management proper lives outside this service.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use gradepal_core::records::repository::RecordsRepository;
use gradepal_types::error::RepositoryError;
use gradepal_types::records::{Assessment, Grade, GradeInput, StudentProfile, Subject};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid, query_error};

/// SQLite-backed implementation of `RecordsRepository`.
#[derive(Clone)]
pub struct SqliteRecordsRepository {
    pool: DatabasePool,
}

impl SqliteRecordsRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub async fn create_subject(
        &self,
        lecturer_id: &Uuid,
        code: &str,
        name: &str,
    ) -> Result<Subject, RepositoryError> {
        let subject = Subject {
            id: Uuid::now_v7(),
            lecturer_id: *lecturer_id,
            code: code.to_string(),
            name: name.to_string(),
        };
        sqlx::query(
            "INSERT INTO subjects (id, lecturer_id, code, name, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(subject.id.to_string())
        .bind(subject.lecturer_id.to_string())
        .bind(&subject.code)
        .bind(&subject.name)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;
        Ok(subject)
    }

    pub async fn enroll(
        &self,
        student_id: &Uuid,
        subject_id: &Uuid,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT OR IGNORE INTO enrollments (student_id, subject_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(student_id.to_string())
        .bind(subject_id.to_string())
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;
        Ok(())
    }

    pub async fn create_assessment(
        &self,
        subject_id: &Uuid,
        name: &str,
        max_score: f64,
        weight: f64,
    ) -> Result<Assessment, RepositoryError> {
        let assessment = Assessment {
            id: Uuid::now_v7(),
            subject_id: *subject_id,
            name: name.to_string(),
            max_score,
            weight,
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"INSERT INTO assessments (id, subject_id, name, max_score, weight, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(assessment.id.to_string())
        .bind(assessment.subject_id.to_string())
        .bind(&assessment.name)
        .bind(assessment.max_score)
        .bind(assessment.weight)
        .bind(format_datetime(&assessment.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;
        Ok(assessment)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn subject_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Subject, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_error)?;
    let lecturer_id: String = row.try_get("lecturer_id").map_err(query_error)?;
    Ok(Subject {
        id: parse_uuid(&id, "subject id")?,
        lecturer_id: parse_uuid(&lecturer_id, "lecturer_id")?,
        code: row.try_get("code").map_err(query_error)?,
        name: row.try_get("name").map_err(query_error)?,
    })
}

fn assessment_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Assessment, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_error)?;
    let subject_id: String = row.try_get("subject_id").map_err(query_error)?;
    let created_at: String = row.try_get("created_at").map_err(query_error)?;
    Ok(Assessment {
        id: parse_uuid(&id, "assessment id")?,
        subject_id: parse_uuid(&subject_id, "subject_id")?,
        name: row.try_get("name").map_err(query_error)?,
        max_score: row.try_get("max_score").map_err(query_error)?,
        weight: row.try_get("weight").map_err(query_error)?,
        created_at: parse_datetime(&created_at)?,
    })
}

fn grade_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Grade, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_error)?;
    let assessment_id: String = row.try_get("assessment_id").map_err(query_error)?;
    let student_id: String = row.try_get("student_id").map_err(query_error)?;
    let created_at: String = row.try_get("created_at").map_err(query_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(query_error)?;
    Ok(Grade {
        id: parse_uuid(&id, "grade id")?,
        assessment_id: parse_uuid(&assessment_id, "assessment_id")?,
        student_id: parse_uuid(&student_id, "student_id")?,
        student_number: row.try_get("student_number").map_err(query_error)?,
        score: row.try_get("score").map_err(query_error)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

/// `?, ?, ?` for an IN list of `n` ids.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

// ---------------------------------------------------------------------------
// RecordsRepository implementation
// ---------------------------------------------------------------------------

impl RecordsRepository for SqliteRecordsRepository {
    async fn subjects_for_lecturer(
        &self,
        lecturer_id: &Uuid,
    ) -> Result<Vec<Subject>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM subjects WHERE lecturer_id = ? ORDER BY name ASC")
            .bind(lecturer_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;
        rows.iter().map(subject_from_row).collect()
    }

    async fn subjects_for_student(
        &self,
        student_id: &Uuid,
    ) -> Result<Vec<Subject>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT s.* FROM subjects s
               JOIN enrollments e ON e.subject_id = s.id
               WHERE e.student_id = ?
               ORDER BY s.name ASC"#,
        )
        .bind(student_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        rows.iter().map(subject_from_row).collect()
    }

    async fn assessments_for_subjects(
        &self,
        subject_ids: &[Uuid],
    ) -> Result<Vec<Assessment>, RepositoryError> {
        if subject_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM assessments WHERE subject_id IN ({}) ORDER BY created_at DESC, id DESC",
            placeholders(subject_ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in subject_ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool.reader).await.map_err(query_error)?;
        rows.iter().map(assessment_from_row).collect()
    }

    async fn assessments_by_ids(
        &self,
        assessment_ids: &[Uuid],
    ) -> Result<Vec<Assessment>, RepositoryError> {
        if assessment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM assessments WHERE id IN ({})",
            placeholders(assessment_ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in assessment_ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool.reader).await.map_err(query_error)?;
        rows.iter().map(assessment_from_row).collect()
    }

    async fn grade_counts(
        &self,
        assessment_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, u64>, RepositoryError> {
        if assessment_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT assessment_id, COUNT(*) AS cnt FROM grades WHERE assessment_id IN ({}) GROUP BY assessment_id",
            placeholders(assessment_ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in assessment_ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool.reader).await.map_err(query_error)?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("assessment_id").map_err(query_error)?;
            let count: i64 = row.try_get("cnt").map_err(query_error)?;
            counts.insert(parse_uuid(&id, "assessment_id")?, count.max(0) as u64);
        }
        Ok(counts)
    }

    async fn grades_for_student_number(
        &self,
        student_number: &str,
    ) -> Result<Vec<Grade>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM grades WHERE student_number = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(student_number)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;
        rows.iter().map(grade_from_row).collect()
    }

    async fn grades_for_assessments(
        &self,
        assessment_ids: &[Uuid],
    ) -> Result<Vec<Grade>, RepositoryError> {
        if assessment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM grades WHERE assessment_id IN ({}) ORDER BY created_at DESC, id DESC",
            placeholders(assessment_ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in assessment_ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool.reader).await.map_err(query_error)?;
        rows.iter().map(grade_from_row).collect()
    }

    async fn students_for_lecturer(
        &self,
        lecturer_id: &Uuid,
    ) -> Result<Vec<StudentProfile>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT DISTINCT u.id, u.username, u.full_name, u.student_number
               FROM users u
               JOIN enrollments e ON e.student_id = u.id
               JOIN subjects s ON s.id = e.subject_id
               WHERE s.lecturer_id = ? AND u.role = 'student'
               ORDER BY u.full_name ASC, u.username ASC"#,
        )
        .bind(lecturer_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut students = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id").map_err(query_error)?;
            students.push(StudentProfile {
                id: parse_uuid(&id, "user id")?,
                username: row.try_get("username").map_err(query_error)?,
                full_name: row.try_get("full_name").map_err(query_error)?,
                student_number: row.try_get("student_number").map_err(query_error)?,
            });
        }
        Ok(students)
    }

    async fn subject_for_assessment(
        &self,
        assessment_id: &Uuid,
    ) -> Result<Option<Subject>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT s.* FROM subjects s
               JOIN assessments a ON a.subject_id = s.id
               WHERE a.id = ?"#,
        )
        .bind(assessment_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;
        row.as_ref().map(subject_from_row).transpose()
    }

    async fn upsert_grade(&self, input: &GradeInput) -> Result<Grade, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let row = sqlx::query(
            r#"INSERT INTO grades (id, assessment_id, student_id, student_number, score, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (assessment_id, student_id) DO UPDATE SET
                   score = excluded.score,
                   student_number = excluded.student_number,
                   updated_at = excluded.updated_at
               RETURNING *"#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(input.assessment_id.to_string())
        .bind(input.student_id.to_string())
        .bind(&input.student_number)
        .bind(input.score)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepositoryError::NotFound,
            other => query_error(other),
        })?;
        grade_from_row(&row)
    }
}
