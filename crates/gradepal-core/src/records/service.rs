//! Grade write path.

use std::sync::Arc;

use tracing::{info, warn};

use gradepal_types::error::RecordsError;
use gradepal_types::identity::{ChatUser, UserRole};
use gradepal_types::notification::NotificationEvent;
use gradepal_types::records::{Grade, GradeInput};

use super::repository::RecordsRepository;
use crate::notify::bus::NotificationBus;

/// Records grades and announces each write on the notification bus.
pub struct RecordsService<R: RecordsRepository> {
    records: R,
    bus: Arc<NotificationBus>,
}

impl<R: RecordsRepository> RecordsService<R> {
    pub fn new(records: R, bus: Arc<NotificationBus>) -> Self {
        Self { records, bus }
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    /// Create or overwrite a grade as `caller`, then publish `grade_created`
    /// for the affected student.
    ///
    /// Only the lecturer owning the assessment's subject may write. A failed
    /// publish never fails the write.
    pub async fn record_grade(
        &self,
        caller: &ChatUser,
        mut input: GradeInput,
    ) -> Result<Grade, RecordsError> {
        if caller.role != UserRole::Lecturer {
            return Err(RecordsError::Forbidden);
        }
        input.student_number = input.student_number.trim().to_string();
        if input.student_number.is_empty() {
            return Err(RecordsError::Validation("studentNumber is required".to_string()));
        }
        if !input.score.is_finite() || input.score < 0.0 {
            return Err(RecordsError::Validation(
                "score must be a non-negative number".to_string(),
            ));
        }

        let subject = self
            .records
            .subject_for_assessment(&input.assessment_id)
            .await?
            .ok_or(RecordsError::NotFound)?;
        if subject.lecturer_id != caller.id {
            return Err(RecordsError::Forbidden);
        }
        let assessment = self
            .records
            .assessments_by_ids(&[input.assessment_id])
            .await?
            .into_iter()
            .next()
            .ok_or(RecordsError::NotFound)?;
        if assessment.max_score > 0.0 && input.score > assessment.max_score {
            return Err(RecordsError::Validation(
                "Score exceeds assessment maxScore".to_string(),
            ));
        }

        let grade = self.records.upsert_grade(&input).await?;
        info!(
            grade_id = %grade.id,
            assessment_id = %grade.assessment_id,
            student_number = %grade.student_number,
            "Grade recorded"
        );

        let event = NotificationEvent::GradeCreated {
            student_number: grade.student_number.clone(),
        };
        if let Err(e) = self.bus.publish(&event).await {
            warn!(error = %e, "Failed to publish grade notification");
        }
        Ok(grade)
    }
}
