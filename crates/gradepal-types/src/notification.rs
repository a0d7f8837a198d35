//! Out-of-band events pushed over the notification stream.

use serde::{Deserialize, Serialize};

/// An event published on the notification bus.
///
/// Serialized as `{"type":"grade_created","student_number":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A grade was written or overwritten for this student.
    GradeCreated { student_number: String },
}
