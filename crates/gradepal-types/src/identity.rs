//! Caller identity as supplied by the authentication layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Lecturer,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Student => write!(f, "student"),
            UserRole::Lecturer => write!(f, "lecturer"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(UserRole::Student),
            "lecturer" => Ok(UserRole::Lecturer),
            other => Err(format!("invalid user role: '{other}'")),
        }
    }
}

/// The identity a request acts as.
///
/// `student_number` is only meaningful for students; lecturers normally
/// carry `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub student_number: Option<String>,
}

impl ChatUser {
    /// Identifier used to look up a student's own grades.
    ///
    /// Falls back to the username when no student number is on file.
    pub fn grade_key(&self) -> &str {
        self.student_number
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}
