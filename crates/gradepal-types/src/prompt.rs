//! Suggested conversation starters shown by chat clients.

use serde::{Deserialize, Serialize};

use crate::identity::UserRole;

/// One suggested prompt from the catalog.
///
/// `roles` lists every role the prompt is offered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub roles: Vec<UserRole>,
}

impl Prompt {
    pub fn is_for(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }
}

/// Response body of `GET /prompts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptList {
    pub prompts: Vec<Prompt>,
}
