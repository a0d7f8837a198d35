//! The prompt catalog compiled into the binary.

use tracing::debug;

use gradepal_types::identity::UserRole;
use gradepal_types::prompt::Prompt;

const EMBEDDED_CATALOG: &str = include_str!("catalog.json");

/// Read-only set of suggested prompts.
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    prompts: Vec<Prompt>,
}

impl PromptCatalog {
    /// Parse the catalog shipped with the crate.
    pub fn embedded() -> Result<Self, serde_json::Error> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let prompts: Vec<Prompt> = serde_json::from_str(json)?;
        debug!(prompts = prompts.len(), "Prompt catalog loaded");
        Ok(Self { prompts })
    }

    /// Prompts offered to `role`, in catalog order.
    pub fn for_role(&self, role: UserRole) -> Vec<Prompt> {
        self.prompts
            .iter()
            .filter(|p| p.is_for(role))
            .cloned()
            .collect()
    }

    /// Group `prompts` by category, keeping first-seen category order.
    pub fn grouped(prompts: &[Prompt]) -> Vec<(&str, Vec<&Prompt>)> {
        let mut groups: Vec<(&str, Vec<&Prompt>)> = Vec::new();
        for prompt in prompts {
            match groups.iter_mut().find(|(c, _)| *c == prompt.category) {
                Some((_, items)) => items.push(prompt),
                None => groups.push((prompt.category.as_str(), vec![prompt])),
            }
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}
