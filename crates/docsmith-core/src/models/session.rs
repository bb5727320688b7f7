use serde::{Deserialize, Serialize};

use crate::models::content::TemplateContentVersion;

/// The two wizard steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    SelectTemplate,
    Customize,
}

impl WizardStep {
    /// 1-based step number as shown to the user.
    pub fn number(self) -> u8 {
        match self {
            WizardStep::SelectTemplate => 1,
            WizardStep::Customize => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::SelectTemplate => "Select template",
            WizardStep::Customize => "Customize",
        }
    }
}

/// Wizard session state. Keys serialize 1:1 with the persisted session.
///
/// Mutation goes through `docsmith_session::SessionStore`; this struct is
/// plain data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub step: WizardStep,
    pub selected_template_id: Option<String>,
    pub original_content: Option<TemplateContentVersion>,
    pub modified_content: Option<TemplateContentVersion>,
    #[serde(default)]
    pub last_prompt: String,
}

impl Session {
    /// True when original content has been captured for the selected template.
    pub fn has_fetched_selected(&self) -> bool {
        match (&self.selected_template_id, &self.original_content) {
            (Some(id), Some(original)) => original.belongs_to(id),
            _ => false,
        }
    }
}
