use serde::{Deserialize, Serialize};

/// Where a piece of template content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentOrigin {
    /// Fetched from the template content service.
    Original,
    /// Produced by the template modification service.
    Modified,
}

impl ContentOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentOrigin::Original => "original",
            ContentOrigin::Modified => "modified",
        }
    }
}

/// An immutable snapshot of template text.
///
/// Each version records the template id it was captured for, so content
/// that belongs to a previously selected template can be told apart from
/// content for the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateContentVersion {
    template_id: String,
    text: String,
    origin: ContentOrigin,
    captured_at: jiff::Timestamp,
}

impl TemplateContentVersion {
    pub fn new(
        template_id: impl Into<String>,
        text: impl Into<String>,
        origin: ContentOrigin,
        captured_at: jiff::Timestamp,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            text: text.into(),
            origin,
            captured_at,
        }
    }

    pub fn original(template_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(template_id, text, ContentOrigin::Original, jiff::Timestamp::now())
    }

    pub fn modified(template_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(template_id, text, ContentOrigin::Modified, jiff::Timestamp::now())
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> ContentOrigin {
        self.origin
    }

    pub fn captured_at(&self) -> jiff::Timestamp {
        self.captured_at
    }

    pub fn belongs_to(&self, template_id: &str) -> bool {
        self.template_id == template_id
    }
}
