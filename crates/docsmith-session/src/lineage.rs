//! Content lineage: which template version is authoritative right now.
//!
//! Rendering, further modification, and download all resolve through
//! [`resolve_active_content`], so they always agree on one version.

use docsmith_core::ClassifiedError;
use docsmith_core::models::content::{ContentOrigin, TemplateContentVersion};
use docsmith_core::models::session::Session;
use serde::Serialize;

/// Modified content for the selected template wins over original content.
/// Versions captured for any other template id are ignored.
pub fn resolve_active_content(
    session: &Session,
) -> Result<&TemplateContentVersion, ClassifiedError> {
    let Some(selected) = session.selected_template_id.as_deref() else {
        return Err(ClassifiedError::validation("no content available"));
    };

    current_version(session.modified_content.as_ref(), selected)
        .or_else(|| current_version(session.original_content.as_ref(), selected))
        .ok_or_else(|| ClassifiedError::validation("no content available"))
}

fn current_version<'a>(
    version: Option<&'a TemplateContentVersion>,
    selected: &str,
) -> Option<&'a TemplateContentVersion> {
    version.filter(|v| v.belongs_to(selected))
}

/// Read-only lineage summary, as shown by `docsmith status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageSummary {
    pub selected_template_id: Option<String>,
    pub has_original: bool,
    pub has_modified: bool,
    pub active_origin: Option<ContentOrigin>,
    pub active_chars: usize,
}

pub fn describe_lineage(session: &Session) -> LineageSummary {
    let selected = session.selected_template_id.as_deref();
    let for_selected = |v: Option<&TemplateContentVersion>| {
        selected.is_some_and(|id| current_version(v, id).is_some())
    };
    let active = resolve_active_content(session).ok();

    LineageSummary {
        selected_template_id: selected.map(str::to_string),
        has_original: for_selected(session.original_content.as_ref()),
        has_modified: for_selected(session.modified_content.as_ref()),
        active_origin: active.map(|v| v.origin()),
        active_chars: active.map(|v| v.text().chars().count()).unwrap_or(0),
    }
}
