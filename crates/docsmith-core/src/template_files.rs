//! Template file naming conventions.
//!
//! Pure string functions. The rendering service stores templates as
//! `{stem}.fo.vm`; users refer to them by stem or full file name
//! interchangeably.

use crate::error::ClassifiedError;

pub const TEMPLATE_EXTENSION: &str = ".fo.vm";

/// Strip a trailing `.fo.vm`, if present.
pub fn template_stem(id: &str) -> &str {
    id.strip_suffix(TEMPLATE_EXTENSION).unwrap_or(id)
}

/// The file name the service knows the template by.
pub fn template_file_name(id: &str) -> String {
    format!("{}{TEMPLATE_EXTENSION}", template_stem(id))
}

/// Download name for a template that has been through the modification service.
pub fn modified_download_name(id: &str) -> String {
    format!("modified_{}{TEMPLATE_EXTENSION}", template_stem(id))
}

/// Download name for unmodified template text.
pub fn original_download_name(id: &str) -> String {
    template_file_name(id)
}

pub fn pdf_file_name(id: &str) -> String {
    format!("{}.pdf", template_stem(id))
}

/// The template file name as a URL path segment. Bytes outside the
/// unreserved set are percent-encoded.
pub fn template_path_segment(id: &str) -> String {
    let mut out = String::new();
    for b in template_file_name(id).bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Reject ids that cannot be used as a single URL path segment.
pub fn validate_template_id(id: &str) -> Result<(), ClassifiedError> {
    let stem = template_stem(id);
    if stem.trim().is_empty() {
        return Err(ClassifiedError::validation("template id is empty"));
    }
    if stem.trim() != stem
        || stem.contains(['/', '\\', '?', '#'])
        || stem == "."
        || stem == ".."
        || stem.chars().any(char::is_control)
    {
        return Err(ClassifiedError::validation_with_detail(
            "template id is not a valid template name",
            Some(id.to_string()),
        ));
    }
    Ok(())
}
