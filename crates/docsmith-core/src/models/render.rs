use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ClassifiedError;
use crate::template_files;

/// The 4-byte ASCII signature every PDF begins with.
pub const PDF_SIGNATURE: &[u8; 4] = b"%PDF";

/// How the rendering service is asked to locate the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// The service loads the template by its id.
    ByName,
    /// The template text travels inline with the request.
    ByContent,
}

impl RenderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderMode::ByName => "by-name",
            RenderMode::ByContent => "by-content",
        }
    }
}

/// A validated render request. Construct through [`RenderRequest::by_name`]
/// or [`RenderRequest::by_content`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    mode: RenderMode,
    template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl RenderRequest {
    pub fn by_name(template_id: impl Into<String>) -> Result<Self, ClassifiedError> {
        let template_id = template_id.into();
        template_files::validate_template_id(&template_id)?;
        Ok(Self {
            mode: RenderMode::ByName,
            template_id,
            content: None,
        })
    }

    pub fn by_content(
        template_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, ClassifiedError> {
        let template_id = template_id.into();
        let content = content.into();
        template_files::validate_template_id(&template_id)?;
        if content.trim().is_empty() {
            return Err(ClassifiedError::validation(
                "cannot render by content: template content is empty",
            ));
        }
        Ok(Self {
            mode: RenderMode::ByContent,
            template_id,
            content: Some(content),
        })
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// Raw transport result. Untrusted until classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResponseEnvelope {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RenderResponseEnvelope {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup. Returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A canonical PDF byte buffer, ready for preview or download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfArtifact {
    bytes: Vec<u8>,
}

impl PdfArtifact {
    /// Build an artifact from decoded bytes. Returns `None` unless the bytes
    /// start with [`PDF_SIGNATURE`].
    pub fn from_decoded(bytes: Vec<u8>) -> Option<Self> {
        if bytes.starts_with(PDF_SIGNATURE) {
            Some(Self { bytes })
        } else {
            None
        }
    }

    /// Wrap bytes the server explicitly declared as `application/pdf`.
    ///
    /// The signature is checked as a sanity assertion only: a missing
    /// signature is logged, the bytes are kept as-is.
    pub fn from_declared(bytes: Vec<u8>) -> Self {
        if !bytes.starts_with(PDF_SIGNATURE) {
            warn!(
                size_bytes = bytes.len(),
                "declared application/pdf body does not start with %PDF"
            );
        }
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn has_signature(&self) -> bool {
        self.bytes.starts_with(PDF_SIGNATURE)
    }
}
