//! Response disambiguation.
//!
//! The rendering service's `Content-Type` is not reliable: PDFs arrive as
//! raw binary, as base64 text labelled `text/plain` or `application/json`,
//! or as a JSON string literal wrapping base64. Error payloads can also
//! arrive with a 200. Classification is content-based. Only an explicit
//! `application/pdf` is trusted as-is.
//!
//! Order of checks:
//!
//! 1. Status: 5xx is `ServerRejected`, 4xx is `ValidationFailure`,
//!    anything else outside 2xx is `DecodeFailure`.
//! 2. Empty body: `DecodeFailure`.
//! 3. Declared `application/pdf`: wrapped verbatim.
//! 4. Body starting with `%PDF`: mislabeled binary, wrapped verbatim.
//! 5. Base64 text (signature prefix or pure base64 alphabet) that decodes
//!    to `%PDF`: decoded artifact.
//! 6. JSON: a string literal is unwrapped and tried as base64 once; an
//!    `{error, details}` object is `ServerRejected`.
//! 7. Anything else: `DecodeFailure` with a truncated preview.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use docsmith_core::ClassifiedError;
use docsmith_core::error::{PREVIEW_LIMIT, truncate_preview};
use docsmith_core::models::render::{PDF_SIGNATURE, PdfArtifact, RenderResponseEnvelope};

/// `%PDF-` in base64.
const BASE64_PDF_PREFIX: &str = "JVBERi0";

const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// What the body turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Raw PDF bytes, declared or sniffed.
    BinaryPdf,
    /// Base64 text that decoded to a PDF.
    Base64Pdf,
    /// Text that is neither a PDF nor a recognizable error.
    PlainText,
    /// A JSON `{error, details}` payload.
    ErrorPayload,
    Empty,
    /// Rejected on status alone.
    RejectedStatus,
}

impl PayloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadKind::BinaryPdf => "binary-pdf",
            PayloadKind::Base64Pdf => "base64-pdf",
            PayloadKind::PlainText => "plain-text",
            PayloadKind::ErrorPayload => "error-payload",
            PayloadKind::Empty => "empty",
            PayloadKind::RejectedStatus => "rejected-status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disambiguation {
    pub payload: PayloadKind,
    pub outcome: Result<PdfArtifact, ClassifiedError>,
}

impl Disambiguation {
    fn new(payload: PayloadKind, outcome: Result<PdfArtifact, ClassifiedError>) -> Self {
        Self { payload, outcome }
    }
}

pub fn classify(envelope: &RenderResponseEnvelope) -> Result<PdfArtifact, ClassifiedError> {
    disambiguate(envelope).outcome
}

pub fn disambiguate(envelope: &RenderResponseEnvelope) -> Disambiguation {
    let status = envelope.status();
    if !(200..300).contains(&status) {
        return Disambiguation::new(PayloadKind::RejectedStatus, Err(status_error(envelope)));
    }

    let body = envelope.body();
    if body.iter().all(u8::is_ascii_whitespace) {
        return Disambiguation::new(
            PayloadKind::Empty,
            Err(ClassifiedError::decode("rendering service returned an empty body", None)),
        );
    }

    if declares_pdf(envelope.content_type()) {
        return Disambiguation::new(
            PayloadKind::BinaryPdf,
            Ok(PdfArtifact::from_declared(body.to_vec())),
        );
    }

    if body.starts_with(PDF_SIGNATURE)
        && let Some(artifact) = PdfArtifact::from_decoded(body.to_vec())
    {
        return Disambiguation::new(PayloadKind::BinaryPdf, Ok(artifact));
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();

    if let Some(artifact) = decode_base64_pdf(text) {
        return Disambiguation::new(PayloadKind::Base64Pdf, Ok(artifact));
    }

    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::String(inner)) => {
            if let Some(artifact) = decode_base64_pdf(inner.trim()) {
                return Disambiguation::new(PayloadKind::Base64Pdf, Ok(artifact));
            }
            Disambiguation::new(PayloadKind::PlainText, Err(not_a_pdf(&inner)))
        }
        Ok(json) => match json_error(&json) {
            Some((message, detail)) => Disambiguation::new(
                PayloadKind::ErrorPayload,
                Err(ClassifiedError::rejected(None, message, detail)),
            ),
            None => Disambiguation::new(PayloadKind::PlainText, Err(not_a_pdf(text))),
        },
        Err(_) => Disambiguation::new(PayloadKind::PlainText, Err(not_a_pdf(text))),
    }
}

fn status_error(envelope: &RenderResponseEnvelope) -> ClassifiedError {
    let status = envelope.status();
    let text = envelope.body_text_lossy();
    let text = text.trim();
    let payload = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|json| json_error(&json));
    let raw = (!text.is_empty()).then(|| truncate_preview(text, PREVIEW_LIMIT));

    match status {
        500.. => {
            let (message, detail) = match payload {
                Some((message, detail)) => (message, detail.or(raw)),
                None if status == 503 => ("rendering service unavailable".to_string(), raw),
                None => (format!("rendering service failed with HTTP {status}"), raw),
            };
            ClassifiedError::rejected(Some(status), message, detail)
        }
        400..500 => {
            let (message, detail) = match payload {
                Some((message, detail)) => (message, detail.or(raw)),
                None => (format!("rendering service rejected the request with HTTP {status}"), raw),
            };
            ClassifiedError::validation_with_detail(message, detail)
        }
        _ => ClassifiedError::decode(
            format!("unexpected status {status} from rendering service"),
            raw,
        ),
    }
}

fn declares_pdf(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/pdf"))
}

/// Decode `text` as base64 when it looks like base64, keeping the result
/// only if it is a PDF. Interior whitespace (line wrapping) is ignored.
fn decode_base64_pdf(text: &str) -> Option<PdfArtifact> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let looks_like_base64 = compact.starts_with(BASE64_PDF_PREFIX)
        || compact
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='));
    if !looks_like_base64 {
        return None;
    }

    LENIENT_BASE64
        .decode(compact.as_bytes())
        .ok()
        .and_then(PdfArtifact::from_decoded)
}

/// Pull `(message, detail)` out of an `{error, details}` object.
fn json_error(json: &serde_json::Value) -> Option<(String, Option<String>)> {
    let object = json.as_object()?;
    let field = |name: &str| {
        object.get(name).and_then(|v| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
    };
    let error = field("error");
    let details = field("details");

    match (error, details) {
        (Some(error), details) => Some((error, details)),
        (None, Some(details)) => Some((details.clone(), Some(details))),
        (None, None) => None,
    }
}

fn not_a_pdf(text: &str) -> ClassifiedError {
    ClassifiedError::decode(
        "rendering service response is not a PDF",
        Some(truncate_preview(text, PREVIEW_LIMIT)),
    )
}
