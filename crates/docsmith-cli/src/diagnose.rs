//! Direct render diagnostics.
//!
//! Issues a single render call with no retry and reports what came back,
//! using the same classification the wizard uses.

use std::fmt;
use std::time::Duration;

use docsmith_core::ClassifiedError;
use docsmith_core::models::render::{PdfArtifact, RenderRequest};
use docsmith_render::{Dispatcher, PayloadKind, disambiguate};

#[derive(Debug, Clone)]
pub struct DiagnoseReport {
    pub mode: &'static str,
    pub template_id: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub size_bytes: usize,
    pub payload: PayloadKind,
    pub outcome: Result<PdfArtifact, ClassifiedError>,
    pub elapsed: Duration,
}

impl DiagnoseReport {
    pub fn artifact(&self) -> Option<&PdfArtifact> {
        self.outcome.as_ref().ok()
    }
}

/// Send `request` once and classify the response. Only failures that
/// produce no response at all are returned as `Err`.
pub async fn diagnose(
    dispatcher: &Dispatcher,
    request: &RenderRequest,
) -> Result<DiagnoseReport, ClassifiedError> {
    let url = dispatcher.endpoints().http_request(request)?.url;
    let started = tokio::time::Instant::now();
    let envelope = dispatcher.dispatch(request).await?;
    let elapsed = started.elapsed();
    let result = disambiguate(&envelope);

    Ok(DiagnoseReport {
        mode: request.mode().as_str(),
        template_id: request.template_id().to_string(),
        url,
        status: envelope.status(),
        content_type: envelope.content_type().map(str::to_string),
        size_bytes: envelope.body().len(),
        payload: result.payload,
        outcome: result.outcome,
        elapsed,
    })
}

impl fmt::Display for DiagnoseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "╔══════════════════════════════════════════════════╗")?;
        writeln!(f, "║      docsmith render diagnostics                 ║")?;
        writeln!(f, "╠══════════════════════════════════════════════════╣")?;
        writeln!(f, "║  Template:     {:<33} ║", self.template_id)?;
        writeln!(f, "║  Mode:         {:<33} ║", self.mode)?;
        writeln!(f, "║  Status:       {:<33} ║", self.status)?;
        let content_type = self.content_type.as_deref().unwrap_or("(none)");
        writeln!(f, "║  Content-Type: {:<33} ║", content_type)?;
        writeln!(f, "║  Body size:    {:<33} ║", format!("{} bytes", self.size_bytes))?;
        writeln!(f, "║  Payload:      {:<33} ║", self.payload.as_str())?;
        writeln!(f, "║  Elapsed:      {:<33} ║", format!("{} ms", self.elapsed.as_millis()))?;
        writeln!(f, "╚══════════════════════════════════════════════════╝")?;
        writeln!(f, "  URL: {}", self.url)?;
        writeln!(f)?;

        match &self.outcome {
            Ok(artifact) => {
                write!(f, "✅ PDF artifact, {} bytes", artifact.size_bytes())?;
                if !artifact.has_signature() {
                    write!(f, " (warning: no %PDF signature)")?;
                }
                writeln!(f)
            }
            Err(e) => {
                writeln!(f, "❌ {}: {}", e.kind(), e.message())?;
                if let Some(detail) = e.raw_detail() {
                    writeln!(f, "   Detail: {detail}")?;
                }
                writeln!(f, "   {}", e.user_guidance())
            }
        }
    }
}
