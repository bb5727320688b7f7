use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use docsmith_core::ClassifiedError;
use docsmith_core::models::render::{RenderMode, RenderRequest, RenderResponseEnvelope};
use docsmith_core::models::session::Session;
use docsmith_core::template_files::{template_file_name, template_path_segment};
use docsmith_session::lineage::resolve_active_content;
use tracing::{debug, info};
use uuid::Uuid;

use crate::transport::{HttpRequest, HttpTransport};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SAMPLE_TYPE: &str = "invoice";

const ACCEPT: &str = "application/pdf, text/plain, application/json";

/// URLs of the rendering service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEndpoints {
    base_url: String,
    sample_type: String,
}

impl RenderEndpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sample_type: DEFAULT_SAMPLE_TYPE.to_string(),
        }
    }

    pub fn with_sample_type(mut self, sample_type: impl Into<String>) -> Self {
        self.sample_type = sample_type.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn by_content_url(&self) -> String {
        format!("{}/api/render-pdf/content", self.base_url)
    }

    pub fn by_name_url(&self, template_id: &str) -> String {
        format!(
            "{}/api/render-pdf/template/{}/sample/{}",
            self.base_url,
            template_path_segment(template_id),
            self.sample_type
        )
    }

    pub fn http_request(&self, request: &RenderRequest) -> Result<HttpRequest, ClassifiedError> {
        let http = match (request.mode(), request.content()) {
            (RenderMode::ByContent, Some(content)) => HttpRequest::post_json(
                self.by_content_url(),
                &serde_json::json!({
                    "templateName": template_file_name(request.template_id()),
                    "content": content,
                }),
            )?,
            (RenderMode::ByContent, None) => {
                return Err(ClassifiedError::validation(
                    "cannot render by content: template content is empty",
                ));
            }
            (RenderMode::ByName, _) => HttpRequest::post_json(
                self.by_name_url(request.template_id()),
                &serde_json::json!({}),
            )?,
        };
        Ok(http.with_header("Accept", ACCEPT))
    }
}

/// Build the render request for the current session.
///
/// Renders by content whenever the lineage resolves to a version, so the
/// output matches in-memory edits. Falls back to by-name otherwise.
pub fn plan_request(session: &Session) -> Result<RenderRequest, ClassifiedError> {
    let Some(template_id) = session.selected_template_id.as_deref() else {
        return Err(ClassifiedError::validation("no template selected"));
    };
    match resolve_active_content(session) {
        Ok(version) => RenderRequest::by_content(template_id, version.text()),
        Err(_) => RenderRequest::by_name(template_id),
    }
}

/// Sends render requests and hands out render generations.
///
/// Cloning shares the transport and the generation counter.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    endpoints: RenderEndpoints,
    timeout: Duration,
    generation: Arc<AtomicU64>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoints: RenderEndpoints) -> Self {
        Self {
            transport,
            endpoints,
            timeout: DEFAULT_TIMEOUT,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoints(&self) -> &RenderEndpoints {
        &self.endpoints
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start a new generation. Every earlier generation is superseded.
    pub fn begin_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    /// Send one request. Does not touch the session.
    pub async fn dispatch(
        &self,
        request: &RenderRequest,
    ) -> Result<RenderResponseEnvelope, ClassifiedError> {
        let request_id = Uuid::new_v4();
        let http = self
            .endpoints
            .http_request(request)?
            .with_header("X-Request-Id", request_id.to_string());

        info!(
            %request_id,
            mode = request.mode().as_str(),
            template_id = request.template_id(),
            "dispatching render"
        );

        let sent = tokio::time::timeout(self.timeout, self.transport.execute(http)).await;
        let envelope = match sent {
            Ok(result) => result?,
            Err(_) => {
                return Err(ClassifiedError::network_with_detail(
                    "rendering service unreachable: request timed out",
                    format!("no response within {}s", self.timeout.as_secs_f64()),
                ));
            }
        };

        debug!(
            %request_id,
            status = envelope.status(),
            content_type = envelope.content_type().unwrap_or("-"),
            size_bytes = envelope.body().len(),
            "render response received"
        );
        Ok(envelope)
    }
}
