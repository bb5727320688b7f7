use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use docsmith_core::ClassifiedError;
use docsmith_core::error::{PREVIEW_LIMIT, truncate_preview};
use docsmith_core::template_files::{template_path_segment, validate_template_id};
use docsmith_render::{BoxFuture, HttpRequest, HttpTransport};
use tracing::{debug, info};

use crate::http;

const SERVICE: &str = "template service";

/// Listed ahead of every other template.
pub const PRIMARY_TEMPLATE: &str = "standard_invoice.fo.vm";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where templates are listed and their source text is fetched.
pub trait TemplateCatalog: Send + Sync {
    fn list_templates(&self) -> BoxFuture<'_, Result<Vec<String>, ClassifiedError>>;

    fn fetch_content<'a>(
        &'a self,
        template_id: &'a str,
    ) -> BoxFuture<'a, Result<String, ClassifiedError>>;
}

pub struct HttpTemplateCatalog {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    timeout: Duration,
}

impl HttpTemplateCatalog {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn list_url(&self) -> String {
        format!("{}/api/templates", self.base_url)
    }

    pub fn content_url(&self, template_id: &str) -> String {
        format!("{}/api/templates/{}/content", self.base_url, template_path_segment(template_id))
    }

    async fn list(&self) -> Result<Vec<String>, ClassifiedError> {
        let request = HttpRequest::get(self.list_url()).with_header("Accept", "application/json");
        let envelope = http::send(self.transport.as_ref(), request, self.timeout, SERVICE).await?;
        if !http::is_success(&envelope) {
            return Err(http::status_error(&envelope, SERVICE));
        }

        let text = http::body_text(&envelope, SERVICE)?;
        let names = parse_template_list(&text)?;
        info!(count = names.len(), "listed templates");
        Ok(names)
    }

    async fn content(&self, template_id: &str) -> Result<String, ClassifiedError> {
        validate_template_id(template_id)?;

        let request =
            HttpRequest::get(self.content_url(template_id)).with_header("Accept", "text/plain");
        let envelope = http::send(self.transport.as_ref(), request, self.timeout, SERVICE).await?;
        if envelope.status() == 404 {
            return Err(ClassifiedError::validation_with_detail(
                "template not found",
                Some(template_id.to_string()),
            ));
        }
        if !http::is_success(&envelope) {
            return Err(http::status_error(&envelope, SERVICE));
        }

        let text = http::body_text(&envelope, SERVICE)?;
        debug!(template_id, chars = text.chars().count(), "fetched template content");
        Ok(text)
    }
}

impl TemplateCatalog for HttpTemplateCatalog {
    fn list_templates(&self) -> BoxFuture<'_, Result<Vec<String>, ClassifiedError>> {
        Box::pin(self.list())
    }

    fn fetch_content<'a>(
        &'a self,
        template_id: &'a str,
    ) -> BoxFuture<'a, Result<String, ClassifiedError>> {
        Box::pin(self.content(template_id))
    }
}

/// Accepts a bare JSON array of names or `{"templates": [...]}`.
pub fn parse_template_list(text: &str) -> Result<Vec<String>, ClassifiedError> {
    let json: serde_json::Value = serde_json::from_str(text).map_err(|_| not_a_list(text))?;
    let items = match &json {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => match map.get("templates") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err(not_a_list(text)),
        },
        _ => return Err(not_a_list(text)),
    };

    let mut names: Vec<String> = items
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::to_string)
        .collect();
    sort_templates(&mut names);
    Ok(names)
}

/// [`PRIMARY_TEMPLATE`] first, then alphabetical.
pub fn sort_templates(names: &mut [String]) {
    names.sort_by(|a, b| match (a == PRIMARY_TEMPLATE, b == PRIMARY_TEMPLATE) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.cmp(b),
    });
}

fn not_a_list(text: &str) -> ClassifiedError {
    ClassifiedError::decode(
        "template service did not return a template list",
        Some(truncate_preview(text, PREVIEW_LIMIT)),
    )
}
