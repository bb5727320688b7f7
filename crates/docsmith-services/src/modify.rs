use std::sync::Arc;
use std::time::Duration;

use docsmith_core::ClassifiedError;
use docsmith_core::models::render::RenderResponseEnvelope;
use docsmith_render::{BoxFuture, HttpRequest, HttpTransport};
use serde::Serialize;
use tracing::{info, warn};

use crate::http;

const SERVICE: &str = "modification service";

/// Model calls routinely take longer than a render.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Read the `X-*-Tokens` headers. `None` unless all three parse.
    pub fn from_headers(envelope: &RenderResponseEnvelope) -> Option<Self> {
        let read = |name: &str| -> Option<u64> { envelope.header(name)?.trim().parse().ok() };
        Some(Self {
            prompt_tokens: read("X-Prompt-Tokens")?,
            completion_tokens: read("X-Completion-Tokens")?,
            total_tokens: read("X-Total-Tokens")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifiedTemplate {
    pub text: String,
    pub usage: Option<TokenUsage>,
    /// Output is less than half the size of the input.
    pub possibly_truncated: bool,
}

/// Applies a natural-language instruction to template text.
pub trait TemplateModifier: Send + Sync {
    fn modify<'a>(
        &'a self,
        template_content: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, Result<ModifiedTemplate, ClassifiedError>>;
}

pub struct HttpTemplateModifier {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpTemplateModifier {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn modify_url(&self) -> String {
        format!("{}/api/modify-template", self.base_url)
    }

    async fn request_modification(
        &self,
        template_content: &str,
        prompt: &str,
    ) -> Result<ModifiedTemplate, ClassifiedError> {
        if template_content.trim().is_empty() {
            return Err(ClassifiedError::validation("template content is required"));
        }
        if prompt.trim().is_empty() {
            return Err(ClassifiedError::validation("prompt is required"));
        }
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ClassifiedError::validation(
                "API key is required: set api_key in the config or DOCSMITH_API_KEY",
            ));
        };

        let request = HttpRequest::post_json(
            self.modify_url(),
            &serde_json::json!({
                "template_content": template_content,
                "prompt": prompt,
                "api_key": api_key,
            }),
        )?;
        info!(
            template_chars = template_content.chars().count(),
            prompt_chars = prompt.chars().count(),
            "requesting template modification"
        );

        let envelope = http::send(self.transport.as_ref(), request, self.timeout, SERVICE).await?;
        if !http::is_success(&envelope) {
            return Err(http::status_error(&envelope, SERVICE));
        }

        let raw = http::body_text(&envelope, SERVICE)?;
        let text = strip_code_fence(&raw).to_string();
        if text.trim().is_empty() {
            return Err(ClassifiedError::decode(
                "modification service returned an empty template",
                None,
            ));
        }

        let usage = TokenUsage::from_headers(&envelope);
        let original_chars = template_content.chars().count();
        let modified_chars = text.chars().count();
        let possibly_truncated = modified_chars * 2 < original_chars;
        if possibly_truncated {
            warn!(
                original_chars,
                modified_chars,
                "modified template is much shorter than the original"
            );
        }
        info!(
            modified_chars,
            total_tokens = usage.map(|u| u.total_tokens),
            "template modified"
        );

        Ok(ModifiedTemplate {
            text,
            usage,
            possibly_truncated,
        })
    }
}

impl TemplateModifier for HttpTemplateModifier {
    fn modify<'a>(
        &'a self,
        template_content: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, Result<ModifiedTemplate, ClassifiedError>> {
        Box::pin(self.request_modification(template_content, prompt))
    }
}

/// Keep only the contents of the first fenced code block, if there is one.
pub fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];
    let Some(newline) = after_open.find('\n') else {
        return text;
    };
    let info_string = after_open[..newline].trim();
    if !(info_string.is_empty() || info_string.eq_ignore_ascii_case("xml")) {
        return text;
    }
    let body = &after_open[newline + 1..];
    match body.find("```") {
        Some(close) => &body[..close],
        None => text,
    }
}
