use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use docsmith_core::ClassifiedError;
use docsmith_core::models::render::RenderResponseEnvelope;
use tracing::debug;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Response bodies larger than this are refused.
pub const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// One outgoing HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A POST carrying `body` as JSON.
    pub fn post_json(
        url: impl Into<String>,
        body: &serde_json::Value,
    ) -> Result<Self, ClassifiedError> {
        let bytes = serde_json::to_vec(body).map_err(|e| {
            ClassifiedError::validation_with_detail(
                "request body could not be encoded",
                Some(e.to_string()),
            )
        })?;
        Ok(Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(bytes),
        })
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The network boundary shared by the renderer and the collaborator clients.
///
/// Implementations return an envelope for every HTTP status. Only failures
/// that leave no response at all (refused, DNS, timeout, oversized body)
/// come back as errors.
pub trait HttpTransport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> BoxFuture<'_, Result<RenderResponseEnvelope, ClassifiedError>>;
}

/// Blocking `ureq` agent run on tokio's blocking pool.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

impl HttpTransport for UreqTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> BoxFuture<'_, Result<RenderResponseEnvelope, ClassifiedError>> {
        let agent = self.agent.clone();
        let limit = self.max_body_bytes;
        Box::pin(async move {
            tokio::task::spawn_blocking(move || execute_blocking(&agent, request, limit))
                .await
                .map_err(|e| {
                    ClassifiedError::network_with_detail("transport task failed", e.to_string())
                })?
        })
    }
}

fn execute_blocking(
    agent: &ureq::Agent,
    request: HttpRequest,
    limit: u64,
) -> Result<RenderResponseEnvelope, ClassifiedError> {
    debug!(method = request.method.as_str(), url = %request.url, "sending request");

    let result = match request.method {
        HttpMethod::Get => {
            let mut builder = agent.get(request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder.call()
        }
        HttpMethod::Post => {
            let mut builder = agent.post(request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            let body = request.body.unwrap_or_default();
            builder.send(&body[..])
        }
    };
    let mut response = result.map_err(|e| map_ureq_error(&request.url, e))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .with_config()
        .limit(limit)
        .read_to_vec()
        .map_err(|e| map_ureq_error(&request.url, e))?;

    Ok(RenderResponseEnvelope::new(status, headers, body))
}

fn map_ureq_error(url: &str, err: ureq::Error) -> ClassifiedError {
    match err {
        ureq::Error::Timeout(which) => ClassifiedError::network_with_detail(
            "service did not respond in time",
            format!("{which} ({url})"),
        ),
        ureq::Error::HostNotFound => {
            ClassifiedError::network_with_detail("service host not found", url)
        }
        ureq::Error::ConnectionFailed => {
            ClassifiedError::network_with_detail("service unreachable", url)
        }
        ureq::Error::Io(e) => {
            ClassifiedError::network_with_detail("service unreachable", format!("{e} ({url})"))
        }
        ureq::Error::BodyExceedsLimit(limit) => {
            ClassifiedError::decode(format!("response body exceeds {limit} bytes"), None)
        }
        ureq::Error::BadUri(uri) => {
            ClassifiedError::validation_with_detail("invalid service URL", Some(uri))
        }
        other => ClassifiedError::network_with_detail("request failed", other.to_string()),
    }
}
