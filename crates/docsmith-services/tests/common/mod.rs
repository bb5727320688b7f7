#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use docsmith_core::ClassifiedError;
use docsmith_core::models::render::RenderResponseEnvelope;
use docsmith_render::{BoxFuture, HttpRequest, HttpTransport};

/// Answers by URL. Unknown URLs get a 404.
#[derive(Default)]
pub struct RoutedTransport {
    routes: HashMap<String, (Duration, Result<RenderResponseEnvelope, ClassifiedError>)>,
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl RoutedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(
        mut self,
        url: &str,
        result: Result<RenderResponseEnvelope, ClassifiedError>,
    ) -> Self {
        self.routes.insert(url.to_string(), (Duration::ZERO, result));
        self
    }

    pub fn slow_route(
        mut self,
        url: &str,
        delay: Duration,
        envelope: RenderResponseEnvelope,
    ) -> Self {
        self.routes.insert(url.to_string(), (delay, Ok(envelope)));
        self
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for RoutedTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> BoxFuture<'_, Result<RenderResponseEnvelope, ClassifiedError>> {
        let not_found = RenderResponseEnvelope::new(404, Vec::new(), Vec::new());
        let (delay, result) = self
            .routes
            .get(&request.url)
            .cloned()
            .unwrap_or((Duration::ZERO, Ok(not_found)));
        self.requests.lock().unwrap().push(request);
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }
}

pub fn ok_text(body: &str) -> Result<RenderResponseEnvelope, ClassifiedError> {
    Ok(RenderResponseEnvelope::new(200, Vec::new(), body.as_bytes().to_vec()))
}

pub fn status(code: u16, body: &str) -> Result<RenderResponseEnvelope, ClassifiedError> {
    Ok(RenderResponseEnvelope::new(code, Vec::new(), body.as_bytes().to_vec()))
}
