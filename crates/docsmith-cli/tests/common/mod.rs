#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use docsmith_cli::controller::WizardController;
use docsmith_core::ClassifiedError;
use docsmith_core::models::render::RenderResponseEnvelope;
use docsmith_render::{
    BoxFuture, Dispatcher, HttpRequest, HttpTransport, RenderEndpoints, Renderer, RetryPolicy,
};
use docsmith_services::{ModifiedTemplate, TemplateCatalog, TemplateModifier};
use docsmith_session::{MemoryPersistence, SessionStore};

pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n%%EOF\n";
pub const RENDER_BASE: &str = "http://render.test/velocity-engine-app";

/// In-memory catalog. Templates without content answer with a validation
/// error, as a 404 would.
#[derive(Default)]
pub struct FakeCatalog {
    contents: HashMap<String, String>,
}

impl FakeCatalog {
    pub fn with(mut self, template_id: &str, content: &str) -> Self {
        self.contents.insert(template_id.to_string(), content.to_string());
        self
    }
}

impl TemplateCatalog for FakeCatalog {
    fn list_templates(&self) -> BoxFuture<'_, Result<Vec<String>, ClassifiedError>> {
        let mut names: Vec<String> = self.contents.keys().cloned().collect();
        names.sort();
        Box::pin(async move { Ok(names) })
    }

    fn fetch_content<'a>(
        &'a self,
        template_id: &'a str,
    ) -> BoxFuture<'a, Result<String, ClassifiedError>> {
        Box::pin(async move {
            self.contents.get(template_id).cloned().ok_or_else(|| {
                ClassifiedError::validation_with_detail(
                    "template not found",
                    Some(template_id.to_string()),
                )
            })
        })
    }
}

/// Appends the prompt as an XML comment and records every call.
#[derive(Default)]
pub struct FakeModifier {
    pub calls: Mutex<Vec<(String, String)>>,
}

impl TemplateModifier for FakeModifier {
    fn modify<'a>(
        &'a self,
        template_content: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, Result<ModifiedTemplate, ClassifiedError>> {
        self.calls
            .lock()
            .unwrap()
            .push((template_content.to_string(), prompt.to_string()));
        Box::pin(async move {
            Ok(ModifiedTemplate {
                text: format!("{template_content}<!-- {prompt} -->"),
                usage: None,
                possibly_truncated: false,
            })
        })
    }
}

/// Answers every request with a PDF and records what was sent.
#[derive(Default)]
pub struct PdfTransport {
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl HttpTransport for PdfTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> BoxFuture<'_, Result<RenderResponseEnvelope, ClassifiedError>> {
        self.requests.lock().unwrap().push(request);
        Box::pin(async {
            Ok(RenderResponseEnvelope::new(200, Vec::new(), PDF_BYTES.to_vec())
                .with_header("Content-Type", "application/pdf"))
        })
    }
}

pub struct Harness {
    pub controller: WizardController<MemoryPersistence>,
    pub persistence: MemoryPersistence,
    pub modifier: Arc<FakeModifier>,
    pub transport: Arc<PdfTransport>,
}

pub fn harness(catalog: FakeCatalog) -> Harness {
    let persistence = MemoryPersistence::new();
    let store = SessionStore::start_fresh(persistence.clone()).unwrap();
    let modifier = Arc::new(FakeModifier::default());
    let transport = Arc::new(PdfTransport::default());
    let dispatcher = Dispatcher::new(transport.clone(), RenderEndpoints::new(RENDER_BASE));
    let renderer = Renderer::new(dispatcher).with_policy(RetryPolicy::none());

    Harness {
        controller: WizardController::new(store, Arc::new(catalog), modifier.clone(), renderer),
        persistence,
        modifier,
        transport,
    }
}

pub fn invoice_catalog() -> FakeCatalog {
    FakeCatalog::default()
        .with("standard_invoice", "<fo:root>invoice</fo:root>")
        .with("credit_note", "<fo:root>credit</fo:root>")
}
