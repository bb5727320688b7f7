use std::sync::Arc;

use docsmith_core::ClassifiedError;
use docsmith_core::models::content::ContentOrigin;
use docsmith_core::models::render::RenderRequest;
use docsmith_core::models::session::{Session, WizardStep};
use docsmith_core::template_files::{modified_download_name, original_download_name};
use docsmith_render::{RenderOutcome, Renderer, plan_request};
use docsmith_services::{ModifiedTemplate, TemplateCatalog, TemplateModifier};
use docsmith_session::lineage::{LineageSummary, describe_lineage, resolve_active_content};
use docsmith_session::{SessionPersistence, SessionStore};
use tracing::{debug, info, warn};

use crate::error::ControllerError;

/// The active template version, named for saving to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDownload {
    pub file_name: String,
    pub origin: ContentOrigin,
    pub text: String,
}

/// Drives the wizard: the only owner of the session store.
pub struct WizardController<P: SessionPersistence> {
    store: SessionStore<P>,
    catalog: Arc<dyn TemplateCatalog>,
    modifier: Arc<dyn TemplateModifier>,
    renderer: Renderer,
}

impl<P: SessionPersistence> WizardController<P> {
    pub fn new(
        store: SessionStore<P>,
        catalog: Arc<dyn TemplateCatalog>,
        modifier: Arc<dyn TemplateModifier>,
        renderer: Renderer,
    ) -> Self {
        Self {
            store,
            catalog,
            modifier,
            renderer,
        }
    }

    pub fn session(&self) -> &Session {
        self.store.session()
    }

    pub fn step(&self) -> WizardStep {
        self.store.step()
    }

    pub fn lineage(&self) -> LineageSummary {
        describe_lineage(self.store.session())
    }

    pub fn catalog(&self) -> Arc<dyn TemplateCatalog> {
        Arc::clone(&self.catalog)
    }

    /// A handle for running renders off the controller, e.g. in a spawned task.
    pub fn renderer(&self) -> Renderer {
        self.renderer.clone()
    }

    pub async fn list_templates(&self) -> Result<Vec<String>, ControllerError> {
        Ok(self.catalog.list_templates().await?)
    }

    /// Select and fetch in one go. Returns `false` if the fetched content
    /// was not accepted.
    pub async fn select_template(&mut self, template_id: &str) -> Result<bool, ControllerError> {
        self.begin_select(template_id)?;
        let fetched = self.catalog.fetch_content(template_id).await;
        self.complete_fetch(template_id, fetched)
    }

    /// Record the selection. The content fetch is the caller's job; its
    /// result goes to [`complete_fetch`](Self::complete_fetch).
    ///
    /// Renders still in flight belong to the previous choice and are
    /// superseded.
    pub fn begin_select(&mut self, template_id: &str) -> Result<(), ControllerError> {
        self.store.select_template(template_id)?;
        let generation = self.renderer.begin();
        debug!(template_id, generation, "selection supersedes earlier renders");
        Ok(())
    }

    /// Apply a finished content fetch. A fetch for a template that is no
    /// longer selected is dropped, successful or not.
    pub fn complete_fetch(
        &mut self,
        template_id: &str,
        fetched: Result<String, ClassifiedError>,
    ) -> Result<bool, ControllerError> {
        if self.store.session().selected_template_id.as_deref() != Some(template_id) {
            info!(template_id, "ignoring fetch for a template that is no longer selected");
            return Ok(false);
        }
        let text = fetched?;
        Ok(self.store.accept_fetched_content(template_id, text)?)
    }

    pub fn next(&mut self) -> Result<WizardStep, ControllerError> {
        Ok(self.store.advance_step()?)
    }

    pub fn back(&mut self) -> Result<WizardStep, ControllerError> {
        let step = self.store.retreat_step()?;
        self.renderer.begin();
        Ok(step)
    }

    pub fn reset(&mut self) -> Result<(), ControllerError> {
        self.store.reset()?;
        self.renderer.begin();
        Ok(())
    }

    /// Send the active version and the instruction to the modification
    /// service; the result becomes the active version.
    pub async fn modify(&mut self, prompt: &str) -> Result<ModifiedTemplate, ControllerError> {
        let session = self.store.session();
        let Some(template_id) = session.selected_template_id.clone() else {
            return Err(ClassifiedError::validation("no template selected").into());
        };
        let active = resolve_active_content(session)?.text().to_string();

        let modified = self.modifier.modify(&active, prompt).await?;
        if modified.possibly_truncated {
            warn!(template_id, "modification result may be truncated");
        }

        self.store.set_modified_content(modified.text.clone())?;
        self.store.set_last_prompt(prompt)?;
        info!(template_id, "modification applied");
        Ok(modified)
    }

    /// The request a render would send right now.
    pub fn plan_render(&self) -> Result<RenderRequest, ControllerError> {
        Ok(plan_request(self.store.session())?)
    }

    /// A by-name request for the selected template, ignoring local content.
    pub fn plan_render_by_name(&self) -> Result<RenderRequest, ControllerError> {
        let Some(template_id) = self.store.session().selected_template_id.as_deref() else {
            return Err(ClassifiedError::validation("no template selected").into());
        };
        Ok(RenderRequest::by_name(template_id)?)
    }

    pub async fn render(&self, request: RenderRequest) -> Result<RenderOutcome, ControllerError> {
        Ok(self.renderer.render(request).await?)
    }

    pub fn download(&self) -> Result<TemplateDownload, ControllerError> {
        let active = resolve_active_content(self.store.session())?;
        let file_name = match active.origin() {
            ContentOrigin::Modified => modified_download_name(active.template_id()),
            ContentOrigin::Original => original_download_name(active.template_id()),
        };
        Ok(TemplateDownload {
            file_name,
            origin: active.origin(),
            text: active.text().to_string(),
        })
    }
}
