use docsmith_core::ClassifiedError;
use docsmith_core::models::content::TemplateContentVersion;
use docsmith_core::models::session::{Session, WizardStep};
use docsmith_core::template_files::validate_template_id;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::persistence::SessionPersistence;

/// Owns the wizard session and is the only thing that mutates it.
///
/// Every transition builds the next session, saves it through the
/// persistence hook, and only then replaces the in-memory copy. A failed
/// save leaves the store unchanged.
pub struct SessionStore<P: SessionPersistence> {
    session: Session,
    persistence: P,
}

impl<P: SessionPersistence> SessionStore<P> {
    /// Begin a brand-new session, discarding anything persisted.
    pub fn start_fresh(persistence: P) -> Result<Self, SessionError> {
        let session = Session::default();
        persistence.save(&session)?;
        info!("started fresh session");
        Ok(Self {
            session,
            persistence,
        })
    }

    /// Pick up the persisted session as-is, or an empty one if none exists.
    pub fn resume(persistence: P) -> Result<Self, SessionError> {
        let session = persistence.load()?.unwrap_or_default();
        debug!(
            step = session.step.number(),
            template_id = session.selected_template_id.as_deref().unwrap_or("-"),
            "resumed session"
        );
        Ok(Self {
            session,
            persistence,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn step(&self) -> WizardStep {
        self.session.step
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Choose a template. Drops any modification and prompt from the
    /// previous choice; the original content is replaced once the fetch lands.
    pub fn select_template(&mut self, template_id: &str) -> Result<(), SessionError> {
        validate_template_id(template_id)?;

        let mut next = self.session.clone();
        next.selected_template_id = Some(template_id.to_string());
        next.modified_content = None;
        next.last_prompt.clear();
        self.commit(next)?;

        info!(template_id, "template selected");
        Ok(())
    }

    /// Store `text` as the original content of the selected template.
    pub fn set_original_content(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        let template_id = self.require_selected()?.to_string();
        let mut next = self.session.clone();
        next.original_content = Some(TemplateContentVersion::original(template_id, text));
        self.commit(next)
    }

    /// Fetch-completion hook. Returns `false` and changes nothing when the
    /// fetch was for a template that is no longer selected.
    pub fn accept_fetched_content(
        &mut self,
        template_id: &str,
        text: impl Into<String>,
    ) -> Result<bool, SessionError> {
        if self.session.selected_template_id.as_deref() != Some(template_id) {
            debug!(
                template_id,
                selected = self.session.selected_template_id.as_deref().unwrap_or("-"),
                "dropping fetched content for a template that is no longer selected"
            );
            return Ok(false);
        }

        let mut next = self.session.clone();
        next.original_content = Some(TemplateContentVersion::original(template_id, text));
        self.commit(next)?;
        Ok(true)
    }

    pub fn set_modified_content(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        let template_id = self.require_selected()?.to_string();
        let mut next = self.session.clone();
        next.modified_content = Some(TemplateContentVersion::modified(template_id, text));
        self.commit(next)
    }

    pub fn set_last_prompt(&mut self, prompt: impl Into<String>) -> Result<(), SessionError> {
        let mut next = self.session.clone();
        next.last_prompt = prompt.into();
        self.commit(next)
    }

    /// Move from template selection to customization.
    ///
    /// Requires a selected template whose original content has been fetched.
    pub fn advance_step(&mut self) -> Result<WizardStep, SessionError> {
        match self.session.step {
            WizardStep::SelectTemplate => {
                if self.session.selected_template_id.is_none() {
                    return Err(ClassifiedError::validation(
                        "select a template before continuing",
                    )
                    .into());
                }
                if !self.session.has_fetched_selected() {
                    return Err(ClassifiedError::validation(
                        "template content has not been loaded yet",
                    )
                    .into());
                }

                let mut next = self.session.clone();
                next.step = WizardStep::Customize;
                self.commit(next)?;
                info!(step = WizardStep::Customize.number(), "advanced step");
                Ok(WizardStep::Customize)
            }
            WizardStep::Customize => {
                Err(ClassifiedError::validation("already at the last step").into())
            }
        }
    }

    /// Return to template selection. Always a full reset, the selected id
    /// included.
    pub fn retreat_step(&mut self) -> Result<WizardStep, SessionError> {
        match self.session.step {
            WizardStep::Customize => {
                self.reset()?;
                info!(step = WizardStep::SelectTemplate.number(), "returned to first step");
                Ok(WizardStep::SelectTemplate)
            }
            WizardStep::SelectTemplate => {
                Err(ClassifiedError::validation("already at the first step").into())
            }
        }
    }

    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.commit(Session::default())?;
        debug!("session reset");
        Ok(())
    }

    fn require_selected(&self) -> Result<&str, SessionError> {
        self.session
            .selected_template_id
            .as_deref()
            .ok_or_else(|| ClassifiedError::validation("no template selected").into())
    }

    fn commit(&mut self, next: Session) -> Result<(), SessionError> {
        self.persistence.save(&next)?;
        self.session = next;
        Ok(())
    }
}
