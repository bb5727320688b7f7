use std::sync::Arc;

use docsmith_core::ClassifiedError;
use docsmith_core::models::render::{PdfArtifact, RenderRequest};
use tracing::{debug, info};

use crate::disambiguate::classify;
use crate::dispatcher::Dispatcher;
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper, with_retry};

/// Result of one logical render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// This render is still the latest one.
    Current { generation: u64, artifact: PdfArtifact },
    /// A newer render started before this one finished. Its result,
    /// success or failure, was discarded.
    Superseded { generation: u64 },
}

impl RenderOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            RenderOutcome::Current { generation, .. }
            | RenderOutcome::Superseded { generation } => *generation,
        }
    }

    pub fn into_artifact(self) -> Option<PdfArtifact> {
        match self {
            RenderOutcome::Current { artifact, .. } => Some(artifact),
            RenderOutcome::Superseded { .. } => None,
        }
    }
}

/// Dispatch, retry, and classification for one render, with stale results
/// dropped by generation.
#[derive(Clone)]
pub struct Renderer {
    dispatcher: Dispatcher,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Renderer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Claim the next generation, superseding every render in flight.
    pub fn begin(&self) -> u64 {
        self.dispatcher.begin_generation()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.dispatcher.is_current(generation)
    }

    /// Render `request` as a new generation. Retries share that generation.
    pub async fn render(&self, request: RenderRequest) -> Result<RenderOutcome, ClassifiedError> {
        let generation = self.begin();
        self.render_as(generation, request).await
    }

    /// Render under a generation claimed earlier with [`begin`](Self::begin).
    pub async fn render_as(
        &self,
        generation: u64,
        request: RenderRequest,
    ) -> Result<RenderOutcome, ClassifiedError> {
        let request = &request;
        let dispatcher = &self.dispatcher;

        let result = with_retry(&self.policy, self.sleeper.as_ref(), |attempt| async move {
            // Not transient, so a superseded render stops retrying here.
            if !dispatcher.is_current(generation) {
                return Err(ClassifiedError::validation("render superseded"));
            }
            debug!(generation, attempt, "render attempt");
            let envelope = dispatcher.dispatch(request).await?;
            classify(&envelope)
        })
        .await;

        if !self.dispatcher.is_current(generation) {
            debug!(
                generation,
                latest = self.dispatcher.current_generation(),
                failed = result.is_err(),
                "discarding superseded render"
            );
            return Ok(RenderOutcome::Superseded { generation });
        }

        let artifact = result?;
        info!(
            generation,
            template_id = request.template_id(),
            size_bytes = artifact.size_bytes(),
            "render complete"
        );
        Ok(RenderOutcome::Current {
            generation,
            artifact,
        })
    }
}
