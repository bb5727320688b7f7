use std::time::Duration;

use docsmith_core::ClassifiedError;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::TemplateCatalog;

pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub template_count: Option<usize>,
    pub error: Option<ClassifiedError>,
    pub latency: Duration,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Probe the rendering backend by listing its templates.
pub async fn probe_health(catalog: &dyn TemplateCatalog, timeout: Duration) -> HealthReport {
    let started = tokio::time::Instant::now();
    let result = match tokio::time::timeout(timeout, catalog.list_templates()).await {
        Ok(result) => result,
        Err(_) => Err(ClassifiedError::network(format!(
            "rendering backend did not answer within {}s",
            timeout.as_secs()
        ))),
    };
    let latency = started.elapsed();

    match result {
        Ok(templates) => {
            info!(
                templates = templates.len(),
                latency_ms = latency.as_millis() as u64,
                "backend healthy"
            );
            HealthReport {
                status: HealthStatus::Healthy,
                template_count: Some(templates.len()),
                error: None,
                latency,
            }
        }
        Err(e) => {
            warn!(error = %e, "backend unhealthy");
            HealthReport {
                status: HealthStatus::Unhealthy,
                template_count: None,
                error: Some(e),
                latency,
            }
        }
    }
}
