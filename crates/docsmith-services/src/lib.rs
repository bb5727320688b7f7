//! docsmith-services
//!
//! Clients for the collaborators around the renderer: the template
//! catalog (listing and content), the modification service, and the
//! health probe.

pub mod catalog;
pub mod health;
mod http;
pub mod modify;

pub use catalog::{HttpTemplateCatalog, TemplateCatalog};
pub use health::{HealthReport, HealthStatus, probe_health};
pub use modify::{HttpTemplateModifier, ModifiedTemplate, TemplateModifier, TokenUsage};
