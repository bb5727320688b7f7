//! docsmith-core
//!
//! Pure domain types, the classified error taxonomy, and template file naming
//! conventions. No HTTP or filesystem dependency; this is the shared
//! vocabulary of the docsmith crates.

pub mod error;
pub mod models;
pub mod template_files;

pub use error::{ClassifiedError, ErrorKind};
