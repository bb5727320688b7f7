//! docsmith-session
//!
//! The wizard session store, its persistence boundary, and the content
//! lineage resolver that decides which template version is authoritative.

pub mod error;
pub mod lineage;
pub mod persistence;
pub mod store;

pub use error::SessionError;
pub use lineage::resolve_active_content;
pub use persistence::{FileSessionPersistence, MemoryPersistence, SessionPersistence};
pub use store::SessionStore;
