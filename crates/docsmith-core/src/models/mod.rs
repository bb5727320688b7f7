pub mod content;
pub mod render;
pub mod session;
