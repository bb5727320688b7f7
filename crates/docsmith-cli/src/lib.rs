//! docsmith-cli library root.
//!
//! The binary is a thin layer over these modules. They are public so the
//! `render_smoke` example and the integration tests can drive the wizard
//! controller and the diagnostic harness directly.

pub mod config;
pub mod controller;
pub mod diagnose;
pub mod error;
