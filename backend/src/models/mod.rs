//! Database models for the Abpack platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
