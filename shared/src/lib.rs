//! Shared types and pure calculations for the Abpack platform
//!
//! This crate contains everything that must behave identically on the
//! backend and in the browser (via WASM): domain models, the packaging
//! needed-amount formula, and the consumption forecast math.

pub mod forecast;
pub mod models;
pub mod packaging;
pub mod validation;

pub use forecast::*;
pub use models::*;
pub use packaging::*;
pub use validation::*;
