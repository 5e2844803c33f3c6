//! HTTP handlers for the Abpack platform

pub mod auth;
pub mod forecast;
pub mod health;
pub mod orders;
pub mod receiving;
pub mod stock;

pub use auth::*;
pub use forecast::*;
pub use health::*;
pub use orders::*;
pub use receiving::*;
pub use stock::*;
