//! Demo API selling tiered access through x402 payments.
//!
//! # Modules
//!
//! - [`config`] - Server configuration with environment variable expansion
//! - [`routes`] - Free and priced routes
//! - [`error`] - Startup errors

pub mod config;
pub mod error;
pub mod routes;

pub use config::{FacilitatorMode, ServerConfig};
pub use routes::{TIERS, Tier, app};
