#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport for the x402 payment protocol.
//!
//! # Modules
//!
//! - [`constants`] - Header names and default facilitator settings
//! - [`client`] - Paying HTTP client over reqwest (feature: `client`)
//! - [`server`] - Verification middleware for axum routes (feature: `server`)
//!
//! # Feature Flags
//!
//! - `client` - [`client::PaymentClient`] and [`client::RequirementNegotiator`]
//! - `server` - [`server::VerificationGate`] and [`server::FacilitatorClient`]
//! - `telemetry` - Tracing spans and events along the payment path

pub mod constants;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "server")]
pub mod server;

#[cfg(all(test, feature = "client", feature = "server"))]
mod tests;
