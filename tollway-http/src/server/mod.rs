//! Axum middleware for enforcing x402 payments on protected routes.
//!
//! A request to a priced route without a valid `X-PAYMENT` header is answered
//! with `402 Payment Required` and a JSON challenge listing the route's single
//! requirement. A request whose payment the facilitator accepts is forwarded
//! with a [`VerifiedPayment`] in its extensions.
//!
//! See [`VerificationGate`] for configuration and [`FacilitatorClient`] for the
//! remote verification boundary.

pub mod error;
pub mod facilitator_client;
pub mod layer;
pub mod paygate;
pub mod price;

pub use error::VerificationError;
pub use facilitator_client::{FacilitatorClient, FacilitatorClientError};
pub use layer::{GateLayer, GateService, VerificationGate};
pub use paygate::{Paygate, VerifiedPayment};
pub use price::PriceTag;
