#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EVM support for the x402 payment protocol.
//!
//! Payments are EIP-3009 `transferWithAuthorization` messages signed as
//! EIP-712 typed data against the token contract's domain.
//!
//! - [`eip712`] - Struct hashing and domain conversion
//! - [`signer`] - [`Eip712Signer`], a [`tollway::signer::Signer`] backed by any alloy signer
//! - [`verifier`] - [`LocalVerifier`], an in-process [`tollway::facilitator::Facilitator`]
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod eip712;
pub mod signer;
pub mod verifier;

pub use signer::Eip712Signer;
pub use verifier::LocalVerifier;
