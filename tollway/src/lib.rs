#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the x402 pay-per-request HTTP protocol.
//!
//! A server answers an unpaid request with `402 Payment Required` and a list
//! of accepted [`PaymentRequirements`](proto::PaymentRequirements). The client
//! picks one, builds an EIP-3009 `TransferWithAuthorization`, has it signed by
//! a [`Signer`](signer::Signer) and retries with the base64 payload in the
//! `X-PAYMENT` header. The server decodes the payload and asks a
//! [`Facilitator`](facilitator::Facilitator) whether the authorization holds.
//!
//! This crate is transport-agnostic. HTTP plumbing lives in `tollway-http`,
//! EIP-712 hashing and key-backed signers in `tollway-evm`.
//!
//! # Modules
//!
//! - [`amount`] - Decimal-string token amounts
//! - [`authorization`] - Builds fresh, time-bounded authorizations
//! - [`codec`] - Base64/JSON codec for the payment header
//! - [`domain`] - EIP-712 signing domain derivation
//! - [`error`] - Error taxonomy shared by client and server
//! - [`facilitator`] - Verification boundary trait
//! - [`networks`] - Registry of known networks and USDC deployments
//! - [`proto`] - Wire format types
//! - [`signer`] - Signing capability trait
//! - [`timestamp`] - Unix timestamps serialized as strings
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod amount;
pub mod authorization;
pub mod codec;
pub mod domain;
pub mod error;
pub mod facilitator;
pub mod networks;
pub mod proto;
pub mod signer;
pub mod timestamp;

pub use error::{DecodeError, DecodeReason, ErrorKind, X402Error};
