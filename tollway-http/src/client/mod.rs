//! Paying HTTP client.
//!
//! [`PaymentClient`] sends a request, and if the server answers
//! `402 Payment Required` it builds, signs and attaches exactly one payment
//! before retrying once:
//!
//! ```text
//! Idle -> Probing -> Done
//!                 -> AwaitingPayment -> Building -> Signing -> Encoding -> Retrying -> Done | Failed
//! ```
//!
//! There is no second retry. Callers that want to try again after a rejected
//! or expired payment call the client again, which produces a fresh nonce and
//! validity window.
//!
//! The transport is a [`reqwest_middleware::ClientWithMiddleware`], so
//! logging or tracing middleware can be stacked underneath the payment logic.

mod negotiator;
mod payment;

pub use negotiator::{Outcome, RequirementNegotiator, classify, parse_payment_required, select};
pub use payment::{PaymentClient, PaymentState};

use http::{HeaderMap, StatusCode};
use tollway::proto::PaymentPayload;

/// A response obtained through a [`PaymentClient`].
#[derive(Debug, Clone)]
pub struct PaymentResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body, unmodified.
    pub body: Vec<u8>,
    /// The payment sent to obtain this response, if one was needed.
    pub payment: Option<PaymentPayload>,
}

impl PaymentResponse {
    /// Returns `true` if a payment was attached to obtain this response.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        self.payment.is_some()
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
