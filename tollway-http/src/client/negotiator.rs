//! Price discovery.
//!
//! The negotiator sends the bare request and classifies the answer. A 402
//! body must be a v1 challenge with at least one accepted requirement; any
//! deviation is fatal to the call rather than a soft failure.

use http::StatusCode;
use reqwest::Request;
use reqwest_middleware as rqm;
use serde_json::Value;
use tollway::X402Error;
use tollway::proto::{PaymentRequired, PaymentRequirements, V1};

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

use super::PaymentResponse;

/// Result of an unpaid request.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// HTTP 200. No payment needed.
    Success(PaymentResponse),
    /// HTTP 402 with a valid challenge.
    PaymentRequired(PaymentRequired),
    /// Any other status, passed through unmodified.
    Error {
        /// The HTTP status.
        status: StatusCode,
        /// The response body.
        body: Vec<u8>,
    },
}

/// Performs the bare probe request and classifies the response.
#[derive(Debug, Clone)]
pub struct RequirementNegotiator {
    transport: rqm::ClientWithMiddleware,
}

impl RequirementNegotiator {
    /// Creates a negotiator sending through `transport`.
    #[must_use]
    pub const fn new(transport: rqm::ClientWithMiddleware) -> Self {
        Self { transport }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &rqm::ClientWithMiddleware {
        &self.transport
    }

    /// Sends `request` without a payment header and classifies the answer.
    ///
    /// # Errors
    ///
    /// [`X402Error::Network`] on transport failure; [`X402Error::MalformedChallenge`]
    /// or [`X402Error::UnsupportedVersion`] for a 402 that violates the protocol.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.client.probe", skip_all, fields(url = %request.url()), err)
    )]
    pub async fn probe(&self, request: Request) -> Result<Outcome, X402Error> {
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(X402Error::network)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(X402Error::network)?.to_vec();

        #[cfg(feature = "telemetry")]
        debug!(%status, "probe answered");

        classify(status, headers, body)
    }
}

/// Classifies a probe response.
///
/// # Errors
///
/// Fails if the status is 402 and the body is not a valid challenge.
pub fn classify(
    status: StatusCode,
    headers: http::HeaderMap,
    body: Vec<u8>,
) -> Result<Outcome, X402Error> {
    match status {
        StatusCode::OK => Ok(Outcome::Success(PaymentResponse {
            status,
            headers,
            body,
            payment: None,
        })),
        StatusCode::PAYMENT_REQUIRED => parse_payment_required(&body).map(Outcome::PaymentRequired),
        _ => Ok(Outcome::Error { status, body }),
    }
}

/// Parses and validates a 402 response body.
///
/// # Errors
///
/// [`X402Error::UnsupportedVersion`] if `x402Version` is an integer other
/// than 1, [`X402Error::MalformedChallenge`] for any other deviation,
/// including an empty `accepts` list.
pub fn parse_payment_required(body: &[u8]) -> Result<PaymentRequired, X402Error> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| X402Error::MalformedChallenge(format!("402 body is not JSON: {e}")))?;
    let version = value
        .get("x402Version")
        .ok_or_else(|| X402Error::MalformedChallenge("missing x402Version".into()))?;
    let version = version
        .as_u64()
        .ok_or_else(|| X402Error::MalformedChallenge(format!("x402Version {version} is not an integer")))?;
    if V1 != version {
        return Err(X402Error::UnsupportedVersion(version.to_string()));
    }

    let required: PaymentRequired = serde_json::from_value(value)
        .map_err(|e| X402Error::MalformedChallenge(e.to_string()))?;
    if required.accepts.is_empty() {
        return Err(X402Error::MalformedChallenge("accepts is empty".into()));
    }
    Ok(required)
}

/// Picks the requirement to pay: always the first listed.
#[must_use]
pub fn select(required: &PaymentRequired) -> Option<&PaymentRequirements> {
    required.accepts.first()
}
