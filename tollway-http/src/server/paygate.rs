//! Per-request payment verification.
//!
//! The [`Paygate`] runs the gate in a fixed order and stops at the first
//! failure:
//!
//! 1. `X-PAYMENT` header present
//! 2. header decodes to a v1 payload
//! 3. payload scheme and network match the route's requirement
//! 4. facilitator verdict is valid
//!
//! Only then is the inner service called. Every failure becomes a
//! `402 Payment Required` carrying the route's requirement and the reason.

use std::convert::Infallible;
use std::sync::Arc;

use alloy_primitives::Address;
use axum_core::body::Body;
use axum_core::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use tollway::codec;
use tollway::facilitator::Facilitator;
use tollway::proto::{PaymentPayload, PaymentRequired, PaymentRequirements, VerifyRequest, VerifyResponse};
use tower::Service;

#[cfg(feature = "telemetry")]
use tracing::{Instrument, instrument};

use super::error::VerificationError;
use crate::constants::X_PAYMENT;

/// A payment the facilitator accepted, inserted into the request extensions.
///
/// ```ignore
/// async fn handler(Extension(payment): Extension<VerifiedPayment>) -> String {
///     format!("paid by {}", payment.payer)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment {
    /// The payer named in the authorization.
    pub payer: Address,
    /// The decoded payload, shared read-only.
    pub payload: Arc<PaymentPayload>,
}

/// Verifies one request against one requirement.
#[allow(missing_debug_implementations)]
pub struct Paygate<F> {
    /// Verifies decoded payloads.
    pub facilitator: F,
    /// The route's requirement, resolved for this request.
    pub requirement: Arc<PaymentRequirements>,
}

impl<F> Paygate<F> {
    async fn call_inner<ReqBody, ResBody, S>(
        mut inner: S,
        req: http::Request<ReqBody>,
    ) -> Result<http::Response<ResBody>, S::Error>
    where
        S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
        S::Future: Send,
    {
        #[cfg(feature = "telemetry")]
        {
            inner
                .call(req)
                .instrument(tracing::info_span!("inner"))
                .await
        }
        #[cfg(not(feature = "telemetry"))]
        {
            inner.call(req).await
        }
    }
}

impl<F> Paygate<F>
where
    F: Facilitator,
{
    /// Runs the gate, turning any rejection into a 402 response.
    ///
    /// # Errors
    ///
    /// Never; the error type is [`Infallible`].
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.gate", skip_all, fields(resource = %self.requirement.resource))
    )]
    pub async fn handle_request<ReqBody, ResBody, S>(
        self,
        inner: S,
        req: http::Request<ReqBody>,
    ) -> Result<Response, Infallible>
    where
        S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
        S::Response: IntoResponse,
        S::Error: IntoResponse,
        S::Future: Send,
    {
        match self.handle_request_fallible(inner, req).await {
            Ok(response) => Ok(response),
            Err(err) => Ok(error_into_response(&err, &self.requirement)),
        }
    }

    /// Runs the gate, returning the rejection instead of a 402 response.
    ///
    /// # Errors
    ///
    /// Returns the first [`VerificationError`] the request hits.
    pub async fn handle_request_fallible<ReqBody, ResBody, S>(
        &self,
        inner: S,
        mut req: http::Request<ReqBody>,
    ) -> Result<Response, VerificationError>
    where
        S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
        S::Response: IntoResponse,
        S::Error: IntoResponse,
        S::Future: Send,
    {
        let mut headers = req.headers().get_all(X_PAYMENT).iter();
        let header = headers
            .next()
            .ok_or(VerificationError::PaymentHeaderRequired)?;
        if headers.next().is_some() {
            return Err(VerificationError::RepeatedPaymentHeader);
        }
        let payload = codec::decode_bytes(header.as_bytes())?;

        if payload.scheme != self.requirement.scheme || payload.network != self.requirement.network {
            return Err(VerificationError::NoPaymentMatching);
        }

        let request = VerifyRequest::new(payload, PaymentRequirements::clone(&self.requirement));
        let verdict = self.facilitator.verify(&request).await.map_err(|e| {
            #[cfg(feature = "telemetry")]
            tracing::warn!(error = %e, "facilitator unavailable");
            VerificationError::FacilitatorUnavailable(e.to_string())
        })?;
        if let VerifyResponse::Invalid { reason, .. } = verdict {
            #[cfg(feature = "telemetry")]
            tracing::info!(%reason, "payment rejected");
            return Err(VerificationError::InvalidAuthorization(reason));
        }

        let payload = request.payment_payload;
        #[cfg(feature = "telemetry")]
        tracing::debug!(payer = %payload.payer(), "payment verified");
        req.extensions_mut().insert(VerifiedPayment {
            payer: payload.payer(),
            payload: Arc::new(payload),
        });

        match Self::call_inner(inner, req).await {
            Ok(response) => Ok(response.into_response()),
            Err(err) => Ok(err.into_response()),
        }
    }
}

/// Builds the 402 response for a rejection.
#[must_use]
pub fn error_into_response(err: &VerificationError, requirement: &PaymentRequirements) -> Response {
    let challenge = PaymentRequired::new(requirement.clone()).with_error(err.to_string());
    match serde_json::to_vec(&challenge) {
        Ok(body) => (
            StatusCode::PAYMENT_REQUIRED,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            Body::from(body),
        )
            .into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
