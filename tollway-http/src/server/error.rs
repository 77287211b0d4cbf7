//! Rejection reasons of the verification gate.
//!
//! Every variant becomes a `402 Payment Required` whose `error` field is the
//! variant's display string.

use tollway::{DecodeError, ErrorKind};

use crate::constants::X_PAYMENT_HEADER;

/// Why the gate refused to forward a request.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// No `X-PAYMENT` header on the request.
    #[error("{X_PAYMENT_HEADER} header is required")]
    PaymentHeaderRequired,
    /// More than one `X-PAYMENT` header on the request.
    #[error("{X_PAYMENT_HEADER} header must not be repeated")]
    RepeatedPaymentHeader,
    /// The header did not decode to a v1 payload.
    #[error(transparent)]
    InvalidPaymentHeader(#[from] DecodeError),
    /// The payload's scheme or network differs from the route's requirement.
    #[error("no matching payment requirements")]
    NoPaymentMatching,
    /// The facilitator rejected the authorization.
    #[error("{0}")]
    InvalidAuthorization(String),
    /// The facilitator could not produce a verdict.
    #[error("facilitator unavailable: {0}")]
    FacilitatorUnavailable(String),
}

impl VerificationError {
    /// Maps the rejection onto the shared taxonomy.
    ///
    /// A missing header is the ordinary first leg of the protocol, not a
    /// failure, and has no kind.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::PaymentHeaderRequired => None,
            Self::RepeatedPaymentHeader | Self::InvalidPaymentHeader(_) => {
                Some(ErrorKind::DecodeError)
            }
            Self::NoPaymentMatching | Self::InvalidAuthorization(_) => {
                Some(ErrorKind::InvalidAuthorization)
            }
            Self::FacilitatorUnavailable(_) => Some(ErrorKind::FacilitatorUnavailable),
        }
    }
}
