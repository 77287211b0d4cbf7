//! Error taxonomy for the x402 payment lifecycle.
//!
//! Every failure on the client or server path maps to one [`ErrorKind`], so
//! callers and operators can tell an outage ([`ErrorKind::FacilitatorUnavailable`])
//! from a rejected signature ([`ErrorKind::InvalidAuthorization`]).

use std::fmt;

use crate::signer::SignerError;

/// Boxed error used for transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Coarse classification of an [`X402Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The 402 body violates the protocol.
    MalformedChallenge,
    /// The 402 body names a protocol version other than 1.
    UnsupportedVersion,
    /// The requirement names a network the registry does not know.
    UnsupportedNetwork,
    /// The requested payment amount violates policy.
    InvalidAmount,
    /// The signer failed or refused.
    SignatureError,
    /// A payment payload could not be encoded or decoded.
    DecodeError,
    /// The server or facilitator rejected the authorization.
    InvalidAuthorization,
    /// The facilitator could not be reached or answered nonsense.
    FacilitatorUnavailable,
    /// A transport-level failure.
    NetworkError,
    /// The probe was answered with a status other than 200 or 402.
    HttpStatus,
}

impl ErrorKind {
    /// Returns the kind's stable name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedChallenge => "MalformedChallenge",
            Self::UnsupportedVersion => "UnsupportedVersion",
            Self::UnsupportedNetwork => "UnsupportedNetwork",
            Self::InvalidAmount => "InvalidAmount",
            Self::SignatureError => "SignatureError",
            Self::DecodeError => "DecodeError",
            Self::InvalidAuthorization => "InvalidAuthorization",
            Self::FacilitatorUnavailable => "FacilitatorUnavailable",
            Self::NetworkError => "NetworkError",
            Self::HttpStatus => "HttpStatus",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-reason of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeReason {
    /// The header is not valid standard base64.
    Base64Error,
    /// The decoded bytes are not JSON.
    JsonError,
    /// The JSON does not have the payload shape.
    SchemaError,
    /// `x402Version` is not 1.
    VersionError,
}

impl DecodeReason {
    /// Returns the reason's stable name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Base64Error => "Base64Error",
            Self::JsonError => "JsonError",
            Self::SchemaError => "SchemaError",
            Self::VersionError => "VersionError",
        }
    }
}

impl fmt::Display for DecodeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment payload failed to decode.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Base64 decoding failed.
    #[error("Base64Error: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes are not valid JSON.
    #[error("JsonError: {0}")]
    Json(#[source] serde_json::Error),
    /// The JSON is missing fields or has the wrong shape.
    #[error("SchemaError: {0}")]
    Schema(String),
    /// The payload declares an unsupported protocol version.
    #[error("VersionError: unsupported x402Version {found}")]
    Version {
        /// The version as it appeared in the JSON.
        found: String,
    },
}

impl DecodeError {
    /// Returns the sub-reason.
    #[must_use]
    pub const fn reason(&self) -> DecodeReason {
        match self {
            Self::Base64(_) => DecodeReason::Base64Error,
            Self::Json(_) => DecodeReason::JsonError,
            Self::Schema(_) => DecodeReason::SchemaError,
            Self::Version { .. } => DecodeReason::VersionError,
        }
    }
}

/// Errors along the x402 payment path.
#[derive(Debug, thiserror::Error)]
pub enum X402Error {
    /// The 402 body violates the protocol.
    #[error("malformed payment challenge: {0}")]
    MalformedChallenge(String),
    /// The 402 body names an unsupported protocol version.
    #[error("unsupported x402 version {0}")]
    UnsupportedVersion(String),
    /// The requirement names an unknown network.
    #[error("unsupported network {0:?}")]
    UnsupportedNetwork(String),
    /// The requested amount is not acceptable.
    #[error("invalid amount {amount:?}: {reason}")]
    InvalidAmount {
        /// The offending amount as given.
        amount: String,
        /// What is wrong with it.
        reason: String,
    },
    /// The signer failed.
    #[error(transparent)]
    Signature(#[from] SignerError),
    /// A payload failed to decode.
    #[error("invalid payment payload: {0}")]
    Decode(#[from] DecodeError),
    /// A payload failed to encode.
    #[error("failed to encode payment payload: {0}")]
    Encode(#[source] BoxError),
    /// The paid retry was not accepted.
    #[error("payment rejected with HTTP {status}: {reason}")]
    InvalidAuthorization {
        /// HTTP status of the rejecting response.
        status: u16,
        /// The server's stated reason.
        reason: String,
    },
    /// The facilitator could not give a verdict.
    #[error("facilitator unavailable: {0}")]
    FacilitatorUnavailable(String),
    /// A transport failure.
    #[error("network error: {0}")]
    Network(#[source] BoxError),
    /// The probe was answered with a status other than 200 or 402.
    #[error("unexpected HTTP status {status}")]
    Status {
        /// The HTTP status.
        status: u16,
        /// The response body, unmodified.
        body: Vec<u8>,
    },
}

impl X402Error {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedChallenge(_) => ErrorKind::MalformedChallenge,
            Self::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            Self::UnsupportedNetwork(_) => ErrorKind::UnsupportedNetwork,
            Self::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            Self::Signature(_) => ErrorKind::SignatureError,
            Self::Decode(_) | Self::Encode(_) => ErrorKind::DecodeError,
            Self::InvalidAuthorization { .. } => ErrorKind::InvalidAuthorization,
            Self::FacilitatorUnavailable(_) => ErrorKind::FacilitatorUnavailable,
            Self::Network(_) => ErrorKind::NetworkError,
            Self::Status { .. } => ErrorKind::HttpStatus,
        }
    }

    /// Wraps a transport failure.
    pub fn network(err: impl Into<BoxError>) -> Self {
        Self::Network(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display_leads_with_reason() {
        let err = DecodeError::Schema("missing field `nonce`".into());
        assert_eq!(err.reason(), DecodeReason::SchemaError);
        assert!(err.to_string().starts_with("SchemaError"));

        let err = DecodeError::Version { found: "2".into() };
        assert_eq!(err.reason().as_str(), "VersionError");
    }

    #[test]
    fn test_error_kinds() {
        let err = X402Error::from(DecodeError::Version { found: "2".into() });
        assert_eq!(err.kind(), ErrorKind::DecodeError);
        let err = X402Error::InvalidAuthorization {
            status: 402,
            reason: "signature mismatch".into(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidAuthorization);
        assert_eq!(err.kind().to_string(), "InvalidAuthorization");
        assert_eq!(
            X402Error::network("connection reset").kind(),
            ErrorKind::NetworkError
        );
    }
}
