//! Wire format types for the x402 protocol.
//!
//! All types serialize to camelCase JSON. The protocol version travels in the
//! `x402Version` field and is enforced by the [`Version`] marker.
//!
//! - [`v1`] - Challenge, requirements and payload types
//! - [`VerifyRequest`] / [`VerifyResponse`] - Facilitator verification messages

use serde::{Deserialize, Deserializer, Serialize, Serializer};

mod version;
pub mod v1;

pub use v1::{
    AssetMeta, Authorization, EXACT_SCHEME, ExactPayload, PaymentPayload, PaymentRequired,
    PaymentRequirements, V1, X402Version1,
};
pub use version::Version;

/// Body of a `POST /verify` call to a facilitator.
///
/// The payment payload fields are forwarded at the top level exactly as the
/// client sent them; the facilitator recomputes the EIP-712 digest from them.
/// The route's requirement rides alongside as `paymentRequirements`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// The decoded payment payload.
    #[serde(flatten)]
    pub payment_payload: PaymentPayload,
    /// The requirement the payload must satisfy.
    pub payment_requirements: PaymentRequirements,
}

impl VerifyRequest {
    /// Pairs a payload with the requirement it is checked against.
    #[must_use]
    pub const fn new(
        payment_payload: PaymentPayload,
        payment_requirements: PaymentRequirements,
    ) -> Self {
        Self {
            payment_payload,
            payment_requirements,
        }
    }
}

/// Reason reported when a facilitator rejects without saying why.
pub const UNSPECIFIED_REASON: &str = "unspecified_verification_failure";

/// A facilitator's verdict on a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResponse {
    /// The authorization is valid for the requirement.
    Valid {
        /// The payer address, if the facilitator reported it.
        payer: Option<String>,
    },
    /// The authorization was rejected.
    Invalid {
        /// Why verification failed.
        reason: String,
        /// The payer address, if identifiable.
        payer: Option<String>,
    },
}

impl VerifyResponse {
    /// A valid verdict.
    #[must_use]
    pub const fn valid(payer: Option<String>) -> Self {
        Self::Valid { payer }
    }

    /// An invalid verdict with a reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
            payer: None,
        }
    }

    /// Returns `true` if the verification succeeded.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponseWire {
    is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
    #[serde(default, alias = "invalidReason", skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl Serialize for VerifyResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            Self::Valid { payer } => VerifyResponseWire {
                is_valid: true,
                payer: payer.clone(),
                reason: None,
            },
            Self::Invalid { reason, payer } => VerifyResponseWire {
                is_valid: false,
                payer: payer.clone(),
                reason: Some(reason.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VerifyResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = VerifyResponseWire::deserialize(deserializer)?;
        if wire.is_valid {
            Ok(Self::Valid { payer: wire.payer })
        } else {
            let reason = wire
                .reason
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| UNSPECIFIED_REASON.to_owned());
            Ok(Self::Invalid {
                reason,
                payer: wire.payer,
            })
        }
    }
}
