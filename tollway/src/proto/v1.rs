//! Protocol version 1 wire types.
//!
//! V1 identifies chains by human-readable network names (`"base-sepolia"`)
//! and carries the signed payload in the `X-PAYMENT` request header.
//!
//! # Key Types
//!
//! - [`PaymentRequirements`] - One accepted way to pay, set by the seller
//! - [`PaymentRequired`] - HTTP 402 response body
//! - [`PaymentPayload`] - Signed authorization sent by the buyer
//! - [`Authorization`] - The EIP-3009 `TransferWithAuthorization` message

use alloy_primitives::{Address, B256, Bytes};
use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::timestamp::UnixTimestamp;

/// Version marker for x402 protocol version 1.
///
/// Serializes as the integer `1` and rejects other values.
pub type X402Version1 = super::Version<1>;

/// Convenience constant for constructing V1 protocol messages.
pub const V1: X402Version1 = super::Version;

/// The only payment scheme this protocol core implements.
pub const EXACT_SCHEME: &str = "exact";

/// EIP-712 domain name and version of the token contract.
///
/// Travels in the `extra` field of [`PaymentRequirements`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMeta {
    /// EIP-712 domain name (e.g. `"USDC"`).
    pub name: String,
    /// EIP-712 domain version (e.g. `"2"`).
    pub version: String,
}

impl AssetMeta {
    /// Creates asset metadata from a domain name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Payment terms set by the seller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// The payment scheme (e.g., "exact").
    pub scheme: String,
    /// The network name (e.g., "base-sepolia").
    pub network: String,
    /// Amount in the asset's minor units.
    pub max_amount_required: TokenAmount,
    /// The resource URL the price applies to.
    pub resource: String,
    /// Human-readable description of the resource.
    #[serde(default)]
    pub description: String,
    /// MIME type of the resource.
    #[serde(default)]
    pub mime_type: String,
    /// Optional JSON schema for the resource output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    /// Recipient of the payment.
    pub pay_to: Address,
    /// Upper bound on how long an authorization for this requirement may live.
    pub max_timeout_seconds: u64,
    /// Token contract address.
    pub asset: Address,
    /// EIP-712 domain metadata of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<AssetMeta>,
}

/// HTTP 402 Payment Required response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// Accepted payment options, in server preference order.
    pub accepts: Vec<PaymentRequirements>,
    /// Why the previous attempt was rejected, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PaymentRequired {
    /// Creates a challenge offering a single payment option.
    #[must_use]
    pub fn new(requirement: PaymentRequirements) -> Self {
        Self {
            x402_version: V1,
            accepts: vec![requirement],
            error: None,
        }
    }

    /// Attaches a rejection reason.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// The EIP-3009 `TransferWithAuthorization` message.
///
/// Every field is covered by the signature; changing any of them after
/// signing invalidates the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Authorization {
    /// Payer.
    pub from: Address,
    /// Payee.
    pub to: Address,
    /// Amount in minor units.
    pub value: TokenAmount,
    /// Earliest time the transfer may execute.
    pub valid_after: UnixTimestamp,
    /// Time from which the transfer is no longer valid.
    pub valid_before: UnixTimestamp,
    /// 32 random bytes binding the authorization to one attempt.
    pub nonce: B256,
}

/// Signature plus the authorization it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExactPayload {
    /// EIP-712 signature over the authorization.
    pub signature: Bytes,
    /// The signed authorization.
    pub authorization: Authorization,
}

/// A signed payment, the unit carried base64-encoded in `X-PAYMENT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentPayload {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// The payment scheme (e.g., "exact").
    pub scheme: String,
    /// The network name (e.g., "base-sepolia").
    pub network: String,
    /// The resource being paid for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// The scheme-specific signed payload.
    pub payload: ExactPayload,
}

impl PaymentPayload {
    /// Wraps a signed authorization for the given requirement.
    #[must_use]
    pub fn exact(
        requirement: &PaymentRequirements,
        authorization: Authorization,
        signature: Bytes,
    ) -> Self {
        let resource = (!requirement.resource.is_empty()).then(|| requirement.resource.clone());
        Self {
            x402_version: V1,
            scheme: requirement.scheme.clone(),
            network: requirement.network.clone(),
            resource,
            payload: ExactPayload {
                signature,
                authorization,
            },
        }
    }

    /// The payer named in the authorization.
    #[must_use]
    pub const fn payer(&self) -> Address {
        self.payload.authorization.from
    }

    /// The signed authorization.
    #[must_use]
    pub const fn authorization(&self) -> &Authorization {
        &self.payload.authorization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn challenge_json() -> serde_json::Value {
        json!({
            "x402Version": 1,
            "accepts": [{
                "scheme": "exact",
                "network": "base-sepolia",
                "maxAmountRequired": "10000",
                "resource": "http://localhost:5001/protected",
                "description": "Access to protected content",
                "mimeType": "application/json",
                "payTo": "0x542C09793380BD873734d63Dc9f18aab6920C21B",
                "maxTimeoutSeconds": 60,
                "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
                "extra": { "name": "USDC", "version": "2" }
            }]
        })
    }

    #[test]
    fn test_payment_required_deserialize() {
        let required: PaymentRequired = serde_json::from_value(challenge_json()).unwrap();
        assert_eq!(required.accepts.len(), 1);
        let req = &required.accepts[0];
        assert_eq!(req.max_amount_required, TokenAmount::from(10_000));
        assert_eq!(req.extra, Some(AssetMeta::new("USDC", "2")));
        assert!(required.error.is_none());
    }

    #[test]
    fn test_payment_required_rejects_other_version() {
        let mut value = challenge_json();
        value["x402Version"] = json!(2);
        assert!(serde_json::from_value::<PaymentRequired>(value).is_err());
    }

    #[test]
    fn test_requirements_serialize_camel_case() {
        let required: PaymentRequired = serde_json::from_value(challenge_json()).unwrap();
        let value = serde_json::to_value(&required.accepts[0]).unwrap();
        assert_eq!(value["maxAmountRequired"], "10000");
        assert_eq!(value["maxTimeoutSeconds"], 60);
        assert!(value.get("outputSchema").is_none());
    }

    #[test]
    fn test_authorization_rejects_unknown_fields() {
        let value = json!({
            "from": "0x02998Da7aD2C929A22E66F9A4a4cFF90c8994B51",
            "to": "0x542C09793380BD873734d63Dc9f18aab6920C21B",
            "value": "10000",
            "validAfter": "0",
            "validBefore": "1750316065",
            "nonce": "0x6bb8970a31f5e7b0dc8a4ed202a03bf8bbc15ce36d4df006b698693e07240d6c",
            "extra": true
        });
        assert!(serde_json::from_value::<Authorization>(value).is_err());
    }
}
