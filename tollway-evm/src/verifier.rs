//! In-process payment verification.
//!
//! [`LocalVerifier`] performs the checks a remote facilitator would, minus
//! anything that needs chain state: no balance lookups, no settlement and no
//! nonce cache.

use std::convert::Infallible;

use alloy_primitives::{Address, Signature};
use tollway::domain::SigningDomain;
use tollway::facilitator::{BoxFuture, Facilitator};
use tollway::networks::NetworkRegistry;
use tollway::proto::{PaymentPayload, VerifyRequest, VerifyResponse};
use tollway::timestamp::UnixTimestamp;
use tollway::{ErrorKind, X402Error};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::eip712::signing_hash;

/// Machine-readable rejection reasons.
pub mod reason {
    /// The signature does not recover to `from`.
    pub const INVALID_SIGNATURE: &str = "invalid_signature";
    /// `to` is not the requirement's `payTo`.
    pub const RECIPIENT_MISMATCH: &str = "recipient_mismatch";
    /// `value` is not the requirement's `maxAmountRequired`.
    pub const AMOUNT_MISMATCH: &str = "amount_mismatch";
    /// `validBefore` has passed.
    pub const AUTHORIZATION_EXPIRED: &str = "authorization_expired";
    /// `validAfter` is in the future.
    pub const AUTHORIZATION_NOT_YET_VALID: &str = "authorization_not_yet_valid";
    /// The payload scheme differs from the requirement's.
    pub const SCHEME_MISMATCH: &str = "scheme_mismatch";
    /// The payload network differs from the requirement's.
    pub const NETWORK_MISMATCH: &str = "network_mismatch";
    /// The requirement names a network this verifier does not know.
    pub const UNSUPPORTED_NETWORK: &str = "unsupported_network";
    /// The requirement lacks the token's EIP-712 domain metadata.
    pub const MISSING_DOMAIN: &str = "missing_domain_metadata";
}

/// Recovers the address that signed `payload` under `domain`.
///
/// Returns `None` if the signature is not a well-formed 65-byte ECDSA
/// signature.
#[must_use]
pub fn recover_payer(payload: &PaymentPayload, domain: &SigningDomain) -> Option<Address> {
    let hash = signing_hash(domain, payload.authorization());
    Signature::from_raw(&payload.payload.signature)
        .ok()?
        .recover_address_from_prehash(&hash)
        .ok()
}

/// A [`Facilitator`] that verifies EOA signatures without leaving the process.
#[derive(Debug, Clone, Default)]
pub struct LocalVerifier {
    networks: NetworkRegistry,
}

impl LocalVerifier {
    /// Creates a verifier over the default network registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom network registry.
    #[must_use]
    pub fn with_networks(mut self, networks: NetworkRegistry) -> Self {
        self.networks = networks;
        self
    }

    /// Checks a request as of `now`.
    #[cfg_attr(feature = "telemetry", instrument(name = "local_verify", skip_all, fields(
        network = %request.payment_requirements.network,
        payer = %request.payment_payload.payer(),
    )))]
    #[must_use]
    pub fn check(&self, request: &VerifyRequest, now: UnixTimestamp) -> VerifyResponse {
        let payload = &request.payment_payload;
        let requirement = &request.payment_requirements;
        let auth = payload.authorization();
        let payer = Some(auth.from.to_string());
        let reject = |reason: &str| VerifyResponse::Invalid {
            reason: reason.to_owned(),
            payer: payer.clone(),
        };

        let failure = if payload.scheme != requirement.scheme {
            Some(reason::SCHEME_MISMATCH)
        } else if payload.network != requirement.network {
            Some(reason::NETWORK_MISMATCH)
        } else if auth.to != requirement.pay_to {
            Some(reason::RECIPIENT_MISMATCH)
        } else if auth.value != requirement.max_amount_required {
            Some(reason::AMOUNT_MISMATCH)
        } else if auth.valid_after > now {
            Some(reason::AUTHORIZATION_NOT_YET_VALID)
        } else if auth.valid_before <= now {
            Some(reason::AUTHORIZATION_EXPIRED)
        } else {
            None
        };
        if let Some(reason) = failure {
            return reject(reason);
        }

        let domain = match SigningDomain::for_requirement(requirement, &self.networks) {
            Ok(domain) => domain,
            Err(err) => return reject(domain_failure(&err)),
        };
        if recover_payer(payload, &domain) != Some(auth.from) {
            return reject(reason::INVALID_SIGNATURE);
        }

        VerifyResponse::valid(payer)
    }
}

const fn domain_failure(err: &X402Error) -> &'static str {
    match err.kind() {
        ErrorKind::UnsupportedNetwork => reason::UNSUPPORTED_NETWORK,
        _ => reason::MISSING_DOMAIN,
    }
}

impl Facilitator for LocalVerifier {
    type Error = Infallible;

    fn verify<'a>(
        &'a self,
        request: &'a VerifyRequest,
    ) -> BoxFuture<'a, Result<VerifyResponse, Self::Error>> {
        Box::pin(async move { Ok(self.check(request, UnixTimestamp::now())) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Eip712Signer;
    use alloy_primitives::{Bytes, address};
    use tollway::authorization::AuthorizationBuilder;
    use tollway::domain::TypedData;
    use tollway::proto::{AssetMeta, PaymentRequirements};
    use tollway::signer::Signer;

    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const NOW: UnixTimestamp = UnixTimestamp::from_secs(1_750_000_000);

    fn requirement() -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".into(),
            network: "base-sepolia".into(),
            max_amount_required: 10_000.into(),
            resource: "http://localhost:5001/protected".into(),
            description: "Access to protected content".into(),
            mime_type: "application/json".into(),
            output_schema: None,
            pay_to: address!("542C09793380BD873734d63Dc9f18aab6920C21B"),
            max_timeout_seconds: 60,
            asset: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
            extra: Some(AssetMeta::new("USDC", "2")),
        }
    }

    async fn signed_request(req: PaymentRequirements) -> VerifyRequest {
        let signer = Eip712Signer::from_private_key(ANVIL_KEY).unwrap();
        let auth = AuthorizationBuilder::new(&req, signer.address())
            .build_at(NOW)
            .unwrap();
        let domain = SigningDomain::for_requirement(&req, &NetworkRegistry::default()).unwrap();
        let sig = signer
            .sign_typed_data(&TypedData::transfer_with_authorization(&domain, &auth))
            .await
            .unwrap();
        let payload = PaymentPayload::exact(&req, auth, sig);
        VerifyRequest::new(payload, req)
    }

    fn reason_of(resp: &VerifyResponse) -> &str {
        match resp {
            VerifyResponse::Invalid { reason, .. } => reason,
            VerifyResponse::Valid { .. } => "valid",
        }
    }

    #[tokio::test]
    async fn test_valid_payment() {
        let request = signed_request(requirement()).await;
        let resp = LocalVerifier::new().check(&request, NOW + 1);
        assert_eq!(
            resp,
            VerifyResponse::valid(Some(
                "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_owned()
            ))
        );
    }

    #[tokio::test]
    async fn test_facilitator_trait_uses_wall_clock() {
        let request = signed_request(requirement()).await;
        let resp = LocalVerifier::new().verify(&request).await.unwrap();
        assert_eq!(reason_of(&resp), reason::AUTHORIZATION_EXPIRED);
    }

    #[tokio::test]
    async fn test_window_bounds() {
        let request = signed_request(requirement()).await;
        let verifier = LocalVerifier::new();
        assert!(verifier.check(&request, NOW + 59).is_valid());
        assert_eq!(
            reason_of(&verifier.check(&request, NOW + 60)),
            reason::AUTHORIZATION_EXPIRED
        );

        let mut early = request.clone();
        early.payment_payload.payload.authorization.valid_after = NOW + 30;
        assert_eq!(
            reason_of(&verifier.check(&early, NOW)),
            reason::AUTHORIZATION_NOT_YET_VALID
        );
    }

    #[tokio::test]
    async fn test_binding_checks() {
        let verifier = LocalVerifier::new();
        let request = signed_request(requirement()).await;

        let mut other = request.clone();
        other.payment_requirements.pay_to = address!("0000000000000000000000000000000000000001");
        assert_eq!(
            reason_of(&verifier.check(&other, NOW)),
            reason::RECIPIENT_MISMATCH
        );

        let mut other = request.clone();
        other.payment_requirements.max_amount_required = 100_000.into();
        assert_eq!(reason_of(&verifier.check(&other, NOW)), reason::AMOUNT_MISMATCH);

        let mut other = request.clone();
        other.payment_payload.network = "base".into();
        assert_eq!(reason_of(&verifier.check(&other, NOW)), reason::NETWORK_MISMATCH);

        let mut other = request;
        other.payment_payload.scheme = "upto".into();
        assert_eq!(reason_of(&verifier.check(&other, NOW)), reason::SCHEME_MISMATCH);
    }

    #[tokio::test]
    async fn test_tampered_fields_break_signature() {
        let verifier = LocalVerifier::new();
        let request = signed_request(requirement()).await;

        let mut tampered = request.clone();
        tampered.payment_payload.payload.authorization.valid_before = NOW + 3_600;
        assert_eq!(
            reason_of(&verifier.check(&tampered, NOW)),
            reason::INVALID_SIGNATURE
        );

        let mut tampered = request.clone();
        tampered.payment_payload.payload.signature = Bytes::from_static(&[0u8; 65]);
        assert_eq!(
            reason_of(&verifier.check(&tampered, NOW)),
            reason::INVALID_SIGNATURE
        );

        let mut tampered = request;
        tampered.payment_payload.payload.signature = Bytes::from_static(b"short");
        assert_eq!(
            reason_of(&verifier.check(&tampered, NOW)),
            reason::INVALID_SIGNATURE
        );
    }

    #[tokio::test]
    async fn test_unknown_network() {
        let mut req = requirement();
        req.network = "anvil".into();
        let mut request = signed_request(requirement()).await;
        request.payment_payload.network = "anvil".into();
        request.payment_requirements = req;
        assert_eq!(
            reason_of(&LocalVerifier::new().check(&request, NOW)),
            reason::UNSUPPORTED_NETWORK
        );
    }
}
