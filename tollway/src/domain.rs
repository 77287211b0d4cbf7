//! EIP-712 signing domain and typed-data envelope.
//!
//! Client and verifier must derive the same [`SigningDomain`] from a
//! requirement, otherwise the recovered signer will not match `from`.

use alloy_primitives::Address;

use crate::error::X402Error;
use crate::networks::NetworkRegistry;
use crate::proto::{Authorization, PaymentRequirements};

/// Primary type name of the signed message.
pub const TRANSFER_WITH_AUTHORIZATION: &str = "TransferWithAuthorization";

/// Canonical EIP-712 type string of [`TRANSFER_WITH_AUTHORIZATION`].
pub const TRANSFER_WITH_AUTHORIZATION_TYPE: &str = "TransferWithAuthorization(address from,address to,uint256 value,uint256 validAfter,uint256 validBefore,bytes32 nonce)";

/// The EIP-712 domain of a token contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningDomain {
    /// Domain name (e.g. `"USDC"`).
    pub name: String,
    /// Domain version (e.g. `"2"`).
    pub version: String,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Token contract address.
    pub verifying_contract: Address,
}

impl SigningDomain {
    /// Derives the domain for a requirement.
    ///
    /// Name and version come from the requirement's `extra`. If it is
    /// absent and the asset is the registry's USDC deployment for the
    /// network, that deployment's name and version are used.
    ///
    /// # Errors
    ///
    /// [`X402Error::UnsupportedNetwork`] if the network is not registered,
    /// [`X402Error::MalformedChallenge`] if name and version cannot be
    /// determined.
    pub fn for_requirement(
        requirement: &PaymentRequirements,
        registry: &NetworkRegistry,
    ) -> Result<Self, X402Error> {
        let network = registry
            .get(&requirement.network)
            .ok_or_else(|| X402Error::UnsupportedNetwork(requirement.network.clone()))?;

        let (name, version) = match (&requirement.extra, network.usdc) {
            (Some(meta), _) => (meta.name.clone(), meta.version.clone()),
            (None, Some(usdc)) if usdc.address == requirement.asset => {
                (usdc.name.to_owned(), usdc.version.to_owned())
            }
            (None, _) => {
                return Err(X402Error::MalformedChallenge(format!(
                    "no EIP-712 domain metadata for asset {} on {}",
                    requirement.asset, requirement.network
                )));
            }
        };

        Ok(Self {
            name,
            version,
            chain_id: network.chain_id,
            verifying_contract: requirement.asset,
        })
    }
}

/// A typed-data signing request handed to a [`Signer`](crate::signer::Signer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedData<'a> {
    /// The signing domain.
    pub domain: &'a SigningDomain,
    /// Primary type name.
    pub primary_type: &'a str,
    /// The message.
    pub message: &'a Authorization,
}

impl<'a> TypedData<'a> {
    /// A `TransferWithAuthorization` signing request.
    #[must_use]
    pub const fn transfer_with_authorization(
        domain: &'a SigningDomain,
        message: &'a Authorization,
    ) -> Self {
        Self {
            domain,
            primary_type: TRANSFER_WITH_AUTHORIZATION,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::proto::AssetMeta;
    use alloy_primitives::address;

    fn requirement(network: &str, extra: Option<AssetMeta>) -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".into(),
            network: network.into(),
            max_amount_required: 10_000.into(),
            resource: "http://localhost:5001/protected".into(),
            description: String::new(),
            mime_type: String::new(),
            output_schema: None,
            pay_to: address!("542C09793380BD873734d63Dc9f18aab6920C21B"),
            max_timeout_seconds: 60,
            asset: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
            extra,
        }
    }

    #[test]
    fn test_domain_from_extra() {
        let req = requirement("base-sepolia", Some(AssetMeta::new("Custom", "7")));
        let domain = SigningDomain::for_requirement(&req, &NetworkRegistry::default()).unwrap();
        assert_eq!(domain.name, "Custom");
        assert_eq!(domain.version, "7");
        assert_eq!(domain.chain_id, 84532);
        assert_eq!(domain.verifying_contract, req.asset);
    }

    #[test]
    fn test_domain_falls_back_to_known_usdc() {
        let req = requirement("base-sepolia", None);
        let domain = SigningDomain::for_requirement(&req, &NetworkRegistry::default()).unwrap();
        assert_eq!((domain.name.as_str(), domain.version.as_str()), ("USDC", "2"));
    }

    #[test]
    fn test_domain_unknown_asset_without_extra() {
        let mut req = requirement("base-sepolia", None);
        req.asset = address!("0000000000000000000000000000000000000001");
        let err = SigningDomain::for_requirement(&req, &NetworkRegistry::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedChallenge);
    }

    #[test]
    fn test_domain_unknown_network() {
        let req = requirement("solana", Some(AssetMeta::new("USDC", "2")));
        let err = SigningDomain::for_requirement(&req, &NetworkRegistry::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedNetwork);
    }
}
