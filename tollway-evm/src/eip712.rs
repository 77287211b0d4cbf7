//! EIP-712 hashing of `TransferWithAuthorization`.

use alloy_primitives::{B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain, sol};
use tollway::domain::SigningDomain;
use tollway::proto::Authorization;

sol!(
    /// ERC-3009 `transferWithAuthorization` message as signed by the payer.
    ///
    /// Field order and types must match the token contract, since the
    /// verifier rebuilds this struct from the wire authorization.
    #[derive(Debug)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

impl From<&Authorization> for TransferWithAuthorization {
    fn from(auth: &Authorization) -> Self {
        Self {
            from: auth.from,
            to: auth.to,
            value: auth.value.inner(),
            validAfter: U256::from(auth.valid_after.as_secs()),
            validBefore: U256::from(auth.valid_before.as_secs()),
            nonce: auth.nonce,
        }
    }
}

/// Converts a [`SigningDomain`] to alloy's domain type.
#[must_use]
pub fn to_eip712_domain(domain: &SigningDomain) -> Eip712Domain {
    eip712_domain! {
        name: domain.name.clone(),
        version: domain.version.clone(),
        chain_id: domain.chain_id,
        verifying_contract: domain.verifying_contract,
    }
}

/// The digest a payer signs for `authorization` under `domain`.
#[must_use]
pub fn signing_hash(domain: &SigningDomain, authorization: &Authorization) -> B256 {
    TransferWithAuthorization::from(authorization).eip712_signing_hash(&to_eip712_domain(domain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use tollway::domain::TRANSFER_WITH_AUTHORIZATION_TYPE;
    use tollway::timestamp::UnixTimestamp;

    fn domain() -> SigningDomain {
        SigningDomain {
            name: "USDC".into(),
            version: "2".into(),
            chain_id: 84532,
            verifying_contract: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
        }
    }

    fn authorization() -> Authorization {
        Authorization {
            from: address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            to: address!("542C09793380BD873734d63Dc9f18aab6920C21B"),
            value: 10_000.into(),
            valid_after: UnixTimestamp::EPOCH,
            valid_before: UnixTimestamp::from_secs(1_750_316_065),
            nonce: B256::repeat_byte(0x11),
        }
    }

    #[test]
    fn test_type_string_matches_core_constant() {
        assert_eq!(
            TransferWithAuthorization::eip712_root_type(),
            TRANSFER_WITH_AUTHORIZATION_TYPE
        );
    }

    #[test]
    fn test_hash_binds_every_field() {
        let base = signing_hash(&domain(), &authorization());
        assert_eq!(base, signing_hash(&domain(), &authorization()));

        let mut auth = authorization();
        auth.value = 10_001.into();
        assert_ne!(base, signing_hash(&domain(), &auth));

        let mut auth = authorization();
        auth.nonce = B256::repeat_byte(0x12);
        assert_ne!(base, signing_hash(&domain(), &auth));

        let mut other = domain();
        other.chain_id = 8453;
        assert_ne!(base, signing_hash(&other, &authorization()));
    }
}
