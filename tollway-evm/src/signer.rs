//! Alloy-backed typed-data signer.

use alloy_primitives::{Address, Bytes};
use alloy_signer::Signer as AlloySigner;
use alloy_signer_local::PrivateKeySigner;
use tollway::domain::{TRANSFER_WITH_AUTHORIZATION, TypedData};
use tollway::signer::{Signer, SignerError};

use crate::eip712::signing_hash;

/// Signs `TransferWithAuthorization` typed data with any alloy signer.
///
/// Each call hashes and signs independently, so one instance can be shared
/// across concurrent payments.
///
/// # Example
///
/// ```
/// use tollway::signer::Signer;
/// use tollway_evm::Eip712Signer;
///
/// let signer = Eip712Signer::from_private_key(
///     "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
/// )?;
/// assert_eq!(
///     signer.address().to_string(),
///     "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
/// );
/// # Ok::<(), tollway::signer::SignerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Eip712Signer<S> {
    inner: S,
}

impl<S> Eip712Signer<S> {
    /// Wraps an alloy signer.
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Returns the wrapped signer.
    pub const fn inner(&self) -> &S {
        &self.inner
    }
}

impl Eip712Signer<PrivateKeySigner> {
    /// Creates a signer from a hex-encoded secp256k1 private key.
    ///
    /// # Errors
    ///
    /// Returns a [`SignerError`] if the key is not valid.
    pub fn from_private_key(key: &str) -> Result<Self, SignerError> {
        let signer: PrivateKeySigner = key.trim().parse().map_err(SignerError::new)?;
        Ok(Self::new(signer))
    }
}

#[async_trait::async_trait]
impl<S> Signer for Eip712Signer<S>
where
    S: AlloySigner + Send + Sync,
{
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_typed_data(&self, data: &TypedData<'_>) -> Result<Bytes, SignerError> {
        if data.primary_type != TRANSFER_WITH_AUTHORIZATION {
            return Err(SignerError::new(format!(
                "unsupported primary type {:?}",
                data.primary_type
            )));
        }
        let hash = signing_hash(data.domain, data.message);
        let signature = self.inner.sign_hash(&hash).await.map_err(SignerError::new)?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(signer = %self.inner.address(), digest = %hash, "signed authorization");

        Ok(Bytes::copy_from_slice(&signature.as_bytes()))
    }
}
