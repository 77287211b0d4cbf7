//! The signing capability a payer must provide.
//!
//! Key material never enters this crate. A [`Signer`] owns an identity and
//! signs one [`TypedData`] request at a time; implementations must be safe to
//! call concurrently for the same identity.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes};

use crate::domain::TypedData;

/// A signer failed or refused to sign.
#[derive(Debug, thiserror::Error)]
#[error("signer error: {0}")]
pub struct SignerError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl SignerError {
    /// Wraps any error as a signer failure.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

/// An EIP-712 typed-data signer.
#[async_trait::async_trait]
pub trait Signer: Send + Sync {
    /// The address that signatures recover to.
    fn address(&self) -> Address;

    /// Signs the typed data and returns the raw signature bytes.
    async fn sign_typed_data(&self, data: &TypedData<'_>) -> Result<Bytes, SignerError>;
}

#[async_trait::async_trait]
impl<T: Signer + ?Sized> Signer for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn sign_typed_data(&self, data: &TypedData<'_>) -> Result<Bytes, SignerError> {
        (**self).sign_typed_data(data).await
    }
}
