//! Verification boundary.
//!
//! A [`Facilitator`] independently checks a payment payload against the
//! requirement it claims to satisfy. The HTTP transport provides a remote
//! implementation; `tollway-evm` provides an in-process one.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::proto::{VerifyRequest, VerifyResponse};

/// A boxed, `Send` future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Verifies payment payloads.
///
/// An `Err` means no verdict could be obtained (outage, timeout, garbage
/// reply). A rejected payment is an `Ok(VerifyResponse::Invalid { .. })`.
pub trait Facilitator: Send + Sync {
    /// Why no verdict could be obtained.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Verifies a payload against its requirement.
    fn verify<'a>(
        &'a self,
        request: &'a VerifyRequest,
    ) -> BoxFuture<'a, Result<VerifyResponse, Self::Error>>;
}

impl<T: Facilitator + ?Sized> Facilitator for Arc<T> {
    type Error = T::Error;

    fn verify<'a>(
        &'a self,
        request: &'a VerifyRequest,
    ) -> BoxFuture<'a, Result<VerifyResponse, Self::Error>> {
        (**self).verify(request)
    }
}
