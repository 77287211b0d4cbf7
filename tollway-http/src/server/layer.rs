//! Tower middleware enforcing x402 payments on priced routes.
//!
//! Create one [`VerificationGate`] per application, then one [`GateLayer`]
//! per priced route:
//!
//! ```ignore
//! let gate = VerificationGate::try_from_url("https://x402.org/facilitator")?;
//! let app = Router::new().route(
//!     "/protected",
//!     get(handler).route_layer(gate.with_price(price).with_description("Basic tier")),
//! );
//! ```
//!
//! Each layer owns its own [`PriceTag`]; layers built from the same gate
//! share only the facilitator.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum_core::extract::Request;
use axum_core::response::Response;
use tollway::facilitator::Facilitator;
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};
use url::Url;

use super::facilitator_client::{FacilitatorClient, FacilitatorClientError};
use super::paygate::Paygate;
use super::price::PriceTag;

/// Application-wide gate configuration: the facilitator and the public base URL.
#[derive(Clone, Debug)]
pub struct VerificationGate<F> {
    facilitator: F,
    base_url: Option<Arc<Url>>,
}

impl<F> VerificationGate<F> {
    /// Creates a gate verifying through `facilitator`.
    pub const fn new(facilitator: F) -> Self {
        Self {
            facilitator,
            base_url: None,
        }
    }

    /// Returns a reference to the underlying facilitator.
    pub const fn facilitator(&self) -> &F {
        &self.facilitator
    }

    /// Sets the public base URL used to derive resource URLs.
    ///
    /// Without it the request's `Host` header is used.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(Arc::new(base_url));
        self
    }
}

impl VerificationGate<Arc<FacilitatorClient>> {
    /// Creates a gate backed by a remote facilitator.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid base URL.
    pub fn try_from_url(url: &str) -> Result<Self, FacilitatorClientError> {
        FacilitatorClient::try_from(url).map(|client| Self::new(Arc::new(client)))
    }
}

impl<F: Clone> VerificationGate<F> {
    /// Builds the layer for one route.
    #[must_use]
    pub fn with_price(&self, price: PriceTag) -> GateLayer<F> {
        GateLayer {
            facilitator: self.facilitator.clone(),
            base_url: self.base_url.clone(),
            price: Arc::new(price),
        }
    }
}

/// A [`Layer`] enforcing one price on one route.
#[derive(Clone, Debug)]
pub struct GateLayer<F> {
    facilitator: F,
    base_url: Option<Arc<Url>>,
    price: Arc<PriceTag>,
}

impl<F> GateLayer<F> {
    /// Returns the route's price.
    pub fn price(&self) -> &PriceTag {
        &self.price
    }

    /// Sets a description of what the payment grants access to.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.price).description = description.into();
        self
    }

    /// Sets the MIME type of the protected resource.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.price).mime_type = mime_type.into();
        self
    }

    /// Pins the resource URL instead of deriving it per request.
    #[must_use]
    pub fn with_resource(mut self, resource: Url) -> Self {
        Arc::make_mut(&mut self.price).resource = Some(resource);
        self
    }
}

impl<S, F> Layer<S> for GateLayer<F>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    F: Facilitator + Clone,
{
    type Service = GateService<F>;

    fn layer(&self, inner: S) -> Self::Service {
        GateService {
            facilitator: self.facilitator.clone(),
            base_url: self.base_url.clone(),
            price: Arc::clone(&self.price),
            inner: BoxCloneSyncService::new(inner),
        }
    }
}

/// The service produced by [`GateLayer`].
#[derive(Clone)]
#[allow(missing_debug_implementations)] // BoxCloneSyncService does not implement Debug
pub struct GateService<F> {
    facilitator: F,
    base_url: Option<Arc<Url>>,
    price: Arc<PriceTag>,
    inner: BoxCloneSyncService<Request, Response, Infallible>,
}

impl<F> Service<Request> for GateService<F>
where
    F: Facilitator + Clone + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let resource = self.price.resource_url(self.base_url.as_deref(), &req);
        let gate = Paygate {
            facilitator: self.facilitator.clone(),
            requirement: Arc::new(self.price.requirement(resource)),
        };
        let inner = self.inner.clone();
        Box::pin(gate.handle_request(inner, req))
    }
}
