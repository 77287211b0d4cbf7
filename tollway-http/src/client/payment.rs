//! The paying client state machine.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::{HeaderValue, StatusCode};
use reqwest::{IntoUrl, Request};
use reqwest_middleware as rqm;
use serde_json::Value;
use tollway::X402Error;
use tollway::authorization::AuthorizationBuilder;
use tollway::codec;
use tollway::domain::{SigningDomain, TypedData};
use tollway::networks::NetworkRegistry;
use tollway::proto::PaymentPayload;
use tollway::signer::Signer;

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument, warn};

use super::negotiator::{Outcome, RequirementNegotiator, select};
use super::PaymentResponse;
use crate::constants::X_PAYMENT;

/// States of one [`PaymentClient`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentState {
    /// Nothing sent yet.
    Idle,
    /// The bare request is in flight.
    Probing,
    /// A 402 challenge was received and a requirement selected.
    AwaitingPayment,
    /// Building the authorization.
    Building,
    /// Waiting for the signer.
    Signing,
    /// Encoding the payment header.
    Encoding,
    /// The paid request is in flight.
    Retrying,
    /// Finished with a 200 response.
    Done,
    /// Finished with an error.
    Failed,
}

impl PaymentState {
    /// Returns `true` for [`Done`](Self::Done) and [`Failed`](Self::Failed).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks and logs the transitions of one call.
#[derive(Debug)]
struct Lifecycle {
    history: Vec<PaymentState>,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            history: vec![PaymentState::Idle],
        }
    }

    #[cfg_attr(not(any(test, feature = "telemetry")), allow(dead_code))]
    fn current(&self) -> PaymentState {
        self.history.last().copied().unwrap_or(PaymentState::Idle)
    }

    fn advance(&mut self, next: PaymentState) {
        #[cfg(feature = "telemetry")]
        debug!(from = %self.current(), to = %next, "payment state transition");
        self.history.push(next);
    }
}

/// An HTTP client that pays for `402 Payment Required` responses.
///
/// Cheap to clone; clones share the connection pool and the signer.
///
/// # Example
///
/// ```no_run
/// use tollway_http::client::PaymentClient;
/// use tollway_evm::Eip712Signer;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let signer = Eip712Signer::from_private_key(&std::env::var("PRIVATE_KEY")?)?;
/// let client = PaymentClient::new(signer);
/// let response = client.fetch("http://localhost:5001/protected").await?;
/// println!("{}", response.text());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PaymentClient<S> {
    negotiator: RequirementNegotiator,
    signer: Arc<S>,
    networks: Arc<NetworkRegistry>,
    amount: Option<String>,
    timeout: Option<Duration>,
}

impl<S> Clone for PaymentClient<S> {
    fn clone(&self) -> Self {
        Self {
            negotiator: self.negotiator.clone(),
            signer: Arc::clone(&self.signer),
            networks: Arc::clone(&self.networks),
            amount: self.amount.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S> PaymentClient<S> {
    /// Creates a client with a default reqwest transport.
    pub fn new(signer: S) -> Self {
        Self::with_transport(signer, rqm::ClientWithMiddleware::from(reqwest::Client::new()))
    }

    /// Creates a client sending through `transport`.
    pub fn with_transport(signer: S, transport: rqm::ClientWithMiddleware) -> Self {
        Self {
            negotiator: RequirementNegotiator::new(transport),
            signer: Arc::new(signer),
            networks: Arc::new(NetworkRegistry::default()),
            amount: None,
            timeout: None,
        }
    }

    /// Uses a custom network registry for signing domains.
    #[must_use]
    pub fn with_networks(mut self, networks: NetworkRegistry) -> Self {
        self.networks = Arc::new(networks);
        self
    }

    /// Pays `amount` instead of the requirement's `maxAmountRequired`.
    ///
    /// The override is validated when a payment is built.
    #[must_use]
    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    /// Applies a timeout to each request that does not set its own.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the signer.
    pub fn signer(&self) -> &S {
        &self.signer
    }
}

impl<S> PaymentClient<S>
where
    S: Signer,
{
    /// Sends a `GET` to `url`, paying if challenged.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn fetch(&self, url: impl IntoUrl) -> Result<PaymentResponse, X402Error> {
        let request = self
            .negotiator
            .transport()
            .get(url)
            .build()
            .map_err(X402Error::network)?;
        self.execute(request).await
    }

    /// Sends `request`, paying if challenged.
    ///
    /// The request body must be cloneable so it can be sent twice.
    ///
    /// # Errors
    ///
    /// Returns the [`X402Error`] of the stage that failed. A paid retry that
    /// is not answered with 200 is [`X402Error::InvalidAuthorization`]; a
    /// probe answered with anything but 200 or 402 is [`X402Error::Status`].
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.client.execute", skip_all, fields(url = %request.url()))
    )]
    pub async fn execute(&self, request: Request) -> Result<PaymentResponse, X402Error> {
        let mut lifecycle = Lifecycle::new();
        let result = self.run(request, &mut lifecycle).await;
        #[cfg(feature = "telemetry")]
        if let Err(err) = &result {
            warn!(state = %lifecycle.current(), kind = %err.kind(), error = %err, "payment failed");
        }
        if result.is_err() {
            lifecycle.advance(PaymentState::Failed);
        }
        result
    }

    async fn run(
        &self,
        mut request: Request,
        lifecycle: &mut Lifecycle,
    ) -> Result<PaymentResponse, X402Error> {
        if let Some(timeout) = self.timeout {
            request.timeout_mut().get_or_insert(timeout);
        }
        let mut retry = request
            .try_clone()
            .ok_or_else(|| X402Error::network("request body cannot be cloned for the paid retry"))?;

        lifecycle.advance(PaymentState::Probing);
        let required = match self.negotiator.probe(request).await? {
            Outcome::Success(response) => {
                lifecycle.advance(PaymentState::Done);
                return Ok(response);
            }
            Outcome::Error { status, body } => {
                return Err(X402Error::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            Outcome::PaymentRequired(required) => required,
        };

        lifecycle.advance(PaymentState::AwaitingPayment);
        let requirement = select(&required)
            .ok_or_else(|| X402Error::MalformedChallenge("accepts is empty".into()))?;

        lifecycle.advance(PaymentState::Building);
        let domain = SigningDomain::for_requirement(requirement, &self.networks)?;
        let authorization = AuthorizationBuilder::new(requirement, self.signer.address())
            .with_amount(self.amount.as_deref())
            .build()?;

        lifecycle.advance(PaymentState::Signing);
        let signature = self
            .signer
            .sign_typed_data(&TypedData::transfer_with_authorization(&domain, &authorization))
            .await?;

        lifecycle.advance(PaymentState::Encoding);
        let payload = PaymentPayload::exact(requirement, authorization, signature);
        let header = codec::encode(&payload).map_err(|e| X402Error::Encode(e.into()))?;
        let header = HeaderValue::try_from(header).map_err(|e| X402Error::Encode(e.into()))?;
        retry.headers_mut().insert(X_PAYMENT, header);

        lifecycle.advance(PaymentState::Retrying);
        let response = self
            .negotiator
            .transport()
            .execute(retry)
            .await
            .map_err(X402Error::network)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(X402Error::network)?.to_vec();

        if status != StatusCode::OK {
            return Err(X402Error::InvalidAuthorization {
                status: status.as_u16(),
                reason: rejection_reason(status, &body),
            });
        }

        lifecycle.advance(PaymentState::Done);
        Ok(PaymentResponse {
            status,
            headers,
            body,
            payment: Some(payload),
        })
    }
}

/// The server's `error` field, else the raw body, else the status text.
fn rejection_reason(status: StatusCode, body: &[u8]) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body)
        && let Some(Value::String(error)) = map.get("error")
    {
        return error.clone();
    }
    let text = String::from_utf8_lossy(body).trim().to_owned();
    if text.is_empty() {
        status.canonical_reason().unwrap_or("rejected").to_owned()
    } else {
        text
    }
}
