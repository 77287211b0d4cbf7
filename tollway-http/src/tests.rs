//! End-to-end protocol scenarios: the paying client against the gate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use alloy_primitives::{Address, address};
use axum::body::{Body, to_bytes};
use axum::routing::get;
use axum::{Extension, Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{Request, StatusCode};
use serde_json::{Value, json};
use tollway::facilitator::{BoxFuture, Facilitator};
use tollway::networks::NetworkRegistry;
use tollway::proto::{PaymentPayload, PaymentRequired, VerifyRequest, VerifyResponse};
use tollway::signer::Signer;
use tollway::{ErrorKind, X402Error};
use tollway_evm::{Eip712Signer, LocalVerifier};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::PaymentClient;
use crate::server::{FacilitatorClient, PriceTag, VerificationGate, VerifiedPayment};

const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const PAY_TO: Address = address!("542C09793380BD873734d63Dc9f18aab6920C21B");
const USDC: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

#[derive(Clone)]
struct Counting<F> {
    inner: F,
    calls: Arc<AtomicUsize>,
}

impl<F: Facilitator> Facilitator for Counting<F> {
    type Error = F::Error;

    fn verify<'a>(
        &'a self,
        request: &'a VerifyRequest,
    ) -> BoxFuture<'a, Result<VerifyResponse, Self::Error>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(request)
    }
}

#[derive(Clone)]
struct Unreachable;

impl Facilitator for Unreachable {
    type Error = std::io::Error;

    fn verify<'a>(
        &'a self,
        _request: &'a VerifyRequest,
    ) -> BoxFuture<'a, Result<VerifyResponse, Self::Error>> {
        Box::pin(async { Err(std::io::Error::other("connection refused")) })
    }
}

fn tier(name: &str, amount: u64) -> PriceTag {
    let registry = NetworkRegistry::default();
    let network = registry.get("base-sepolia").unwrap();
    PriceTag::usdc(network, amount, PAY_TO)
        .unwrap()
        .with_description(format!("{name} tier"))
}

async fn echo(Extension(payment): Extension<VerifiedPayment>) -> Json<PaymentPayload> {
    Json(PaymentPayload::clone(&payment.payload))
}

async fn free() -> Json<Value> {
    Json(json!({ "tier": "free", "message": "no payment needed" }))
}

fn app<F>(gate: &VerificationGate<F>) -> Router
where
    F: Facilitator + Clone + 'static,
{
    Router::new()
        .route("/free", get(free))
        .route("/protected", get(echo).route_layer(gate.with_price(tier("basic", 10_000))))
        .route("/premium", get(echo).route_layer(gate.with_price(tier("premium", 100_000))))
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

async fn challenge(app: Router, request: Request<Body>) -> PaymentRequired {
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn paying_client() -> PaymentClient<Eip712Signer<alloy_signer_local::PrivateKeySigner>> {
    PaymentClient::new(Eip712Signer::from_private_key(ANVIL_KEY).unwrap())
}

#[tokio::test]
async fn test_free_path_needs_no_payment() {
    let base = spawn(app(&VerificationGate::new(LocalVerifier::new()))).await;
    let response = paying_client().fetch(format!("{base}/free")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json::<Value>().unwrap()["tier"], "free");
    assert!(!response.is_paid());
}

#[tokio::test]
async fn test_priced_path_challenges_with_route_price() {
    let gate = VerificationGate::new(LocalVerifier::new());
    let request = Request::get("/protected")
        .header("host", "api.example.com")
        .body(Body::empty())
        .unwrap();
    let required = challenge(app(&gate), request).await;

    assert_eq!(required.accepts.len(), 1);
    let accepted = &required.accepts[0];
    assert_eq!(accepted.scheme, "exact");
    assert_eq!(accepted.network, "base-sepolia");
    assert_eq!(accepted.max_amount_required.to_string(), "10000");
    assert_eq!(accepted.pay_to, PAY_TO);
    assert_eq!(accepted.asset, USDC);
    assert_eq!(accepted.resource, "http://api.example.com/protected");
    assert_eq!(required.error.as_deref(), Some("X-PAYMENT header is required"));

    let premium = Request::get("/premium").body(Body::empty()).unwrap();
    let required = challenge(app(&gate), premium).await;
    assert_eq!(required.accepts[0].max_amount_required.to_string(), "100000");
    assert_eq!(required.accepts[0].description, "premium tier");
}

#[tokio::test]
async fn test_paid_request_reaches_handler_unchanged() {
    let verifier = Counting {
        inner: LocalVerifier::new(),
        calls: Arc::default(),
    };
    let calls = Arc::clone(&verifier.calls);
    let base = spawn(app(&VerificationGate::new(verifier))).await;

    let client = paying_client();
    let response = client.fetch(format!("{base}/protected")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let sent = response.payment.clone().unwrap();
    let auth = sent.authorization();
    assert_eq!(auth.from, client.signer().address());
    assert_eq!(auth.to, PAY_TO);
    assert_eq!(auth.value.to_string(), "10000");
    assert_eq!(auth.valid_after.as_secs(), 0);

    let received: PaymentPayload = response.json().unwrap();
    assert_eq!(received, sent);
    assert_eq!(
        serde_json::to_vec(&received).unwrap(),
        serde_json::to_vec(&sent).unwrap()
    );
}

#[tokio::test]
async fn test_rejected_signature_reaches_client_as_invalid_authorization() {
    let facilitator = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "isValid": false, "reason": "signature mismatch" })),
        )
        .expect(1)
        .mount(&facilitator)
        .await;

    let gate = VerificationGate::try_from_url(&facilitator.uri()).unwrap();
    let base = spawn(app(&gate)).await;

    let err = paying_client()
        .fetch(format!("{base}/protected"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAuthorization);
    assert!(matches!(
        err,
        X402Error::InvalidAuthorization { status: 402, ref reason } if reason == "signature mismatch"
    ));
}

#[tokio::test]
async fn test_malformed_base64_is_rejected_before_handler() {
    let verifier = Counting {
        inner: LocalVerifier::new(),
        calls: Arc::default(),
    };
    let calls = Arc::clone(&verifier.calls);
    let request = Request::get("/protected")
        .header("x-payment", "not*base64!")
        .body(Body::empty())
        .unwrap();
    let required = challenge(app(&VerificationGate::new(verifier)), request).await;

    assert!(required.error.unwrap().starts_with("Base64Error"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repeated_payment_header_is_rejected() {
    let verifier = Counting {
        inner: LocalVerifier::new(),
        calls: Arc::default(),
    };
    let calls = Arc::clone(&verifier.calls);
    let request = Request::get("/protected")
        .header("x-payment", "AAAA")
        .header("x-payment", "not*base64!")
        .body(Body::empty())
        .unwrap();
    let required = challenge(app(&VerificationGate::new(verifier)), request).await;

    assert_eq!(
        required.error.as_deref(),
        Some("X-PAYMENT header must not be repeated")
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_future_version_fails_fast() {
    let facilitator = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "isValid": true })))
        .expect(0)
        .mount(&facilitator)
        .await;
    let gate = VerificationGate::new(Arc::new(FacilitatorClient::try_from(facilitator.uri()).unwrap()));

    let v2 = json!({
        "x402Version": 2,
        "scheme": "exact",
        "network": "base-sepolia",
        "payload": {
            "signature": "0x00",
            "authorization": {
                "from": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                "to": "0x542C09793380BD873734d63Dc9f18aab6920C21B",
                "value": "10000",
                "validAfter": "0",
                "validBefore": "9999999999",
                "nonce": "0x0000000000000000000000000000000000000000000000000000000000000001"
            }
        }
    });
    let header = STANDARD.encode(serde_json::to_vec(&v2).unwrap());
    let request = Request::get("/protected")
        .header("x-payment", header)
        .body(Body::empty())
        .unwrap();
    let required = challenge(app(&gate), request).await;
    assert!(required.error.unwrap().starts_with("VersionError"));
}

#[tokio::test]
async fn test_facilitator_outage_is_distinct_from_rejection() {
    let client = paying_client();
    let base = spawn(app(&VerificationGate::new(Unreachable))).await;

    let err = client.fetch(format!("{base}/protected")).await.unwrap_err();
    assert!(matches!(
        err,
        X402Error::InvalidAuthorization { ref reason, .. } if reason.starts_with("facilitator unavailable")
    ));
}

#[tokio::test]
async fn test_wrong_network_never_reaches_facilitator() {
    let verifier = Counting {
        inner: LocalVerifier::new(),
        calls: Arc::default(),
    };
    let calls = Arc::clone(&verifier.calls);
    let gate = VerificationGate::new(verifier);
    let base = spawn(
        Router::new().route(
            "/protected",
            get(echo).route_layer(gate.with_price(tier("basic", 10_000))),
        ),
    )
    .await;

    let probe = reqwest::get(format!("{base}/protected")).await.unwrap();
    assert_eq!(probe.status(), StatusCode::PAYMENT_REQUIRED);

    let header = {
        let payload = json!({
            "x402Version": 1,
            "scheme": "exact",
            "network": "base",
            "payload": {
                "signature": "0x00",
                "authorization": {
                    "from": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                    "to": "0x542C09793380BD873734d63Dc9f18aab6920C21B",
                    "value": "10000",
                    "validAfter": "0",
                    "validBefore": "9999999999",
                    "nonce": "0x0000000000000000000000000000000000000000000000000000000000000001"
                }
            }
        });
        STANDARD.encode(serde_json::to_vec(&payload).unwrap())
    };
    let rejected = reqwest::Client::new()
        .get(format!("{base}/protected"))
        .header("x-payment", header)
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::PAYMENT_REQUIRED);
    let body: Value = rejected.json().await.unwrap();
    assert_eq!(body["error"], "no matching payment requirements");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
