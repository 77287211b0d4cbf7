//! Routes of the demo API.
//!
//! - `GET /` - service info and tier table
//! - `GET /health` - liveness plus payment settings
//! - `GET /status` - version and endpoint table
//! - `GET /free` - no payment
//! - `GET /protected`, `/premium`, `/enterprise` - one price each

use axum::extract::State;
use axum::http::Method;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{Value, json};
use tollway::facilitator::Facilitator;
use tollway::networks::NetworkRegistry;
use tollway_http::server::{PriceTag, VerificationGate, VerifiedPayment};
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::ServerError;

/// A priced route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    /// Route path.
    pub path: &'static str,
    /// Tier name reported to the payer.
    pub name: &'static str,
    /// Price in USDC minor units.
    pub amount: u64,
    /// What the payment grants.
    pub description: &'static str,
}

/// The priced tiers, cheapest first.
pub const TIERS: &[Tier] = &[
    Tier {
        path: "/protected",
        name: "basic",
        amount: 10_000,
        description: "Access to protected content",
    },
    Tier {
        path: "/premium",
        name: "premium",
        amount: 100_000,
        description: "Premium content with market analysis",
    },
    Tier {
        path: "/enterprise",
        name: "enterprise",
        amount: 1_000_000,
        description: "Enterprise data feed with full history",
    },
];

#[derive(Clone)]
struct Info {
    pay_to: String,
    network: String,
    facilitator: String,
}

/// Builds the application router.
///
/// # Errors
///
/// Returns [`ServerError::UnsupportedNetwork`] if the configured network has
/// no known USDC deployment.
pub fn app<F>(gate: &VerificationGate<F>, config: &ServerConfig) -> Result<Router, ServerError>
where
    F: Facilitator + Clone + 'static,
{
    let registry = NetworkRegistry::default();
    let network = registry
        .get(&config.network)
        .ok_or_else(|| ServerError::UnsupportedNetwork(config.network.clone()))?;

    let mut router = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/free", get(free));

    for tier in TIERS {
        let price = PriceTag::usdc(network, tier.amount, config.pay_to)
            .ok_or_else(|| ServerError::UnsupportedNetwork(config.network.clone()))?
            .with_description(tier.description);
        let tier = *tier;
        router = router.route(
            tier.path,
            get(move |Extension(payment): Extension<VerifiedPayment>| paid(tier, payment))
                .route_layer(gate.with_price(price)),
        );
    }

    let info = Info {
        pay_to: config.pay_to.to_string(),
        network: config.network.clone(),
        facilitator: config.facilitator_url.clone(),
    };
    Ok(router
        .with_state(info)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET])
                .allow_headers(cors::Any)
                .expose_headers(cors::Any),
        ))
}

async fn index(State(info): State<Info>) -> Json<Value> {
    let tiers: Vec<Value> = TIERS
        .iter()
        .map(|t| json!({ "path": t.path, "tier": t.name, "price": t.amount.to_string() }))
        .collect();
    Json(json!({
        "service": "tollway-server",
        "version": env!("CARGO_PKG_VERSION"),
        "network": info.network,
        "free": "/free",
        "tiers": tiers,
    }))
}

async fn health(State(info): State<Info>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "payTo": info.pay_to,
        "facilitator": info.facilitator,
    }))
}

async fn status(State(info): State<Info>) -> Json<Value> {
    let mut endpoints = serde_json::Map::new();
    for path in ["/", "/health", "/status", "/free"] {
        endpoints.insert(path.to_owned(), json!({ "access": "free" }));
    }
    for tier in TIERS {
        endpoints.insert(
            tier.path.to_owned(),
            json!({
                "access": tier.name,
                "price": tier.amount.to_string(),
                "network": info.network,
            }),
        );
    }
    Json(json!({
        "status": "running",
        "service": "tollway-server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
    }))
}

async fn free() -> Json<Value> {
    Json(json!({
        "message": "This content is free",
        "tier": "free",
    }))
}

async fn paid(tier: Tier, payment: VerifiedPayment) -> Json<Value> {
    tracing::info!(tier = tier.name, payer = %payment.payer, "serving paid content");
    Json(json!({
        "message": format!("Welcome to the {} tier", tier.name),
        "tier": tier.name,
        "description": tier.description,
        "payer": payment.payer.to_string(),
    }))
}
