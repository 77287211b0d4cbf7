//! Static per-route pricing.

use alloy_primitives::Address;
use http::Request;
use http::header::HOST;
use tollway::amount::TokenAmount;
use tollway::networks::NetworkInfo;
use tollway::proto::{AssetMeta, EXACT_SCHEME, PaymentRequirements};
use url::Url;

/// The price of one route, fixed when the route is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTag {
    /// Amount in the asset's minor units.
    pub amount: TokenAmount,
    /// Token contract address.
    pub asset: Address,
    /// Recipient of the payment.
    pub pay_to: Address,
    /// Network name (e.g. `"base-sepolia"`).
    pub network: String,
    /// Payment scheme. Always `"exact"` unless overridden.
    pub scheme: String,
    /// Longest validity an authorization may claim.
    pub max_timeout_seconds: u64,
    /// EIP-712 domain of the token.
    pub asset_meta: Option<AssetMeta>,
    /// What the payment grants.
    pub description: String,
    /// MIME type of the resource.
    pub mime_type: String,
    /// Fixed resource URL. Derived from each request when unset.
    pub resource: Option<Url>,
}

impl PriceTag {
    /// Creates a price tag for the `exact` scheme.
    pub fn new(
        amount: impl Into<TokenAmount>,
        asset: Address,
        pay_to: Address,
        network: impl Into<String>,
    ) -> Self {
        Self {
            amount: amount.into(),
            asset,
            pay_to,
            network: network.into(),
            scheme: EXACT_SCHEME.to_owned(),
            max_timeout_seconds: 60,
            asset_meta: None,
            description: String::new(),
            mime_type: "application/json".to_owned(),
            resource: None,
        }
    }

    /// Prices a route in the network's canonical USDC.
    ///
    /// Returns `None` if the network has no known USDC deployment.
    pub fn usdc(network: &NetworkInfo, amount: impl Into<TokenAmount>, pay_to: Address) -> Option<Self> {
        let usdc = network.usdc?;
        Some(
            Self::new(amount, usdc.address, pay_to, network.name)
                .with_asset_meta(AssetMeta::new(usdc.name, usdc.version)),
        )
    }

    /// Sets the token's EIP-712 name and version, sent as `extra`.
    #[must_use]
    pub fn with_asset_meta(mut self, meta: AssetMeta) -> Self {
        self.asset_meta = Some(meta);
        self
    }

    /// Sets a description of what the payment grants access to.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the MIME type of the protected resource.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Pins the resource URL instead of deriving it per request.
    #[must_use]
    pub fn with_resource(mut self, resource: Url) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Sets `maxTimeoutSeconds`.
    #[must_use]
    pub const fn with_max_timeout_seconds(mut self, seconds: u64) -> Self {
        self.max_timeout_seconds = seconds;
        self
    }

    /// The requirement advertised for `resource`.
    #[must_use]
    pub fn requirement(&self, resource: String) -> PaymentRequirements {
        PaymentRequirements {
            scheme: self.scheme.clone(),
            network: self.network.clone(),
            max_amount_required: self.amount,
            resource,
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
            output_schema: None,
            pay_to: self.pay_to,
            max_timeout_seconds: self.max_timeout_seconds,
            asset: self.asset,
            extra: self.asset_meta.clone(),
        }
    }

    /// Resolves the resource URL for a request.
    ///
    /// A pinned [`resource`](Self::resource) wins. Otherwise the request's
    /// path and query are joined onto `base_url`, or onto `http://{Host}`
    /// when no base URL is configured.
    pub fn resource_url<B>(&self, base_url: Option<&Url>, req: &Request<B>) -> String {
        if let Some(resource) = &self.resource {
            return resource.to_string();
        }
        let uri = req.uri();
        if let Some(base) = base_url {
            let mut url = base.clone();
            url.set_path(uri.path());
            url.set_query(uri.query());
            return url.to_string();
        }
        let host = req
            .headers()
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost");
        let path = uri.path_and_query().map_or("/", |pq| pq.as_str());
        format!("http://{host}{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use tollway::networks::NetworkRegistry;

    const PAY_TO: Address = address!("542C09793380BD873734d63Dc9f18aab6920C21B");

    fn request(uri: &str, host: Option<&str>) -> Request<()> {
        let mut builder = Request::get(uri);
        if let Some(host) = host {
            builder = builder.header(HOST, host);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_usdc_price_carries_domain() {
        let registry = NetworkRegistry::default();
        let tag = PriceTag::usdc(registry.get("base-sepolia").unwrap(), 10_000, PAY_TO).unwrap();
        let req = tag.requirement("http://localhost:5001/protected".into());
        assert_eq!(req.scheme, "exact");
        assert_eq!(req.max_amount_required.to_string(), "10000");
        assert_eq!(req.asset, address!("036CbD53842c5426634e7929541eC2318f3dCF7e"));
        assert_eq!(req.extra, Some(AssetMeta::new("USDC", "2")));
        assert_eq!(req.max_timeout_seconds, 60);
        assert_eq!(req.mime_type, "application/json");
    }

    #[test]
    fn test_resource_url_resolution() {
        let tag = PriceTag::new(1u64, Address::ZERO, PAY_TO, "base");
        let base: Url = "https://api.example.com/".parse().unwrap();

        let req = request("/premium?x=1", Some("ignored:8080"));
        assert_eq!(tag.resource_url(Some(&base), &req), "https://api.example.com/premium?x=1");
        assert_eq!(tag.resource_url(None, &req), "http://ignored:8080/premium?x=1");
        assert_eq!(
            tag.resource_url(None, &request("/free", None)),
            "http://localhost/free"
        );

        let pinned = tag.with_resource("https://cdn.example.com/a".parse().unwrap());
        assert_eq!(pinned.resource_url(Some(&base), &req), "https://cdn.example.com/a");
    }
}
