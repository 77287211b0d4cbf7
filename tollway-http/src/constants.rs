//! HTTP-specific constants for the x402 protocol.

use std::time::Duration;

use http::HeaderName;

/// Request header carrying the base64 payment payload (client to server).
pub const X_PAYMENT_HEADER: &str = "X-PAYMENT";

/// [`X_PAYMENT_HEADER`] as a typed header name.
pub const X_PAYMENT: HeaderName = HeaderName::from_static("x-payment");

/// HTTP 402 Payment Required status code.
pub const HTTP_STATUS_PAYMENT_REQUIRED: u16 = 402;

/// Public facilitator service URL.
pub const DEFAULT_FACILITATOR_URL: &str = "https://x402.org/facilitator";

/// Upper bound on a facilitator round trip.
pub const DEFAULT_FACILITATOR_TIMEOUT: Duration = Duration::from_secs(10);
