//! Startup errors of the demo server.

use tollway_http::server::FacilitatorClientError;

use crate::config::ConfigError;

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The configured network has no known USDC deployment to price in.
    #[error("network {0:?} has no known USDC deployment")]
    UnsupportedNetwork(String),
    /// The facilitator URL is invalid.
    #[error(transparent)]
    Facilitator(#[from] FacilitatorClientError),
    /// Binding or serving failed.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
