//! Network name registry.
//!
//! Protocol v1 identifies chains by human-readable names (`"base-sepolia"`).
//! [`NetworkRegistry`] maps those names to EIP-155 chain ids and, where
//! known, the canonical USDC deployment whose EIP-712 domain a client needs
//! when a challenge omits `extra`.

use std::collections::HashMap;

use alloy_primitives::{Address, address};

/// A token deployment usable with `transferWithAuthorization`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsdcDeployment {
    /// Token contract address.
    pub address: Address,
    /// EIP-712 domain name.
    pub name: &'static str,
    /// EIP-712 domain version.
    pub version: &'static str,
    /// Token decimals.
    pub decimals: u8,
}

/// A known network definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Human-readable network name (e.g. `"base-sepolia"`).
    pub name: &'static str,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Canonical USDC deployment, if any.
    pub usdc: Option<UsdcDeployment>,
}

const fn usdc(address: Address, name: &'static str) -> Option<UsdcDeployment> {
    Some(UsdcDeployment {
        address,
        name,
        version: "2",
        decimals: 6,
    })
}

/// Networks registered by [`NetworkRegistry::default`].
pub const KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "base",
        chain_id: 8453,
        usdc: usdc(
            address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            "USD Coin",
        ),
    },
    NetworkInfo {
        name: "base-sepolia",
        chain_id: 84532,
        usdc: usdc(address!("036CbD53842c5426634e7929541eC2318f3dCF7e"), "USDC"),
    },
    NetworkInfo {
        name: "avalanche",
        chain_id: 43114,
        usdc: usdc(
            address!("B97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"),
            "USD Coin",
        ),
    },
    NetworkInfo {
        name: "avalanche-fuji",
        chain_id: 43113,
        usdc: usdc(
            address!("5425890298aed601595a70AB815c96711a31Bc65"),
            "USD Coin",
        ),
    },
    NetworkInfo {
        name: "polygon",
        chain_id: 137,
        usdc: usdc(
            address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359"),
            "USD Coin",
        ),
    },
    NetworkInfo {
        name: "polygon-amoy",
        chain_id: 80002,
        usdc: usdc(address!("41E94Eb71Ef8C9fAE0235d1e472b21E21B5a4dbF"), "USDC"),
    },
    NetworkInfo {
        name: "ethereum",
        chain_id: 1,
        usdc: usdc(
            address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            "USD Coin",
        ),
    },
];

/// Registry mapping v1 network names to [`NetworkInfo`].
///
/// # Example
///
/// ```
/// use tollway::networks::NetworkRegistry;
///
/// let registry = NetworkRegistry::default();
/// assert_eq!(registry.chain_id("base-sepolia"), Some(84532));
/// assert!(registry.get("solana").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    by_name: HashMap<&'static str, NetworkInfo>,
}

impl NetworkRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    /// Creates a registry pre-populated from a network slice.
    #[must_use]
    pub fn from_networks(networks: &[NetworkInfo]) -> Self {
        let mut registry = Self::empty();
        registry.register(networks);
        registry
    }

    /// Registers additional networks, replacing entries with the same name.
    pub fn register(&mut self, networks: &[NetworkInfo]) {
        for info in networks {
            self.by_name.insert(info.name, *info);
        }
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with_networks(mut self, networks: &[NetworkInfo]) -> Self {
        self.register(networks);
        self
    }

    /// Looks up a network by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NetworkInfo> {
        self.by_name.get(name)
    }

    /// Looks up a chain id by network name.
    #[must_use]
    pub fn chain_id(&self, name: &str) -> Option<u64> {
        self.get(name).map(|info| info.chain_id)
    }

    /// Returns the number of registered networks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if no networks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::from_networks(KNOWN_NETWORKS)
    }
}
