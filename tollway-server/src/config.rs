//! Demo server configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 5001
//! pay_to = "$PAY_TO"
//! network = "base-sepolia"
//! facilitator = "remote"
//! facilitator_url = "https://x402.org/facilitator"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.toml`)
//! - `HOST` - Override server bind address
//! - `PORT` - Override server port
//! - `PAY_TO` - Override the receiving address
//! - `FACILITATOR_URL` - Override the remote facilitator URL

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use alloy_primitives::{Address, address};
use serde::{Deserialize, Serialize};
use tollway_http::constants::DEFAULT_FACILITATOR_URL;
use url::Url;

/// Demo receiving address used when none is configured.
pub const DEFAULT_PAY_TO: Address = address!("542C09793380BD873734d63Dc9f18aab6920C21B");

/// Where payments are verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacilitatorMode {
    /// POST to `facilitator_url`.
    #[default]
    Remote,
    /// Recover signatures in-process.
    Local,
}

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address (default: `127.0.0.1`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port (default: `5001`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address receiving payments.
    #[serde(default = "default_pay_to")]
    pub pay_to: Address,

    /// Network the tiers are priced on (default: `base-sepolia`).
    #[serde(default = "default_network")]
    pub network: String,

    /// Remote or in-process verification.
    #[serde(default)]
    pub facilitator: FacilitatorMode,

    /// Remote facilitator base URL.
    #[serde(default = "default_facilitator_url")]
    pub facilitator_url: String,

    /// Public URL of this server, used in advertised resource URLs.
    #[serde(default)]
    pub base_url: Option<Url>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

const fn default_port() -> u16 {
    5001
}

const fn default_pay_to() -> Address {
    DEFAULT_PAY_TO
}

fn default_network() -> String {
    "base-sepolia".to_owned()
}

fn default_facilitator_url() -> String {
    DEFAULT_FACILITATOR_URL.to_owned()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            pay_to: default_pay_to(),
            network: default_network(),
            facilitator: FacilitatorMode::default(),
            facilitator_url: default_facilitator_url(),
            base_url: None,
        }
    }
}

/// Errors loading a [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The configuration path.
        path: String,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid configuration TOML.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidOverride {
        /// The environment variable.
        var: &'static str,
        /// Its value.
        value: String,
    },
}

impl ServerConfig {
    /// Loads configuration from `path` and the process environment.
    ///
    /// A missing file yields the defaults. `HOST`, `PORT`, `PAY_TO` and
    /// `FACILITATOR_URL` override the file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an override
    /// is malformed.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let lookup = |name: &str| std::env::var(name).ok();
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };
        let mut config = Self::parse(&content, lookup)?;
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Parses TOML after expanding `$VAR` references through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on invalid TOML.
    pub fn parse(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    /// Applies `HOST`, `PORT`, `PAY_TO` and `FACILITATOR_URL` from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] for an unparsable value.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("HOST") {
            self.host = parse_override("HOST", value)?;
        }
        if let Some(value) = lookup("PORT") {
            self.port = parse_override("PORT", value)?;
        }
        if let Some(value) = lookup("PAY_TO") {
            self.pay_to = parse_override("PAY_TO", value)?;
        }
        if let Some(value) = lookup("FACILITATOR_URL") {
            self.facilitator_url = value;
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride { var, value })
}

/// Expands `$VAR` and `${VAR}` patterns through `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut var_name = String::new();
        while let Some(&c) = chars.peek() {
            if braced {
                if c == '}' {
                    chars.next();
                    break;
                }
            } else if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            var_name.push(c);
            chars.next();
        }

        match lookup(&var_name) {
            Some(val) if !var_name.is_empty() => result.push_str(&val),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if braced && !var_name.is_empty() {
                    result.push('}');
                }
            }
        }
    }

    result
}
