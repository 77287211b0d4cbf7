//! Token amounts in minor units.
//!
//! Amounts travel as decimal strings (`"10000"` is 0.01 USDC with 6 decimals).
//! [`TokenAmount`] accepts only canonical decimal text, so a parsed amount
//! always serializes back to the exact string it was read from.

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An unsigned 256-bit token amount that serializes as a decimal string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(U256);

/// Why a string was not accepted as a [`TokenAmount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AmountParseError {
    /// The string was empty.
    #[error("amount is empty")]
    Empty,
    /// The string contained something other than ASCII digits.
    #[error("amount must be a non-negative integer")]
    NotAnInteger,
    /// The string had a leading zero.
    #[error("amount must not have leading zeros")]
    LeadingZero,
    /// The value does not fit in 256 bits.
    #[error("amount overflows uint256")]
    Overflow,
}

impl TokenAmount {
    /// The zero amount.
    pub const ZERO: Self = Self(U256::ZERO);

    /// Returns the inner [`U256`].
    #[must_use]
    pub const fn inner(&self) -> U256 {
        self.0
    }
}

impl FromStr for TokenAmount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountParseError::NotAnInteger);
        }
        if s.len() > 1 && s.starts_with('0') {
            return Err(AmountParseError::LeadingZero);
        }
        U256::from_str_radix(s, 10)
            .map(Self)
            .map_err(|_| AmountParseError::Overflow)
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<TokenAmount> for U256 {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical() {
        let amount: TokenAmount = "10000".parse().unwrap();
        assert_eq!(amount, TokenAmount::from(10_000));
        assert_eq!(amount.to_string(), "10000");
        assert_eq!("0".parse::<TokenAmount>().unwrap(), TokenAmount::ZERO);
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        assert_eq!("".parse::<TokenAmount>(), Err(AmountParseError::Empty));
        assert_eq!("-1".parse::<TokenAmount>(), Err(AmountParseError::NotAnInteger));
        assert_eq!("1.5".parse::<TokenAmount>(), Err(AmountParseError::NotAnInteger));
        assert_eq!("0x10".parse::<TokenAmount>(), Err(AmountParseError::NotAnInteger));
        assert_eq!("010".parse::<TokenAmount>(), Err(AmountParseError::LeadingZero));
        let too_big = "9".repeat(80);
        assert_eq!(too_big.parse::<TokenAmount>(), Err(AmountParseError::Overflow));
    }

    #[test]
    fn test_serializes_as_string() {
        let amount = TokenAmount::from(1_000_000);
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"1000000\"");
        let back: TokenAmount = serde_json::from_str("\"1000000\"").unwrap();
        assert_eq!(back, amount);
        assert!(serde_json::from_str::<TokenAmount>("1000000").is_err());
    }
}
