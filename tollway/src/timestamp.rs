//! Unix timestamps for authorization validity windows.
//!
//! `validAfter` and `validBefore` in a `TransferWithAuthorization` are
//! carried as stringified integers, so [`UnixTimestamp`] serializes as
//! `"1699999999"` rather than a JSON number.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::SystemTime;

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnixTimestamp(u64);

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(serde::de::Error::custom(
                "timestamp must be a non-negative integer",
            ));
        }
        if s.len() > 1 && s.starts_with('0') {
            return Err(serde::de::Error::custom(
                "timestamp must not have leading zeros",
            ));
        }
        let ts = s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom("timestamp overflows u64"))?;
        Ok(Self(ts))
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl UnixTimestamp {
    /// The epoch itself, used as the fixed `validAfter`.
    pub const EPOCH: Self = Self(0);

    /// Creates a timestamp from raw seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time.
    ///
    /// A clock set before the epoch reads as the epoch.
    #[must_use]
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self(now)
    }

    /// Returns the raw seconds.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_string_serde() {
        let ts = UnixTimestamp::from_secs(1_750_316_065);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"1750316065\"");
        let back: UnixTimestamp = serde_json::from_str("\"1750316065\"").unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn test_timestamp_rejects_numbers_and_negatives() {
        assert!(serde_json::from_str::<UnixTimestamp>("1750316065").is_err());
        assert!(serde_json::from_str::<UnixTimestamp>("\"-1\"").is_err());
    }

    #[test]
    fn test_timestamp_rejects_non_canonical_text() {
        for text in ["\"+0\"", "\"0060\"", "\"0001740672154\"", "\"\"", "\" 60\""] {
            assert!(
                serde_json::from_str::<UnixTimestamp>(text).is_err(),
                "{text} should be rejected"
            );
        }
        let zero: UnixTimestamp = serde_json::from_str("\"0\"").unwrap();
        assert_eq!(zero, UnixTimestamp::EPOCH);
    }

    #[test]
    fn test_timestamp_add() {
        assert_eq!(UnixTimestamp::from_secs(100) + 60, UnixTimestamp::from_secs(160));
        assert_eq!(UnixTimestamp::EPOCH.to_string(), "0");
    }
}
