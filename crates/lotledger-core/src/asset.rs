//! Asset codes.
//!
//! An [`Asset`] names a currency or commodity, e.g. `USD`, `BTC` or `AAPL`.
//! Asset codes appear on every amount in a journal, so they are stored as a
//! shared `Arc<str>`: cloning is cheap and the text is immutable.
//!
//! # Example
//!
//! ```
//! use lotledger_core::Asset;
//!
//! let btc = Asset::new("BTC");
//! let again = btc.clone();
//!
//! assert_eq!(btc, "BTC");
//! assert!(btc.ptr_eq(&again));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An asset code.
#[derive(Debug, Clone, Eq)]
pub struct Asset(Arc<str>);

impl Asset {
    /// Create an asset code.
    pub fn new(code: impl Into<Arc<str>>) -> Self {
        Self(code.into())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the code is empty, which no parsed amount ever produces.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if two codes share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl PartialOrd for Asset {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Asset {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::hash::Hash for Asset {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for Asset {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Asset {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Asset {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Asset {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Asset {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&Self> for Asset {
    fn from(s: &Self) -> Self {
        s.clone()
    }
}

impl PartialEq<str> for Asset {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Asset {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_equality_ignores_allocation() {
        let a = Asset::new("ETH");
        let b = Asset::from("ETH".to_string());
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, Asset::new("ETC"));
    }

    #[test]
    fn test_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(Asset::new("BTC"), 1);
        assert_eq!(map.get("BTC"), Some(&1));
    }

    #[test]
    fn test_ordering() {
        let mut assets = vec![Asset::new("USD"), Asset::new("BTC"), Asset::new("ETH")];
        assets.sort();
        let codes: Vec<&str> = assets.iter().map(Asset::as_str).collect();
        assert_eq!(codes, ["BTC", "ETH", "USD"]);
    }
}
