//! Run configuration for the booking engine.

use lotledger_core::{Asset, BookingMethod};

use crate::error::ConfigError;

/// How lots are booked for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfig {
    /// The currency cost basis and gains are denominated in.
    pub base: Asset,
    /// Which lot a sale consumes first.
    pub method: BookingMethod,
    /// Account segments that key a lot pool; `None` keys by the full account.
    pub prune: Option<usize>,
}

impl BookingConfig {
    /// FIFO booking with one pool per asset.
    pub fn new(base: impl Into<Asset>) -> Self {
        Self {
            base: base.into(),
            method: BookingMethod::Fifo,
            prune: Some(0),
        }
    }

    /// Set the booking method.
    pub fn with_method(mut self, method: BookingMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the pool depth; `None` keys pools by the full account path.
    pub fn with_prune(mut self, prune: Option<usize>) -> Self {
        self.prune = prune;
        self
    }

    /// Parse the booking method from its name.
    pub fn with_method_name(self, name: &str) -> Result<Self, ConfigError> {
        let method = name.parse().map_err(ConfigError::UnknownMethod)?;
        Ok(self.with_method(method))
    }

    /// Check the configuration before any input is read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base.trim().is_empty() {
            return Err(ConfigError::MissingBase);
        }
        Ok(())
    }

    /// The pool key for an account.
    ///
    /// With `prune = Some(2)`, `Assets:Crypto:hot` and `Assets:Crypto:cold`
    /// share the pool `Assets:Crypto`; with `Some(3)` they are separate.
    /// `Some(0)` puts every account in the same pool.
    ///
    /// ```
    /// use lotledger_booking::BookingConfig;
    ///
    /// let config = BookingConfig::new("USD").with_prune(Some(2));
    /// assert_eq!(config.qualifier("Assets:Crypto:hot"), "Assets:Crypto");
    /// assert_eq!(config.qualifier("Assets:Cash"), "Assets:Cash");
    /// ```
    pub fn qualifier(&self, account: &str) -> String {
        match self.prune {
            Some(depth) => {
                let segments: Vec<&str> = account.split(':').collect();
                if segments.len() > depth {
                    segments[..depth].join(":")
                } else {
                    account.to_string()
                }
            }
            None => account.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_base() {
        assert_eq!(BookingConfig::new("").validate(), Err(ConfigError::MissingBase));
        assert_eq!(BookingConfig::new("  ").validate(), Err(ConfigError::MissingBase));
        assert!(BookingConfig::new("USD").validate().is_ok());
    }

    #[test]
    fn test_method_name() {
        let config = BookingConfig::new("USD").with_method_name("LIFO").unwrap();
        assert_eq!(config.method, BookingMethod::Lifo);

        let err = BookingConfig::new("USD").with_method_name("hifo").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMethod(_)));
    }

    #[test]
    fn test_qualifier_depths() {
        let account = "Assets:Crypto:hot";
        let at = |prune| BookingConfig::new("USD").with_prune(prune).qualifier(account);
        assert_eq!(at(Some(0)), "");
        assert_eq!(at(Some(1)), "Assets");
        assert_eq!(at(Some(2)), "Assets:Crypto");
        assert_eq!(at(Some(3)), account);
        assert_eq!(at(Some(9)), account);
        assert_eq!(at(None), account);
    }
}
