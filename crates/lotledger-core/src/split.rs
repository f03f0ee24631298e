//! Transaction legs ("splits") parsed from posting lines.
//!
//! A posting line looks like:
//!
//! ```text
//!     Assets:Exchange:Kraken      1.5 BTC @ 9000 USD   ; bought the dip
//! ```
//!
//! The account is separated from the amount by two or more spaces or by
//! tabs; single spaces belong to the account name. The amount region may
//! carry a unit price (`@`) or a total cost (`@@`).

use std::fmt;
use std::sync::OnceLock;

use num_traits::Signed;
use regex::Regex;
use thiserror::Error;

use crate::amount::{Amount, Precision};
use crate::error::ParseError;

/// A split cannot answer the question asked of it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// Neither a price nor a cost was given.
    #[error("cannot determine price of split: {line:?}")]
    NoPrice {
        /// The posting line.
        line: String,
    },

    /// Neither a cost nor a price was given.
    #[error("cannot determine cost of split: {line:?}")]
    NoCost {
        /// The posting line.
        line: String,
    },

    /// The split's amount is still unresolved.
    #[error("split has no amount: {line:?}")]
    NullAmount {
        /// The posting line.
        line: String,
    },

    /// A unit price cannot be derived from a zero quantity.
    #[error("cannot derive unit price from zero quantity: {line:?}")]
    ZeroQuantity {
        /// The posting line.
        line: String,
    },
}

fn account_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"\s{2,}|\t+").expect("account separator pattern is valid"))
}

/// One parsed transaction leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    account: String,
    delta: Option<Amount>,
    price: Option<Amount>,
    cost: Option<Amount>,
    comment: Option<String>,
    line: String,
    inferred: bool,
}

impl Split {
    /// Parse one raw journal line.
    ///
    /// Returns `Ok(None)` when the line is not a posting: it is unindented,
    /// blank, or only a comment.
    ///
    /// ```
    /// use lotledger_core::{Precision, Split};
    ///
    /// let mut precision = Precision::new();
    /// let split = Split::parse("    Assets:Cash Box  -5 USD", &mut precision)
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(split.account(), "Assets:Cash Box");
    /// assert_eq!(split.delta().unwrap().to_string(), "-5 USD");
    ///
    /// assert!(Split::parse("2024/01/02 Payee", &mut precision).unwrap().is_none());
    /// ```
    pub fn parse(line: &str, precision: &mut Precision) -> Result<Option<Self>, ParseError> {
        let (body, comment) = match line.split_once(';') {
            Some((body, comment)) => (body, Some(comment.to_string())),
            None => (line, None),
        };

        let trimmed = body.trim();
        if trimmed.is_empty() || !body.starts_with(char::is_whitespace) {
            return Ok(None);
        }

        let mut parts = account_separator().splitn(trimmed, 2);
        let account = parts.next().unwrap_or_default().trim().to_string();
        let amount_region = parts.next().map(str::trim).filter(|s| !s.is_empty());

        let wrap = |source: ParseError| ParseError::InvalidPosting {
            line: line.to_string(),
            source: Box::new(source),
        };

        let mut split = Self {
            account,
            delta: None,
            price: None,
            cost: None,
            comment,
            line: line.to_string(),
            inferred: false,
        };

        if let Some(region) = amount_region {
            let delta_text = if let Some((delta, cost)) = region.split_once("@@") {
                split.cost = Some(Amount::parse(cost, precision).map_err(wrap)?);
                delta
            } else if let Some((delta, price)) = region.split_once('@') {
                split.price = Some(Amount::parse(price, precision).map_err(wrap)?);
                delta
            } else {
                region
            };
            split.delta = Some(Amount::parse(delta_text, precision).map_err(wrap)?);
        }

        Ok(Some(split))
    }

    /// The account path, e.g. `Assets:Exchange:Kraken`.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The signed quantity, `None` while the amount is unresolved.
    pub fn delta(&self) -> Option<&Amount> {
        self.delta.as_ref()
    }

    /// The raw source line.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Text after the first `;`, if any.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// True when the posting had no amount and it has not been inferred yet.
    pub fn is_null_amount(&self) -> bool {
        self.delta.is_none()
    }

    /// True when the amount was inferred from the transaction's balance.
    pub fn is_inferred(&self) -> bool {
        self.inferred
    }

    /// True when the posting carries `@` or `@@`.
    pub fn is_priced(&self) -> bool {
        self.price.is_some() || self.cost.is_some()
    }

    /// Resolve a null-amount split.
    pub fn set_inferred_delta(&mut self, delta: Amount) {
        self.delta = Some(delta);
        self.inferred = true;
    }

    /// Unit price, derived as `cost / |delta|` when only a cost was given.
    pub fn price(&self) -> Result<Amount, SplitError> {
        if let Some(price) = &self.price {
            return Ok(price.clone());
        }
        let Some(cost) = &self.cost else {
            return Err(SplitError::NoPrice {
                line: self.line.clone(),
            });
        };
        let delta = self.require_delta()?;
        if delta.is_zero() {
            return Err(SplitError::ZeroQuantity {
                line: self.line.clone(),
            });
        }
        Ok(Amount::new(&cost.number / delta.number.abs(), cost.asset.clone()))
    }

    /// Total cost, derived as `price × |delta|` when only a price was given.
    pub fn cost(&self) -> Result<Amount, SplitError> {
        if let Some(cost) = &self.cost {
            return Ok(cost.clone());
        }
        let Some(price) = &self.price else {
            return Err(SplitError::NoCost {
                line: self.line.clone(),
            });
        };
        let delta = self.require_delta()?;
        Ok(Amount::new(&price.number * delta.number.abs(), price.asset.clone()))
    }

    /// The balance change this split implies.
    ///
    /// For a priced split this is the cost, carrying the sign of the delta;
    /// otherwise it is the delta itself. `None` while the amount is
    /// unresolved.
    pub fn tally(&self) -> Option<Amount> {
        let delta = self.delta.as_ref()?;
        if !self.is_priced() {
            return Some(delta.clone());
        }
        let cost = self.cost().ok()?;
        let flip = !delta.is_zero() && cost.number.signum() != delta.number.signum();
        Some(if flip { -cost } else { cost })
    }

    /// The delta negated: what the split adds to or removes from a lot pool.
    pub fn inventory(&self) -> Option<Amount> {
        self.delta.as_ref().map(|d| -d)
    }

    fn require_delta(&self) -> Result<&Amount, SplitError> {
        self.delta.as_ref().ok_or_else(|| SplitError::NullAmount {
            line: self.line.clone(),
        })
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.account)?;
        if let Some(delta) = &self.delta {
            write!(f, "  {delta}")?;
        }
        if let Some(cost) = &self.cost {
            write!(f, " @@ {cost}")?;
        } else if let Some(price) = &self.price {
            write!(f, " @ {price}")?;
        }
        Ok(())
    }
}
