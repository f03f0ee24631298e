//! A lot is one acquisition batch of an asset.
//!
//! The lot remembers what it started with (inventory and cost basis) and
//! how much is left. Its unit price is fixed at creation, so every partial
//! sale consumes basis at the same rate.

use chrono::NaiveDate;
use num_rational::BigRational;
use num_traits::Signed;
use thiserror::Error;

use crate::{Amount, Asset};

/// A lot was constructed or sold in a way that breaks its invariants.
///
/// These are internal consistency failures: the booking engine never asks
/// a lot to do any of this for well-formed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LotError {
    /// A lot must start with positive inventory.
    #[error("lot {name:?} must have positive inventory ({inventory})")]
    NonPositiveInventory {
        /// Lot name.
        name: String,
        /// The rejected inventory.
        inventory: Amount,
    },

    /// A lot's cost basis cannot be negative.
    #[error("lot {name:?} must have non-negative basis ({basis})")]
    NegativeBasis {
        /// Lot name.
        name: String,
        /// The rejected basis.
        basis: Amount,
    },

    /// `sell` takes a negative amount.
    #[error("lot {name:?} expects a negative amount to sell, got {delta}")]
    NotADisposal {
        /// Lot name.
        name: String,
        /// The rejected amount.
        delta: Amount,
    },

    /// The amount to sell is a different asset than the lot holds.
    #[error("lot {name:?} holds {expected}, cannot sell {found}")]
    AssetMismatch {
        /// Lot name.
        name: String,
        /// Asset held by the lot.
        expected: Asset,
        /// Asset of the amount to sell.
        found: Asset,
    },
}

/// One acquisition batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    name: String,
    date: NaiveDate,
    weight: u64,
    inventory: Amount,
    start_inventory: Amount,
    start_basis: Amount,
    price: BigRational,
}

impl Lot {
    /// Create a lot holding `inventory` acquired for a total of `basis`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use lotledger_core::Lot;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    /// let lot = Lot::new("Lot:2024-03-01:2BTC@5USD:1", date, 1,
    ///     "2 BTC".parse().unwrap(), "10 USD".parse().unwrap()).unwrap();
    /// assert_eq!(lot.price().to_string(), "5 USD");
    /// ```
    pub fn new(
        name: impl Into<String>,
        date: NaiveDate,
        weight: u64,
        inventory: Amount,
        basis: Amount,
    ) -> Result<Self, LotError> {
        let name = name.into();
        if !inventory.is_positive() {
            return Err(LotError::NonPositiveInventory { name, inventory });
        }
        if basis.is_negative() {
            return Err(LotError::NegativeBasis { name, basis });
        }

        let price = &basis.number / &inventory.number;
        Ok(Self {
            name,
            date,
            weight,
            start_inventory: inventory.clone(),
            inventory,
            start_basis: basis,
            price,
        })
    }

    /// Lot name as rendered in the journal.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquisition date used for ordering and holding period.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Creation-order tie-break among lots sharing a date.
    pub fn weight(&self) -> u64 {
        self.weight
    }

    /// Inventory still held.
    pub fn inventory(&self) -> &Amount {
        &self.inventory
    }

    /// Inventory at creation.
    pub fn start_inventory(&self) -> &Amount {
        &self.start_inventory
    }

    /// Cost basis at creation.
    pub fn start_basis(&self) -> &Amount {
        &self.start_basis
    }

    /// The held asset.
    pub fn asset(&self) -> &Asset {
        &self.inventory.asset
    }

    /// Unit price, denominated in the basis asset.
    pub fn price(&self) -> Amount {
        Amount::new(self.price.clone(), self.start_basis.asset.clone())
    }

    /// Basis attributable to the remaining inventory.
    pub fn remaining_basis(&self) -> Amount {
        Amount::new(&self.price * &self.inventory.number, self.start_basis.asset.clone())
    }

    /// True once all inventory is consumed.
    pub fn is_empty(&self) -> bool {
        self.inventory.is_zero()
    }

    /// Consume up to `|delta|` of this lot.
    ///
    /// Returns `(actual, basis)`: the inventory actually consumed (never
    /// more than the lot holds, always positive) and the basis it carried,
    /// negated. A zero-basis lot yields a zero basis.
    pub fn sell(&mut self, delta: &Amount) -> Result<(Amount, Amount), LotError> {
        if !delta.is_negative() {
            return Err(LotError::NotADisposal {
                name: self.name.clone(),
                delta: delta.clone(),
            });
        }
        if !delta.compatible(&self.inventory) {
            return Err(LotError::AssetMismatch {
                name: self.name.clone(),
                expected: self.inventory.asset.clone(),
                found: delta.asset.clone(),
            });
        }

        let remaining_after = &self.inventory.number + &delta.number;
        let actual = if remaining_after.is_negative() {
            let all = self.inventory.clone();
            self.inventory = self.inventory.zero_clone();
            all
        } else {
            self.inventory.number = remaining_after;
            delta.abs()
        };

        let basis = Amount::new(-(&self.price * &actual.number), self.start_basis.asset.clone());
        Ok((actual, basis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn lot(inventory: &str, basis: &str) -> Lot {
        Lot::new("Lot:test", date(2024, 1, 1), 1, amount(inventory), amount(basis)).unwrap()
    }

    #[test]
    fn test_new_rejects_non_positive_inventory() {
        let err = Lot::new("x", date(2024, 1, 1), 1, amount("0 BTC"), amount("1 USD")).unwrap_err();
        assert!(matches!(err, LotError::NonPositiveInventory { .. }));
        let err = Lot::new("x", date(2024, 1, 1), 1, amount("-1 BTC"), amount("1 USD")).unwrap_err();
        assert!(matches!(err, LotError::NonPositiveInventory { .. }));
    }

    #[test]
    fn test_new_rejects_negative_basis() {
        let err = Lot::new("x", date(2024, 1, 1), 1, amount("1 BTC"), amount("-1 USD")).unwrap_err();
        assert!(matches!(err, LotError::NegativeBasis { .. }));
    }

    #[test]
    fn test_zero_basis_allowed() {
        let mut lot = lot("3 BCH", "0 USD");
        let (actual, basis) = lot.sell(&amount("-1 BCH")).unwrap();
        assert_eq!(actual, amount("1 BCH"));
        assert!(basis.is_zero());
    }

    #[test]
    fn test_partial_sale() {
        let mut lot = lot("10 BTC", "1000 USD");
        let (actual, basis) = lot.sell(&amount("-4 BTC")).unwrap();
        assert_eq!(actual, amount("4 BTC"));
        assert_eq!(basis, amount("-400 USD"));
        assert_eq!(lot.inventory(), &amount("6 BTC"));
        assert_eq!(lot.start_inventory(), &amount("10 BTC"));
        assert_eq!(lot.remaining_basis(), amount("600 USD"));
    }

    #[test]
    fn test_exact_sale_empties_lot() {
        let mut lot = lot("10 BTC", "1000 USD");
        let (actual, basis) = lot.sell(&amount("-10 BTC")).unwrap();
        assert_eq!(actual, amount("10 BTC"));
        assert_eq!(basis, amount("-1000 USD"));
        assert!(lot.is_empty());
    }

    #[test]
    fn test_oversized_sale_consumes_remaining() {
        let mut lot = lot("10 BTC", "1000 USD");
        lot.sell(&amount("-4 BTC")).unwrap();
        let (actual, basis) = lot.sell(&amount("-25 BTC")).unwrap();
        assert_eq!(actual, amount("6 BTC"));
        assert_eq!(basis, amount("-600 USD"));
        assert!(lot.is_empty());
    }

    #[test]
    fn test_price_fixed_across_sales() {
        let mut lot = lot("3 ETH", "100 USD");
        let (_, first) = lot.sell(&amount("-1 ETH")).unwrap();
        let (_, second) = lot.sell(&amount("-2 ETH")).unwrap();
        assert_eq!(-(first + second), amount("100 USD"));
        assert_eq!(lot.price(), amount("100/3 USD"));
    }

    #[test]
    fn test_sell_rejects_non_negative() {
        let mut lot = lot("1 BTC", "1 USD");
        assert!(matches!(
            lot.sell(&amount("1 BTC")),
            Err(LotError::NotADisposal { .. })
        ));
        assert!(matches!(
            lot.sell(&amount("0 BTC")),
            Err(LotError::NotADisposal { .. })
        ));
        assert_eq!(lot.inventory(), &amount("1 BTC"));
    }

    #[test]
    fn test_sell_rejects_other_asset() {
        let mut lot = lot("1 BTC", "1 USD");
        assert!(matches!(
            lot.sell(&amount("-1 ETH")),
            Err(LotError::AssetMismatch { .. })
        ));
    }
}
