//! Ordered lot pools with FIFO or LIFO consumption.
//!
//! A [`LotQueue`] holds every open lot of one asset in one pool. Lots are
//! kept ordered by acquisition date, then creation weight; the booking
//! method decides which end a sale consumes from:
//!
//! - **FIFO**: the earliest lot first (smallest date, then smallest weight)
//! - **LIFO**: the latest lot first (largest date, then largest weight)
//!
//! A sale walks lots from that end until the requested amount is covered,
//! consuming a lot partially when it holds more than is still needed.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use num_rational::BigRational;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Amount, Asset, Lot, LotError};

/// Which lot a sale consumes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingMethod {
    /// First In, First Out. Oldest lots are reduced first.
    #[default]
    Fifo,
    /// Last In, First Out. Newest lots are reduced first.
    Lifo,
}

impl FromStr for BookingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fifo" => Ok(Self::Fifo),
            "lifo" => Ok(Self::Lifo),
            _ => Err(format!("unknown booking method: {s}")),
        }
    }
}

impl fmt::Display for BookingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fifo => write!(f, "fifo"),
            Self::Lifo => write!(f, "lifo"),
        }
    }
}

/// Error from buying into or selling out of a [`LotQueue`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The pool ran out of lots before the sale was covered.
    #[error("failed to sell {requested} ({unfilled} unfilled), no remaining inventory")]
    InsufficientInventory {
        /// Amount asked for, as a positive quantity.
        requested: Amount,
        /// Amount no lot could cover, as a positive quantity.
        unfilled: Amount,
    },

    /// The lot or amount is a different asset than the pool holds.
    #[error("asset mismatch: pool holds {expected}, got {found}")]
    AssetMismatch {
        /// Asset held by the pool.
        expected: Asset,
        /// Asset offered.
        found: Asset,
    },

    /// Selling zero is meaningless.
    #[error("attempt to sell zero {asset}")]
    ZeroAmount {
        /// The asset.
        asset: Asset,
    },

    /// `sell` takes a negative amount.
    #[error("expected a negative amount to sell, got {delta}")]
    NotADisposal {
        /// The rejected amount.
        delta: Amount,
    },

    /// A lot refused the operation.
    #[error(transparent)]
    Lot(#[from] LotError),

    /// The sale loop overshot its target.
    #[error("lot sale overshot: {0}")]
    Overshoot(String),
}

impl QueueError {
    /// True for consistency failures that well-formed input never causes.
    pub fn is_internal(&self) -> bool {
        !matches!(self, Self::InsufficientInventory { .. })
    }
}

/// One lot's share of a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposal {
    /// The lot after the sale.
    pub lot: Lot,
    /// Inventory consumed, positive.
    pub inventory: Amount,
    /// Basis consumed, zero or negative.
    pub basis: Amount,
}

/// Date, weight, then insertion sequence.
type LotKey = (NaiveDate, u64, u64);

/// Open lots of one asset in one pool.
#[derive(Debug, Clone, Default)]
pub struct LotQueue {
    lots: BTreeMap<LotKey, Lot>,
    method: BookingMethod,
    sequence: u64,
}

impl LotQueue {
    /// Create an empty pool.
    pub fn new(method: BookingMethod) -> Self {
        Self {
            lots: BTreeMap::new(),
            method,
            sequence: 0,
        }
    }

    /// The consumption policy.
    pub fn method(&self) -> BookingMethod {
        self.method
    }

    /// Number of open lots.
    pub fn len(&self) -> usize {
        self.lots.len()
    }

    /// True when no lot is open.
    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// The pool's asset, once it holds a lot.
    pub fn asset(&self) -> Option<&Asset> {
        self.lots.values().next().map(Lot::asset)
    }

    /// Open lots, oldest first regardless of policy.
    pub fn iter(&self) -> impl Iterator<Item = &Lot> {
        self.lots.values()
    }

    /// Total inventory still held.
    pub fn units(&self) -> BigRational {
        self.lots
            .values()
            .fold(BigRational::zero(), |acc, lot| acc + &lot.inventory().number)
    }

    /// Add a lot to the pool.
    pub fn buy(&mut self, lot: Lot) -> Result<(), QueueError> {
        self.check_asset(lot.asset())?;
        self.sequence += 1;
        self.lots.insert((lot.date(), lot.weight(), self.sequence), lot);
        Ok(())
    }

    /// Consume `|delta|` of inventory, lot by lot in policy order.
    ///
    /// On [`QueueError::InsufficientInventory`] the lots consumed before the
    /// shortfall stay consumed.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use lotledger_core::{BookingMethod, Lot, LotQueue};
    ///
    /// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
    /// let mut queue = LotQueue::new(BookingMethod::Fifo);
    /// queue.buy(Lot::new("a", day(1), 1, "1 BTC".parse().unwrap(), "100 USD".parse().unwrap()).unwrap()).unwrap();
    /// queue.buy(Lot::new("b", day(2), 2, "1 BTC".parse().unwrap(), "200 USD".parse().unwrap()).unwrap()).unwrap();
    ///
    /// let sold = queue.sell(&"-1.5 BTC".parse().unwrap()).unwrap();
    /// assert_eq!(sold.len(), 2);
    /// assert_eq!(sold[0].lot.name(), "a");
    /// assert_eq!(sold[1].basis.to_string(), "-100 USD");
    /// assert_eq!(queue.len(), 1);
    /// ```
    pub fn sell(&mut self, delta: &Amount) -> Result<Vec<Disposal>, QueueError> {
        if delta.is_zero() {
            return Err(QueueError::ZeroAmount {
                asset: delta.asset.clone(),
            });
        }
        if delta.is_positive() {
            return Err(QueueError::NotADisposal {
                delta: delta.clone(),
            });
        }
        self.check_asset(&delta.asset)?;

        tracing::trace!("selling {} from {} queue of {} lots", delta, self.method, self.len());

        let mut remaining = delta.clone();
        let mut disposals = Vec::new();
        while !remaining.is_zero() {
            let Some((key, mut lot)) = self.pop() else {
                return Err(QueueError::InsufficientInventory {
                    requested: delta.abs(),
                    unfilled: remaining.abs(),
                });
            };

            let (inventory, basis) = lot.sell(&remaining)?;
            tracing::trace!("sold {} ({} basis) from lot {}", inventory, basis, lot.name());

            remaining += &inventory;
            if remaining.is_positive() {
                return Err(QueueError::Overshoot(format!(
                    "sold {inventory} from {} leaving {remaining}",
                    lot.name()
                )));
            }

            disposals.push(Disposal {
                lot: lot.clone(),
                inventory,
                basis,
            });
            if !lot.is_empty() {
                self.lots.insert(key, lot);
            }
        }

        tracing::trace!("sold {}, {} lots remain", delta, self.len());
        Ok(disposals)
    }

    fn pop(&mut self) -> Option<(LotKey, Lot)> {
        match self.method {
            BookingMethod::Fifo => self.lots.pop_first(),
            BookingMethod::Lifo => self.lots.pop_last(),
        }
    }

    fn check_asset(&self, asset: &Asset) -> Result<(), QueueError> {
        match self.asset() {
            Some(held) if held != asset => Err(QueueError::AssetMismatch {
                expected: held.clone(),
                found: asset.clone(),
            }),
            _ => Ok(()),
        }
    }
}
