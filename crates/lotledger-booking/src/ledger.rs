//! Lot pools for a whole run, keyed by asset and qualifier.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use lotledger_core::{Amount, Asset, BookingMethod, Disposal, Lot, LotQueue, Precision, QueueError};

/// Every lot pool of a run.
///
/// Pools are created lazily on the first buy. The ledger also hands out
/// creation weights, which order lots acquired on the same day.
#[derive(Debug, Clone)]
pub struct Ledger {
    pools: BTreeMap<Asset, BTreeMap<String, LotQueue>>,
    method: BookingMethod,
    weight: u64,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new(method: BookingMethod) -> Self {
        Self {
            pools: BTreeMap::new(),
            method,
            weight: 0,
        }
    }

    /// The booking method every pool uses.
    pub fn method(&self) -> BookingMethod {
        self.method
    }

    /// Take the next creation weight.
    pub fn next_weight(&mut self) -> u64 {
        self.weight += 1;
        self.weight
    }

    /// Count a lot that reuses an existing weight instead of taking a new one.
    ///
    /// Move lots keep their source lot's weight, but the counter still
    /// advances for them so later lot names number every lot ever created.
    pub fn skip_weight(&mut self) {
        self.weight += 1;
    }

    /// Add a lot to the pool `qualifier` of its asset.
    pub fn buy(&mut self, qualifier: &str, lot: Lot) -> Result<(), QueueError> {
        let asset = lot.asset().clone();
        let method = self.method;
        self.pools
            .entry(asset)
            .or_default()
            .entry(qualifier.to_string())
            .or_insert_with(|| LotQueue::new(method))
            .buy(lot)
    }

    /// Consume `|delta|` from the pool `qualifier`.
    pub fn sell(&mut self, qualifier: &str, delta: &Amount) -> Result<Vec<Disposal>, QueueError> {
        match self
            .pools
            .get_mut(&delta.asset)
            .and_then(|pools| pools.get_mut(qualifier))
        {
            Some(queue) => queue.sell(delta),
            // no pool yet: report the shortfall the same way an empty pool would
            None => LotQueue::new(self.method).sell(delta),
        }
    }

    /// The pool for an asset and qualifier, if one was ever opened.
    pub fn queue(&self, asset: &str, qualifier: &str) -> Option<&LotQueue> {
        self.pools.get(asset).and_then(|pools| pools.get(qualifier))
    }

    /// Non-empty pools ordered by asset, then qualifier.
    pub fn pools(&self) -> impl Iterator<Item = (&Asset, &str, &LotQueue)> {
        self.pools.iter().flat_map(|(asset, pools)| {
            pools
                .iter()
                .filter(|(_, queue)| !queue.is_empty())
                .map(move |(qualifier, queue)| (asset, qualifier.as_str(), queue))
        })
    }
}

/// The quantity and price part of a lot name, e.g. `100BTC@123.45USD`.
pub fn short_name(inventory: &Amount, price: &Amount, precision: &Precision) -> String {
    format!("{}@{}", inventory.compact(precision), price.compact(precision))
}

/// A full lot name: `Lot:<qualifier>:<YYYY-MM-DD>:<short name>:<weight>`.
pub fn lot_name(qualifier: &str, date: NaiveDate, short: &str, weight: u64) -> String {
    format!("Lot:{qualifier}:{}:{short}:{weight}", date.format("%Y-%m-%d"))
}
