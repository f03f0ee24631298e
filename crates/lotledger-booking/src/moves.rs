//! Moves: unpriced transfers between lot pools.
//!
//! A move consumes lots from the pools that lose inventory and recreates
//! them in the pools that gain it. The recreated lots keep the source
//! lot's date, weight and unit price, so moving an asset between wallets
//! never changes its holding period or basis.
//!
//! Two passes per asset: first every net outflow is sold from its live pool
//! into a staging queue, then every net inflow is sold out of staging into
//! new lots of the destination pool. Both the staged and the destination lot
//! advance the ledger's weight counter.

use num_rational::BigRational;
use num_traits::{Signed, Zero};
use lotledger_core::{Amount, Asset, Lot, LotQueue, Precision};

use crate::error::BookingError;
use crate::event::{EventKind, LotEvent};
use crate::ledger::{lot_name, short_name, Ledger};
use crate::transaction::TxSplits;

/// Book a transaction without prices.
pub fn consume_moves(
    tx: &TxSplits,
    ledger: &mut Ledger,
    base: &Asset,
    precision: &Precision,
) -> Result<Vec<LotEvent>, BookingError> {
    let mut events = Vec::new();

    for (asset, quals) in &tx.groups {
        if asset == base {
            continue;
        }

        let nets: Vec<(&str, BigRational)> = quals
            .iter()
            .map(|(qual, splits)| {
                let net = splits
                    .iter()
                    .filter(|s| !s.is_priced())
                    .filter_map(|s| s.delta())
                    .fold(BigRational::zero(), |acc, d| acc + &d.number);
                (qual.as_str(), net)
            })
            .collect();

        let mut staging = LotQueue::new(ledger.method());

        for (qual, net) in nets.iter().filter(|(_, net)| net.is_negative()) {
            let moved = Amount::new(net.clone(), asset.clone());
            let disposals = ledger.sell(qual, &moved)?;
            let count = disposals.len();
            tracing::debug!("move {} from {:?} consumes {} lots", moved, qual, count);

            for (index, disposal) in disposals.into_iter().enumerate() {
                let lot = &disposal.lot;
                ledger.skip_weight();
                staging.buy(Lot::new(
                    lot.name(),
                    lot.date(),
                    lot.weight(),
                    disposal.inventory.clone(),
                    -&disposal.basis,
                )?)?;
                events.push(LotEvent::disposed(
                    disposal,
                    EventKind::MoveOut {
                        moved: moved.clone(),
                        from: (*qual).to_string(),
                        index: index + 1,
                        count,
                    },
                ));
            }
        }

        for (qual, net) in nets.iter().filter(|(_, net)| net.is_positive()) {
            let arriving = Amount::new(-net, asset.clone());
            for disposal in staging.sell(&arriving)? {
                let source = &disposal.lot;
                let short = short_name(&disposal.inventory, &source.price(), precision);
                let name = lot_name(qual, source.date(), &short, source.weight());
                let basis = -&disposal.basis;
                let lot = Lot::new(
                    name.clone(),
                    source.date(),
                    source.weight(),
                    disposal.inventory.clone(),
                    basis.clone(),
                )?;
                ledger.skip_weight();
                tracing::debug!("move creates lot {}", name);
                ledger.buy(qual, lot)?;

                events.push(LotEvent {
                    lot_name: name,
                    lot_date: source.date(),
                    inventory: -&disposal.inventory,
                    basis,
                    kind: EventKind::MoveIn {
                        moved: disposal.inventory.clone(),
                        to: (*qual).to_string(),
                    },
                });
            }
        }
    }

    Ok(events)
}
