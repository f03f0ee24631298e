//! Trades: priced postings that dispose of or acquire lots.
//!
//! A negative priced posting sells from its pool. A positive priced posting
//! opens a new lot. When the new lot is paid for in another asset rather
//! than the base currency (a barter), that asset is sold first and the basis
//! it releases becomes the new lot's basis.

use chrono::NaiveDate;
use lotledger_core::{Amount, Asset, Lot, Precision, Split};

use crate::error::BookingError;
use crate::event::{EventKind, LotEvent};
use crate::ledger::{lot_name, short_name, Ledger};
use crate::transaction::TxSplits;

/// Book a transaction with prices.
pub fn consume_trades(
    tx: &TxSplits,
    date: NaiveDate,
    ledger: &mut Ledger,
    base: &Asset,
    precision: &Precision,
) -> Result<Vec<LotEvent>, BookingError> {
    let mut events = Vec::new();

    for (qual, split) in tx.splits() {
        let Some(delta) = split.delta() else {
            continue;
        };

        if delta.asset == *base {
            if split.is_priced() {
                return Err(BookingError::PricedBaseLeg {
                    line: split.line().to_string(),
                });
            }
            continue;
        }

        if delta.is_zero() {
            if split.is_priced() {
                tracing::warn!("ignoring zero quantity trade: {:?}", split.line());
            }
            continue;
        }

        if delta.is_negative() {
            // the sell side may omit its price when the buy side carries it
            if !split.is_priced() {
                continue;
            }
            if split.cost()?.asset != *base {
                return Err(BookingError::NonBaseSale {
                    line: split.line().to_string(),
                });
            }
            let disposals = ledger.sell(qual, delta).map_err(|source| BookingError::Consume {
                line: split.line().to_string(),
                source,
            })?;
            events.extend(
                disposals
                    .into_iter()
                    .map(|d| LotEvent::disposed(d, EventKind::Sell)),
            );
        } else {
            buy(split, delta, qual, date, ledger, base, precision, &mut events)?;
        }
    }

    Ok(events)
}

#[allow(clippy::too_many_arguments)]
fn buy(
    split: &Split,
    delta: &Amount,
    qual: &str,
    date: NaiveDate,
    ledger: &mut Ledger,
    base: &Asset,
    precision: &Precision,
    events: &mut Vec<LotEvent>,
) -> Result<(), BookingError> {
    if !split.is_priced() {
        return Err(BookingError::UnpricedAcquisition {
            line: split.line().to_string(),
        });
    }

    let cost = split.cost()?;
    if cost.is_negative() {
        return Err(BookingError::NegativeCost {
            line: split.line().to_string(),
        });
    }
    let mut short = short_name(delta, &split.price()?, precision);
    let mut lot_date = date;
    let mut basis = cost.clone();
    let mut kind = EventKind::Buy;

    if cost.asset != *base {
        let disposals = ledger.sell(qual, &-&cost).map_err(|source| BookingError::Consume {
            line: split.line().to_string(),
            source,
        })?;

        // rounded, so the stored basis equals what the journal shows
        basis = Amount::zero(base.clone());
        if let Some(latest) = disposals.iter().map(|d| d.lot.date()).max() {
            lot_date = latest;
        }
        for disposal in disposals {
            basis -= &disposal.basis.rounded(precision);
            events.push(LotEvent::disposed(disposal, EventKind::SellDeferred));
        }

        short = format!("{short}@{}", basis.compact(precision));
        kind = EventKind::BuyDeferred;
    }

    let weight = ledger.next_weight();
    let name = lot_name(qual, lot_date, &short, weight);
    tracing::debug!("creating lot {} of {} with basis {}", name, delta, basis);
    let lot = Lot::new(name.clone(), lot_date, weight, delta.clone(), basis.clone())?;
    ledger.buy(qual, lot)?;

    events.push(LotEvent {
        lot_name: name,
        lot_date,
        inventory: -delta,
        basis,
        kind,
    });
    Ok(())
}
