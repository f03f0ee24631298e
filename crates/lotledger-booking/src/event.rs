//! Lot events: one per lot touched by a transaction.

use chrono::NaiveDate;
use lotledger_core::{Amount, Disposal, Precision};

/// What happened to the lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Inventory sold for the base currency.
    Sell,
    /// Inventory sold to fund another asset's basis.
    SellDeferred,
    /// A lot bought with the base currency.
    Buy,
    /// A lot whose basis came from selling another asset.
    BuyDeferred,
    /// Inventory leaving a pool in a move.
    MoveOut {
        /// The pool's net outflow.
        moved: Amount,
        /// Qualifier of the source pool.
        from: String,
        /// Position of this lot among the lots consumed, from 1.
        index: usize,
        /// Number of lots consumed.
        count: usize,
    },
    /// Inventory arriving in a pool in a move.
    MoveIn {
        /// Inventory of the new lot.
        moved: Amount,
        /// Qualifier of the destination pool.
        to: String,
    },
}

/// A change to one lot's inventory and basis.
///
/// Signs follow double entry against the lot account: consumed inventory is
/// positive with a negative basis, acquired inventory is negative with a
/// positive basis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotEvent {
    /// Name of the lot account.
    pub lot_name: String,
    /// The lot's acquisition date.
    pub lot_date: NaiveDate,
    /// Inventory change.
    pub inventory: Amount,
    /// Basis change.
    pub basis: Amount,
    /// What happened.
    pub kind: EventKind,
}

impl LotEvent {
    /// Record a disposal.
    pub fn disposed(disposal: Disposal, kind: EventKind) -> Self {
        Self {
            lot_name: disposal.lot.name().to_string(),
            lot_date: disposal.lot.date(),
            inventory: disposal.inventory,
            basis: disposal.basis,
            kind,
        }
    }

    /// True when the event consumes inventory.
    pub fn is_disposal(&self) -> bool {
        self.inventory.is_positive()
    }

    /// The tag written after the posting, e.g. `:SELL:`.
    pub fn annotation(&self, precision: &Precision) -> String {
        match &self.kind {
            EventKind::Sell => ":SELL:".to_string(),
            EventKind::SellDeferred => ":SELL:DEFER:".to_string(),
            EventKind::Buy => ":BUY:".to_string(),
            EventKind::BuyDeferred => ":BUY:DEFER:".to_string(),
            EventKind::MoveOut {
                moved,
                from,
                index,
                count,
            } => format!(
                ":MOVE: move {} from {from} ({index} of {count})",
                moved.display(precision)
            ),
            EventKind::MoveIn { moved, to } => {
                format!(":MOVE: move {} to {to}", moved.display(precision))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind) -> LotEvent {
        LotEvent {
            lot_name: "Lot:x".to_string(),
            lot_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            inventory: "1 BTC".parse().unwrap(),
            basis: "-10 USD".parse().unwrap(),
            kind,
        }
    }

    #[test]
    fn test_annotations() {
        let precision = Precision::new();
        assert_eq!(event(EventKind::Sell).annotation(&precision), ":SELL:");
        assert_eq!(event(EventKind::BuyDeferred).annotation(&precision), ":BUY:DEFER:");

        let out = event(EventKind::MoveOut {
            moved: "-100 ABC".parse().unwrap(),
            from: "Assets:Crypto:on-chain".to_string(),
            index: 1,
            count: 2,
        });
        assert_eq!(
            out.annotation(&precision),
            ":MOVE: move -100 ABC from Assets:Crypto:on-chain (1 of 2)"
        );

        let into = event(EventKind::MoveIn {
            moved: "79.9 ABC".parse().unwrap(),
            to: "Assets:Crypto:exchange".to_string(),
        });
        assert_eq!(into.annotation(&precision), ":MOVE: move 79.9 ABC to Assets:Crypto:exchange");
    }

    #[test]
    fn test_is_disposal() {
        assert!(event(EventKind::Sell).is_disposal());
        let mut buy = event(EventKind::Buy);
        buy.inventory = "-1 BTC".parse().unwrap();
        assert!(!buy.is_disposal());
    }
}
