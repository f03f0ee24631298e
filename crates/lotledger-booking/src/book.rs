//! The run context: configuration, lot pools and learned precision.

use chrono::NaiveDate;
use lotledger_core::{Asset, LotQueue, Precision};

use crate::config::BookingConfig;
use crate::error::{BookingError, ConfigError};
use crate::event::LotEvent;
use crate::gains::{apportion, Gains};
use crate::ledger::Ledger;
use crate::moves::consume_moves;
use crate::trades::consume_trades;
use crate::transaction::produce_splits;

/// How a transaction was booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    /// At least one posting carries a price or cost.
    Trade,
    /// An unpriced transfer between pools.
    Move,
}

/// The outcome of booking one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    /// Trade or move.
    pub kind: TxKind,
    /// Lot events in the order they happened.
    pub events: Vec<LotEvent>,
    /// Realized gain, for trades that disposed of inventory.
    pub gains: Option<Gains>,
}

impl Booking {
    /// True when nothing was booked.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.gains.is_none()
    }
}

/// Books transactions in journal order against a single set of lot pools.
///
/// ```
/// use chrono::NaiveDate;
/// use lotledger_booking::{BookingConfig, LotBook};
///
/// let mut book = LotBook::new(BookingConfig::new("USD")).unwrap();
/// let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// let booking = book
///     .book(date, &["    Assets:Broker  10 AAPL @ 150 USD", "    Assets:Cash"])
///     .unwrap();
/// assert_eq!(booking.events[0].lot_name, "Lot::2024-01-02:10AAPL@150USD:1");
/// ```
#[derive(Debug)]
pub struct LotBook {
    config: BookingConfig,
    ledger: Ledger,
    precision: Precision,
}

impl LotBook {
    /// Create an empty book.
    pub fn new(config: BookingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ledger: Ledger::new(config.method),
            precision: Precision::new(),
            config,
        })
    }

    /// The configuration this book runs with.
    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    /// Display precision learned from the input so far.
    pub fn precision(&self) -> &Precision {
        &self.precision
    }

    /// Book the posting lines of one transaction dated `date`.
    ///
    /// Lines that are neither postings nor comments are rejected. On error
    /// the pools keep whatever was consumed before the failure.
    pub fn book<S: AsRef<str>>(&mut self, date: NaiveDate, lines: &[S]) -> Result<Booking, BookingError> {
        let tx = produce_splits(lines, &self.config, &mut self.precision)?;
        let base = &self.config.base;

        let booking = if tx.is_trade {
            let events = consume_trades(&tx, date, &mut self.ledger, base, &self.precision)?;
            let gains = apportion(&events, &tx.base_deltas(base), date, base, &self.precision)?;
            Booking {
                kind: TxKind::Trade,
                events,
                gains,
            }
        } else {
            Booking {
                kind: TxKind::Move,
                events: consume_moves(&tx, &mut self.ledger, base, &self.precision)?,
                gains: None,
            }
        };

        tracing::debug!(
            "booked {:?} on {} with {} lot events",
            booking.kind,
            date,
            booking.events.len()
        );
        Ok(booking)
    }

    /// Every non-empty lot pool as `(asset, qualifier, queue)`.
    pub fn holdings(&self) -> impl Iterator<Item = (&Asset, &str, &LotQueue)> {
        self.ledger.pools()
    }
}
