//! Realized gains and their split into short and long term.
//!
//! The total gain of a trade is the sum of its base currency quantities and
//! of the basis of every lot it touched, each rounded to display precision
//! so the gain postings balance against the rendered journal. That total is
//! then split by how much of the disposed inventory was held long term.

use chrono::{Datelike, NaiveDate};
use num_rational::BigRational;
use num_traits::Zero;
use lotledger_core::{Amount, Asset, Precision};

use crate::error::BookingError;
use crate::event::LotEvent;

/// Account receiving short term gains.
pub const SHORT_TERM_ACCOUNT: &str = "Lot:Income:short term gain";
/// Account receiving long term gains.
pub const LONG_TERM_ACCOUNT: &str = "Lot:Income:long term gain";

/// Calendar time between two dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Elapsed {
    /// Whole years.
    pub years: u32,
    /// Whole months beyond the years.
    pub months: u32,
    /// Days beyond the months.
    pub days: u32,
}

impl Elapsed {
    /// Time from `from` to `to`; zero when `to` is not after `from`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use lotledger_booking::Elapsed;
    ///
    /// let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
    /// let e = Elapsed::between(d(2020, 3, 15), d(2021, 3, 14));
    /// assert_eq!((e.years, e.months, e.days), (0, 11, 30));
    /// ```
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        if to <= from {
            return Self::default();
        }

        let mut years = to.year() - from.year();
        let mut months = to.month() as i32 - from.month() as i32;
        let mut days = to.day() as i32 - from.day() as i32;

        if days < 0 {
            months -= 1;
            days += days_in_month(from) as i32;
        }
        if months < 0 {
            years -= 1;
            months += 12;
        }

        Self {
            years: years as u32,
            months: months as u32,
            days: days as u32,
        }
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

/// Holding period of a disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    /// Held less than a full year.
    Short,
    /// Held at least one full year.
    Long,
}

impl Term {
    /// Classify a lot acquired on `acquired` and disposed of on `disposed`.
    pub fn of(acquired: NaiveDate, disposed: NaiveDate) -> Self {
        if Elapsed::between(acquired, disposed).years > 0 {
            Self::Long
        } else {
            Self::Short
        }
    }
}

/// Realized gain of one transaction.
///
/// Gains are positive and losses negative. Journal postings carry the
/// opposite sign, see [`Gains::postings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gains {
    /// Gain on inventory held less than a year.
    pub short_term: Amount,
    /// Gain on inventory held a year or more.
    pub long_term: Amount,
    /// Short plus long.
    pub total: Amount,
    /// Inventory disposed short term.
    pub short_inventory: Amount,
    /// Inventory disposed long term.
    pub long_inventory: Amount,
}

/// A synthetic income posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GainPosting {
    /// The income account.
    pub account: &'static str,
    /// The posting amount (negated gain).
    pub amount: Amount,
    /// Tag written after the posting.
    pub tag: &'static str,
}

impl Gains {
    /// Income postings for every nonzero bucket.
    pub fn postings(&self) -> Vec<GainPosting> {
        let mut postings = Vec::new();
        if !self.short_term.is_zero() {
            postings.push(GainPosting {
                account: SHORT_TERM_ACCOUNT,
                amount: -&self.short_term,
                tag: ":GAIN:SHORTTERM:",
            });
        }
        if !self.long_term.is_zero() {
            postings.push(GainPosting {
                account: LONG_TERM_ACCOUNT,
                amount: -&self.long_term,
                tag: ":GAIN:LONGTERM:",
            });
        }
        postings
    }
}

/// Split a trade's realized gain by holding period.
///
/// Returns `None` when no event disposes of inventory.
pub fn apportion(
    events: &[LotEvent],
    base_deltas: &[Amount],
    date: NaiveDate,
    base: &Asset,
    precision: &Precision,
) -> Result<Option<Gains>, BookingError> {
    let mut total = base_deltas
        .iter()
        .fold(BigRational::zero(), |acc, delta| acc + delta.round(precision.places(base)));

    let mut inventory: Option<(Amount, Amount)> = None;
    for event in events {
        total += event.basis.rounded(precision).number;

        if !event.is_disposal() {
            continue;
        }
        let (short, long) = inventory.get_or_insert_with(|| {
            (event.inventory.zero_clone(), event.inventory.zero_clone())
        });
        if !short.compatible(&event.inventory) {
            return Err(BookingError::MixedDisposal {
                first: short.asset.clone(),
                second: event.inventory.asset.clone(),
            });
        }
        match Term::of(event.lot_date, date) {
            Term::Short => *short += &event.inventory,
            Term::Long => *long += &event.inventory,
        }
    }

    let Some((short_inventory, long_inventory)) = inventory else {
        return Ok(None);
    };

    let disposed = &short_inventory.number + &long_inventory.number;
    let short_term = &total * (&short_inventory.number / disposed);
    let long_term = &total - &short_term;
    tracing::debug!(
        "gain {} {} ({} short term, {} long term)",
        total,
        base,
        short_term,
        long_term
    );

    Ok(Some(Gains {
        short_term: Amount::new(short_term, base.clone()),
        long_term: Amount::new(long_term, base.clone()),
        total: Amount::new(total, base.clone()),
        short_inventory,
        long_inventory,
    }))
}
