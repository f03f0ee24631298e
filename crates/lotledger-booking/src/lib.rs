//! Lot booking engine for ledger journals.
//!
//! This crate provides:
//! - Posting parsing with missing amount inference
//! - Lot pools keyed by asset and account qualifier
//! - Trade booking, including barters that defer basis from another asset
//! - Move booking that keeps acquisition dates across accounts
//! - Gain apportionment into short and long term
//!
//! # Booking
//!
//! A transaction with a price or cost on any posting is a trade. Otherwise
//! it is a move: inventory leaving one pool arrives in another with its
//! original lots intact.
//!
//! ```
//! use chrono::NaiveDate;
//! use lotledger_booking::{BookingConfig, LotBook};
//!
//! let mut book = LotBook::new(BookingConfig::new("USD")).unwrap();
//! let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
//!
//! book.book(day(1, 5), &["    Assets:Broker  10 AAPL @ 100 USD", "    Assets:Cash"]).unwrap();
//! let sale = book.book(day(3, 1), &["    Assets:Broker  -10 AAPL @ 110 USD", "    Assets:Cash"]).unwrap();
//!
//! let gains = sale.gains.unwrap();
//! assert_eq!(gains.short_term.to_string(), "100 USD");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod book;
mod config;
mod error;
mod event;
mod gains;
mod ledger;
mod moves;
mod trades;
mod transaction;

pub use book::{Booking, LotBook, TxKind};
pub use config::BookingConfig;
pub use error::{BookingError, ConfigError};
pub use event::{EventKind, LotEvent};
pub use gains::{apportion, Elapsed, GainPosting, Gains, Term, LONG_TERM_ACCOUNT, SHORT_TERM_ACCOUNT};
pub use ledger::{lot_name, short_name, Ledger};
pub use moves::consume_moves;
pub use trades::consume_trades;
pub use transaction::{produce_splits, SplitGroups, TxSplits};
