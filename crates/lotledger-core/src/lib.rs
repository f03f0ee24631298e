//! Core types for lotledger
//!
//! This crate provides the leaf types the lot booking engine is built from:
//!
//! - [`Asset`] - A currency or commodity code
//! - [`Amount`] - An exact rational number with an asset
//! - [`Precision`] - Display precision learned per asset
//! - [`Split`] - One parsed posting line of a transaction
//! - [`Lot`] - One acquisition batch with a fixed unit price
//! - [`LotQueue`] - Open lots of one asset, consumed FIFO or LIFO
//!
//! # Example
//!
//! ```
//! use lotledger_core::{Amount, BookingMethod, Lot, LotQueue, NaiveDate};
//!
//! let mut queue = LotQueue::new(BookingMethod::Fifo);
//!
//! // Buy 10 AAPL for 1500 USD
//! let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let lot = Lot::new("Lot:2024-01-15:10AAPL@150USD:1", date, 1,
//!     "10 AAPL".parse().unwrap(), "1500 USD".parse().unwrap()).unwrap();
//! queue.buy(lot).unwrap();
//!
//! // Sell 5 of them
//! let sold = queue.sell(&"-5 AAPL".parse().unwrap()).unwrap();
//!
//! assert_eq!(queue.units(), "5 AAPL".parse::<Amount>().unwrap().number);
//! assert_eq!(sold[0].basis.to_string(), "-750 USD");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod asset;
pub mod error;
pub mod lot;
pub mod queue;
pub mod split;

pub use amount::{Amount, AmountDisplay, Precision, DEFAULT_PRECISION};
pub use asset::Asset;
pub use error::ParseError;
pub use lot::{Lot, LotError};
pub use queue::{BookingMethod, Disposal, LotQueue, QueueError};
pub use split::{Split, SplitError};

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use num_rational::BigRational;
