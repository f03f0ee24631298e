//! Booking error types.

use lotledger_core::{Asset, LotError, ParseError, QueueError, SplitError};
use thiserror::Error;

/// The run configuration is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No base currency was given.
    #[error("a base currency is required, i.e. `--base USD`")]
    MissingBase,

    /// The booking method name is not recognized.
    #[error("{0}, expected fifo or lifo")]
    UnknownMethod(String),
}

/// A transaction could not be booked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// A posting line could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A posting was asked for a price or cost it cannot provide.
    #[error(transparent)]
    Split(#[from] SplitError),

    /// A lot pool refused a buy or sell.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A lot could not be created.
    #[error(transparent)]
    Lot(#[from] LotError),

    /// Consuming inventory for a specific posting failed.
    #[error("failed to consume inventory for {line:?}: {source}")]
    Consume {
        /// The posting whose inventory was consumed.
        line: String,
        /// The pool error.
        #[source]
        source: QueueError,
    },

    /// More than one posting has no amount.
    #[error("transaction has {} postings without an amount, at most one is supported", .lines.len())]
    MultipleNullAmounts {
        /// The postings without an amount.
        lines: Vec<String>,
    },

    /// The posting without an amount could balance more than one asset.
    #[error("cannot infer amount of {line:?}, transaction is unbalanced in {}", join(.assets))]
    AmbiguousNullAmount {
        /// The posting without an amount.
        line: String,
        /// Every unbalanced asset.
        assets: Vec<Asset>,
    },

    /// A base currency leg carries `@` or `@@`.
    #[error("trade has price on base currency leg: {line:?}")]
    PricedBaseLeg {
        /// The posting.
        line: String,
    },

    /// A sale priced in something other than the base currency.
    #[error("sell-side priced in non-base currency: {line:?}")]
    NonBaseSale {
        /// The posting.
        line: String,
    },

    /// An acquisition in a trade without `@` or `@@`.
    #[error("apparent trade has no price/cost: {line:?}")]
    UnpricedAcquisition {
        /// The posting.
        line: String,
    },

    /// An acquisition priced below zero.
    #[error("acquisition has negative price/cost: {line:?}")]
    NegativeCost {
        /// The posting.
        line: String,
    },

    /// Disposals of more than one asset in a single trade.
    #[error("trade with mixed inventory ({first} and {second})")]
    MixedDisposal {
        /// Asset of the first disposal.
        first: Asset,
        /// The other asset.
        second: Asset,
    },
}

impl BookingError {
    /// True when the error reveals an engine defect rather than bad input.
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Queue(e) | Self::Consume { source: e, .. } => e.is_internal(),
            Self::Split(_) | Self::Lot(_) => true,
            Self::Parse(_)
            | Self::MultipleNullAmounts { .. }
            | Self::AmbiguousNullAmount { .. }
            | Self::PricedBaseLeg { .. }
            | Self::NonBaseSale { .. }
            | Self::UnpricedAcquisition { .. }
            | Self::NegativeCost { .. }
            | Self::MixedDisposal { .. } => false,
        }
    }

    /// The journal line the error points at, when one is known.
    pub fn line(&self) -> Option<&str> {
        match self {
            Self::Parse(e) => e.line(),
            Self::Consume { line, .. }
            | Self::AmbiguousNullAmount { line, .. }
            | Self::PricedBaseLeg { line }
            | Self::NonBaseSale { line }
            | Self::UnpricedAcquisition { line }
            | Self::NegativeCost { line } => Some(line),
            Self::MultipleNullAmounts { lines } => lines.last().map(String::as_str),
            Self::Split(_) | Self::Queue(_) | Self::Lot(_) | Self::MixedDisposal { .. } => None,
        }
    }
}

fn join(assets: &[Asset]) -> String {
    assets
        .iter()
        .map(Asset::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
