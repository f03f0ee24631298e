//! Parse error types.

use thiserror::Error;

/// Malformed amount or posting syntax.
///
/// Parse errors are fatal for a run: a journal line that cannot be read
/// leaves every later lot queue in an unknown state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The amount text has no asset code after the number.
    #[error("failed to parse amount ({input:?}), expected amount and asset name")]
    MissingAsset {
        /// The offending text.
        input: String,
    },

    /// The number is not a plain decimal or fraction literal.
    #[error("failed to parse amount ({input:?}), expected a plain number such as 1.5 or 3/4")]
    InvalidNumber {
        /// The offending text.
        input: String,
    },

    /// Something follows the asset code.
    #[error("failed to parse amount ({input:?}), unexpected text after the asset name")]
    TrailingText {
        /// The offending text.
        input: String,
    },

    /// A posting line whose amount, price, or cost could not be parsed.
    #[error("failed to parse posting {line:?}: {source}")]
    InvalidPosting {
        /// The raw posting line.
        line: String,
        /// The underlying amount error.
        #[source]
        source: Box<ParseError>,
    },

    /// A line inside a transaction that is neither a posting nor a comment.
    #[error("failed to parse transaction split: {line:?}")]
    NotAPosting {
        /// The raw line.
        line: String,
    },
}

impl ParseError {
    /// The raw journal line this error refers to, when there is one.
    pub fn line(&self) -> Option<&str> {
        match self {
            Self::InvalidPosting { line, .. } | Self::NotAPosting { line } => Some(line),
            Self::MissingAsset { .. } | Self::InvalidNumber { .. } | Self::TrailingText { .. } => None,
        }
    }
}
