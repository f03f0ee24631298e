//! Writing booked transactions back as journal text.
//!
//! The original lines are kept, with prices commented out because the lot
//! postings now carry that information. Lot and gain postings are appended
//! as virtual postings (`[account]`) so the journal still balances.

use std::borrow::Cow;

use lotledger_booking::{Booking, LotEvent};
use lotledger_core::{Amount, Precision};

use crate::scan::Line;

/// Formatting configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    /// Column where amounts start.
    pub amount_column: usize,
    /// Spaces before each posting.
    pub indent: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            amount_column: 60,
            indent: 4,
        }
    }
}

impl FormatConfig {
    /// Create a format config with the given column and indent.
    pub const fn new(amount_column: usize, indent: usize) -> Self {
        Self {
            amount_column,
            indent,
        }
    }
}

/// Comment out the first `@` of a posting unless it is already in a comment.
///
/// ```
/// use lotledger::render::comment_out_price;
///
/// assert_eq!(comment_out_price("    A  1 BTC @ 5 USD"), "    A  1 BTC ; @ 5 USD");
/// assert_eq!(comment_out_price("    A  1 BTC ; @ 5 USD"), "    A  1 BTC ; @ 5 USD");
/// ```
pub fn comment_out_price(line: &str) -> Cow<'_, str> {
    match (line.find('@'), line.find(';')) {
        (Some(at), comment) if comment.map_or(true, |c| c > at) => {
            Cow::Owned(format!("{}; {}", &line[..at], &line[at..]))
        }
        _ => Cow::Borrowed(line),
    }
}

/// Renders booked transactions.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: FormatConfig,
}

impl Renderer {
    /// Create a renderer.
    pub const fn new(config: FormatConfig) -> Self {
        Self { config }
    }

    /// Lines of a block written as they are, plus the separating blank line.
    pub fn passthrough<S: AsRef<str>>(&self, lines: &[S]) -> String {
        let mut out = self.original(lines);
        out.push('\n');
        out
    }

    /// Lines of a block, unchanged.
    pub fn original<S: AsRef<str>>(&self, lines: &[S]) -> String {
        let mut out = String::new();
        for line in lines {
            out.push_str(line.as_ref());
            out.push('\n');
        }
        out
    }

    /// A line that flags a problem inside a transaction.
    ///
    /// The line is not valid journal syntax: ledger rejects the output
    /// until the problem is fixed.
    pub fn fixme(&self, command: &str, message: &str) -> String {
        format!("{}FIXME:lotledger {command}:  {message}\n", " ".repeat(self.config.indent))
    }

    /// A booked transaction: original lines, lot postings, gain postings.
    ///
    /// `payee_index` separates the header lines, written as they are, from
    /// the postings, whose prices are commented out.
    pub fn transaction(
        &self,
        lines: &[Line<'_>],
        payee_index: usize,
        booking: &Booking,
        precision: &Precision,
    ) -> String {
        let mut out = String::new();
        for (index, line) in lines.iter().enumerate() {
            if index > payee_index {
                out.push_str(&comment_out_price(line.text));
            } else {
                out.push_str(line.text);
            }
            out.push('\n');
        }

        for event in &booking.events {
            self.event(&mut out, event, precision);
        }

        if let Some(gains) = &booking.gains {
            for posting in gains.postings() {
                self.posting(
                    &mut out,
                    false,
                    posting.account,
                    &posting.amount,
                    posting.tag,
                    precision,
                );
            }
        }

        out.push('\n');
        out
    }

    fn event(&self, out: &mut String, event: &LotEvent, precision: &Precision) {
        let annotation = event.annotation(precision);

        let detail = if event.is_disposal() {
            "inventory consumed"
        } else {
            "inventory"
        };
        self.posting(
            out,
            false,
            &event.lot_name,
            &event.inventory,
            &format!("{annotation} ({detail})"),
            precision,
        );

        let detail = if event.basis.is_zero() {
            "basis unchanged"
        } else if event.basis.is_positive() {
            "basis"
        } else {
            "basis consumed"
        };
        // zero basis lines are written commented out
        self.posting(
            out,
            event.basis.is_zero(),
            &event.lot_name,
            &event.basis,
            &format!("{annotation} ({detail})"),
            precision,
        );
    }

    fn posting(
        &self,
        out: &mut String,
        commented: bool,
        account: &str,
        amount: &Amount,
        comment: &str,
        precision: &Precision,
    ) {
        let mut line = " ".repeat(self.config.indent);
        if commented {
            line.push(';');
        }
        line.push('[');
        line.push_str(account);
        line.push(']');

        let pad = self.config.amount_column.saturating_sub(line.chars().count()).max(2);
        line.push_str(&" ".repeat(pad));
        line.push_str(&amount.display(precision).to_string());
        line.push_str(" ; ");
        line.push_str(comment);

        out.push_str(&line);
        out.push('\n');
    }
}
