//! JSON summary of a run.

use chrono::NaiveDate;
use lotledger_booking::{Gains, LotBook};
use lotledger_core::{Amount, BookingMethod, Precision};
use serde::Serialize;

/// Gain realized by one transaction.
#[derive(Debug, Clone, Serialize)]
pub struct Realized {
    /// Transaction date.
    pub date: NaiveDate,
    /// The payee line.
    pub payee: String,
    /// Short term gain, positive for a gain.
    pub short_term: String,
    /// Long term gain, positive for a gain.
    pub long_term: String,
}

/// What is left in one lot pool.
#[derive(Debug, Clone, Serialize)]
pub struct Holding {
    /// The asset held.
    pub asset: String,
    /// Pool qualifier, empty when pools are per asset.
    pub pool: String,
    /// Lots with remaining inventory.
    pub lots: usize,
    /// Remaining inventory.
    pub units: String,
    /// Basis of the remaining inventory.
    pub basis: String,
}

/// The document written by `--summary`.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Base currency.
    pub base: String,
    /// Booking method.
    pub method: BookingMethod,
    /// Pool depth; absent when pools use the full account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prune: Option<usize>,
    /// Transactions booked.
    pub transactions: usize,
    /// Transactions that realized a gain or loss.
    pub realized: Vec<Realized>,
    /// Sum of short term gains.
    pub short_term_total: String,
    /// Sum of long term gains.
    pub long_term_total: String,
    /// Remaining lot pools.
    pub holdings: Vec<Holding>,
}

/// Collects realized gains while a journal is processed.
#[derive(Debug, Clone, Default)]
pub struct SummaryBuilder {
    transactions: usize,
    realized: Vec<(NaiveDate, String, Gains)>,
}

impl SummaryBuilder {
    /// Start an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one booked transaction.
    pub fn record(&mut self, date: NaiveDate, payee: &str, gains: Option<&Gains>) {
        self.transactions += 1;
        if let Some(gains) = gains.filter(|g| !g.total.is_zero()) {
            self.realized.push((date, payee.trim().to_string(), gains.clone()));
        }
    }

    /// Build the document from what was recorded and what the book still holds.
    pub fn finish(self, book: &LotBook) -> Summary {
        let config = book.config();
        let precision = book.precision();
        let render = |amount: &Amount| amount.display(precision).to_string();

        let mut short_total = Amount::zero(config.base.clone());
        let mut long_total = Amount::zero(config.base.clone());
        let realized = self
            .realized
            .into_iter()
            .map(|(date, payee, gains)| {
                short_total += &gains.short_term;
                long_total += &gains.long_term;
                Realized {
                    date,
                    payee,
                    short_term: render(&gains.short_term),
                    long_term: render(&gains.long_term),
                }
            })
            .collect();

        Summary {
            base: config.base.to_string(),
            method: config.method,
            prune: config.prune,
            transactions: self.transactions,
            realized,
            short_term_total: render(&short_total),
            long_term_total: render(&long_total),
            holdings: holdings(book, precision),
        }
    }
}

fn holdings(book: &LotBook, precision: &Precision) -> Vec<Holding> {
    let base = &book.config().base;
    book.holdings()
        .map(|(asset, pool, queue)| {
            let basis = queue
                .iter()
                .fold(Amount::zero(base.clone()), |acc, lot| acc + lot.remaining_basis());
            Holding {
                asset: asset.to_string(),
                pool: pool.to_string(),
                lots: queue.len(),
                units: Amount::new(queue.units(), asset.clone()).display(precision).to_string(),
                basis: basis.display(precision).to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotledger_booking::BookingConfig;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    #[test]
    fn test_summary_document() {
        let mut book = LotBook::new(BookingConfig::new("USD")).unwrap();
        let mut summary = SummaryBuilder::new();

        let buy = book
            .book(date(1, 2), &["    Assets:Broker  10 X @ 10 USD", "    Assets:Cash"])
            .unwrap();
        summary.record(date(1, 2), "2024/01/02 Buy ", buy.gains.as_ref());
        let sell = book
            .book(date(2, 1), &["    Assets:Broker  -4 X @ 12.5 USD", "    Assets:Cash"])
            .unwrap();
        summary.record(date(2, 1), "2024/02/01 Sell", sell.gains.as_ref());

        let doc = summary.finish(&book);
        assert_eq!(doc.transactions, 2);
        assert_eq!(doc.realized.len(), 1);
        assert_eq!(doc.realized[0].payee, "2024/02/01 Sell");
        assert_eq!(doc.short_term_total, "10 USD");
        assert_eq!(doc.long_term_total, "0 USD");
        assert_eq!(doc.holdings[0].units, "6 X");
        assert_eq!(doc.holdings[0].basis, "60 USD");

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["method"], "fifo");
        assert_eq!(json["prune"], 0);
        assert_eq!(json["realized"][0]["date"], "2024-02-01");
        assert_eq!(json["holdings"][0]["lots"], 1);
    }
}
