//! Split production: parse a transaction's postings and group them.
//!
//! Postings are grouped by the asset of their tally (the cost for priced
//! postings, the quantity otherwise) and then by lot pool qualifier. One
//! posting may omit its amount; it is inferred so the transaction balances.

use std::collections::BTreeMap;

use num_rational::BigRational;
use num_traits::Zero;
use lotledger_core::{Amount, Asset, ParseError, Precision, Split, SplitError};

use crate::config::BookingConfig;
use crate::error::BookingError;

/// Postings grouped by tally asset, then qualifier.
pub type SplitGroups = BTreeMap<Asset, BTreeMap<String, Vec<Split>>>;

/// The parsed postings of one transaction.
#[derive(Debug, Clone, Default)]
pub struct TxSplits {
    /// Postings by tally asset, then qualifier, in input order.
    pub groups: SplitGroups,
    /// True when any posting carries `@` or `@@`.
    pub is_trade: bool,
    /// True when every posting had an explicit amount.
    pub balanced: bool,
}

impl TxSplits {
    /// Every posting, in group order.
    pub fn splits(&self) -> impl Iterator<Item = (&str, &Split)> {
        self.groups
            .values()
            .flat_map(|quals| quals.iter())
            .flat_map(|(qual, splits)| splits.iter().map(move |s| (qual.as_str(), s)))
    }

    /// Quantities of every posting in the base currency.
    pub fn base_deltas(&self, base: &Asset) -> Vec<Amount> {
        self.splits()
            .filter_map(|(_, split)| split.delta())
            .filter(|delta| &delta.asset == base)
            .cloned()
            .collect()
    }
}

/// Parse posting lines and group them, inferring a missing amount.
pub fn produce_splits<S: AsRef<str>>(
    lines: &[S],
    config: &BookingConfig,
    precision: &mut Precision,
) -> Result<TxSplits, BookingError> {
    let mut tx = TxSplits::default();
    let mut tally: BTreeMap<Asset, BigRational> = BTreeMap::new();
    let mut null_amounts: Vec<Split> = Vec::new();

    for line in lines {
        let line = line.as_ref();
        let Some(split) = Split::parse(line, precision)? else {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }
            return Err(ParseError::NotAPosting {
                line: line.to_string(),
            }
            .into());
        };

        if split.is_null_amount() {
            null_amounts.push(split);
            continue;
        }

        tx.is_trade |= split.is_priced();
        let amount = split.tally().ok_or_else(|| SplitError::NullAmount {
            line: split.line().to_string(),
        })?;
        *tally.entry(amount.asset.clone()).or_insert_with(BigRational::zero) += &amount.number;
        push(&mut tx.groups, config, amount.asset, split);
    }

    tx.balanced = null_amounts.is_empty();
    if null_amounts.len() > 1 {
        return Err(BookingError::MultipleNullAmounts {
            lines: null_amounts.into_iter().map(|s| s.line().to_string()).collect(),
        });
    }

    if let Some(mut split) = null_amounts.pop() {
        let unbalanced: Vec<(Asset, BigRational)> =
            tally.into_iter().filter(|(_, sum)| !sum.is_zero()).collect();
        match unbalanced.as_slice() {
            [] => {
                tracing::debug!("dropping posting without amount from balanced transaction: {:?}", split.line());
            }
            [(asset, sum)] => {
                let inferred = Amount::new(-sum, asset.clone());
                tracing::debug!("calculated amount ({}) for posting {:?}", inferred, split.line());
                split.set_inferred_delta(inferred);
                push(&mut tx.groups, config, asset.clone(), split);
            }
            _ => {
                return Err(BookingError::AmbiguousNullAmount {
                    line: split.line().to_string(),
                    assets: unbalanced.into_iter().map(|(asset, _)| asset).collect(),
                });
            }
        }
    }

    Ok(tx)
}

fn push(groups: &mut SplitGroups, config: &BookingConfig, asset: Asset, split: Split) {
    groups
        .entry(asset)
        .or_default()
        .entry(config.qualifier(split.account()))
        .or_default()
        .push(split);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn produce(lines: &[&str]) -> Result<TxSplits, BookingError> {
        let config = BookingConfig::new("USD").with_prune(None);
        produce_splits(lines, &config, &mut Precision::new())
    }

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    #[test]
    fn test_groups_by_tally_asset() {
        let tx = produce(&[
            "    Assets:Broker  10 AAPL @ 150 USD",
            "    Assets:Cash  -1500 USD",
        ])
        .unwrap();

        assert!(tx.is_trade);
        assert!(tx.balanced);
        // the priced posting tallies in USD
        assert_eq!(tx.groups.len(), 1);
        let usd = &tx.groups["USD"];
        assert_eq!(usd["Assets:Broker"].len(), 1);
        assert_eq!(usd["Assets:Cash"].len(), 1);
        assert_eq!(tx.base_deltas(&Asset::new("USD")), [amount("-1500 USD")]);
    }

    #[test]
    fn test_infers_null_amount() {
        let tx = produce(&[
            "    Expenses:Food  30 USD",
            "    Expenses:Drink  20 USD",
            "    ; paid in cash",
            "    Assets:Cash",
        ])
        .unwrap();

        assert!(!tx.is_trade);
        assert!(!tx.balanced);
        let cash = &tx.groups["USD"]["Assets:Cash"][0];
        assert!(cash.is_inferred());
        assert_eq!(cash.delta(), Some(&amount("-50 USD")));
    }

    #[test]
    fn test_infers_null_amount_for_trade() {
        let tx = produce(&[
            "    Assets:Broker  -4 AAPL @@ 600 USD",
            "    Assets:Cash",
        ])
        .unwrap();
        let cash = &tx.groups["USD"]["Assets:Cash"][0];
        assert_eq!(cash.delta(), Some(&amount("600 USD")));
    }

    #[test]
    fn test_null_amount_in_balanced_transaction_is_dropped() {
        let tx = produce(&[
            "    Assets:A  1 BTC",
            "    Assets:B  -1 BTC",
            "    Expenses:Fee",
        ])
        .unwrap();
        assert_eq!(tx.splits().count(), 2);
    }

    #[test]
    fn test_multiple_null_amounts() {
        let err = produce(&["    Assets:A  1 BTC", "    Assets:B", "    Assets:C"]).unwrap_err();
        assert!(matches!(err, BookingError::MultipleNullAmounts { ref lines } if lines.len() == 2));
    }

    #[test]
    fn test_ambiguous_null_amount() {
        let err = produce(&["    Assets:A  1 BTC", "    Assets:B  2 ETH", "    Assets:C"]).unwrap_err();
        match err {
            BookingError::AmbiguousNullAmount { assets, .. } => {
                assert_eq!(assets, [Asset::new("BTC"), Asset::new("ETH")]);
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_rejects_stray_line() {
        let err = produce(&["    Assets:A  1 BTC", "2024/01/01 another payee"]).unwrap_err();
        assert!(matches!(err, BookingError::Parse(ParseError::NotAPosting { .. })));
    }

    #[test]
    fn test_qualifier_applied() {
        let config = BookingConfig::new("USD").with_prune(Some(2));
        let tx = produce_splits(
            &["    Assets:Crypto:hot  -1 BTC", "    Assets:Crypto:cold  1 BTC"],
            &config,
            &mut Precision::new(),
        )
        .unwrap();
        assert_eq!(tx.groups["BTC"]["Assets:Crypto"].len(), 2);
    }
}
