//! Implementation of the `lotledger-base` command.
//!
//! Trades priced in something other than the base currency (`30 ETH @@ 1 BTC`)
//! carry no basis `lotledger` can use directly. This command restates their
//! cost in the base currency using `P` price directives dated the same day,
//! keeping the original price as a comment:
//!
//! ```text
//! P 2018/01/01 BTC 10000 USD
//!
//! 2018/01/01 Swap
//!     Assets:Crypto  30 ETH @@ 10000 USD ; @@ 1 BTC
//!     Assets:Crypto  -1 BTC @@ 10000 USD
//! ```
//!
//! A trade with no usable price is written unchanged, followed by a
//! `FIXME:lotledger base:` line naming the missing price.

use crate::cmd::common::{init_logging, open_output, read_input};
use crate::cmd::completions::ShellType;
use crate::render::{FormatConfig, Renderer};
use crate::scan::{parse_date, TxScanner};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{ArgAction, Parser};
use lotledger_booking::ConfigError;
use lotledger_core::{Amount, Asset, BigRational, ParseError, Precision, Split};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Convert non-base prices and costs into the base currency.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Journal to read, `-` for stdin
    #[arg(short = 'f', long = "file", value_name = "FILE", default_value = "-")]
    pub file: PathBuf,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL", hide = true)]
    pub generate_completions: Option<ShellType>,

    /// Currency to restate costs in
    #[arg(short = 'b', long, value_name = "ASSET")]
    pub base: Option<String>,

    /// Leave transactions dated before this day unchanged (YYYY/MM/DD)
    #[arg(long, value_name = "DATE", value_parser = parse_begin)]
    pub begin: Option<NaiveDate>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Number of spaces for posting indentation
    #[arg(long, default_value = "4")]
    pub indent: usize,

    /// Log conversions to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn parse_begin(text: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(text).ok_or_else(|| format!("bad begin date ({text:?}), expected YYYY/MM/DD"))
}

/// Same-day prices of assets in the base currency.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    base: Asset,
    prices: HashMap<(NaiveDate, Asset), BigRational>,
}

impl PriceHistory {
    /// An empty history for `base`.
    pub fn new(base: impl Into<Asset>) -> Self {
        Self {
            base: base.into(),
            prices: HashMap::new(),
        }
    }

    /// The base currency.
    pub fn base(&self) -> &Asset {
        &self.base
    }

    /// Number of recorded prices.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// True when no price was recorded.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Price of one unit of `asset` in the base currency on `date`.
    pub fn price(&self, date: NaiveDate, asset: &Asset) -> Option<&BigRational> {
        self.prices.get(&(date, asset.clone()))
    }

    /// Record a `P <date> [<time>] <asset> <price> <asset>` directive.
    ///
    /// Returns `Ok(false)` for lines that are not price directives and for
    /// prices that do not involve the base currency. A price quoting the
    /// base currency first is inverted. A later price for the same day
    /// replaces an earlier one.
    pub fn observe(&mut self, line: &str) -> Result<bool> {
        if !line.starts_with("P ") {
            return Ok(false);
        }
        let code = line.split(';').next().unwrap_or_default();
        let mut fields: Vec<&str> = code.split_whitespace().collect();
        if fields.len() == 5 {
            fields.insert(2, "00:00:00");
        }
        if fields.len() < 6 {
            bail!("failed to parse historical price ({line:?}), expected `P <date> <asset> <price> <asset>`");
        }

        let (counter, invert) = if fields[5] == self.base.as_str() {
            (fields[3], false)
        } else if fields[3] == self.base.as_str() {
            (fields[5], true)
        } else {
            tracing::debug!("ignoring non-base price ({:?})", line);
            return Ok(false);
        };

        let date = parse_date(fields[1])
            .ok_or_else(|| anyhow!("failed to parse historical price ({line:?}), bad date {:?}", fields[1]))?;
        NaiveTime::parse_from_str(fields[2], "%H:%M:%S")
            .with_context(|| format!("failed to parse historical price ({line:?}), bad time {:?}", fields[2]))?;
        let quoted: Amount = format!("{} {}", fields[4], fields[5])
            .parse()
            .with_context(|| format!("failed to parse historical price ({line:?})"))?;
        let price = if invert {
            if quoted.is_zero() {
                bail!("failed to parse historical price ({line:?}), cannot invert a zero price");
            }
            quoted.number.recip()
        } else {
            quoted.number
        };

        if let Some(old) = self.prices.insert((date, Asset::new(counter)), price) {
            tracing::debug!("updating price history (was {}): {}", old, line);
        }
        Ok(true)
    }
}

/// Postings of one transaction after conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Converted {
    /// The posting lines, rewritten where a conversion applied.
    pub postings: Vec<String>,
    /// One message per cost that could not be converted.
    pub missing: Vec<String>,
}

impl Converted {
    /// True when at least one posting was rewritten.
    pub fn changed<S: AsRef<str>>(&self, original: &[S]) -> bool {
        self.postings
            .iter()
            .zip(original)
            .any(|(new, old)| new != old.as_ref())
    }
}

/// Restate the non-base costs of one transaction's postings in the base currency.
///
/// Each non-base cost is converted by the day's price of the cost asset, or
/// failing that by the day's price of the asset acquired or sold. Priced
/// postings get `@@ <basis> ; ` in front of their original price. Unpriced
/// postings whose size equals a converted cost get `@@ <basis>` appended.
pub fn convert_postings<S: AsRef<str>>(
    date: NaiveDate,
    postings: &[S],
    history: &PriceHistory,
    precision: &mut Precision,
) -> Result<Converted, ParseError> {
    let splits = postings
        .iter()
        .map(|line| Split::parse(line.as_ref(), precision))
        .collect::<Result<Vec<_>, _>>()?;
    let precision = &*precision;
    let base = history.base();

    // basis in base currency, keyed by the cost it replaces as displayed
    let mut conversions: HashMap<String, Amount> = HashMap::new();
    let mut missing = Vec::new();

    for split in splits.iter().flatten().filter(|s| s.is_priced()) {
        let Ok(cost) = split.cost() else {
            continue;
        };
        if cost.asset == *base {
            continue;
        }
        let key = cost.display(precision).to_string();

        if let Some(price) = history.price(date, &cost.asset) {
            tracing::debug!("converting {} by price of {}", key, cost.asset);
            conversions.insert(key, Amount::new(price * &cost.number, base).abs());
            continue;
        }
        let by_delta = split
            .delta()
            .and_then(|delta| history.price(date, &delta.asset).map(|price| (price, delta)));
        match by_delta {
            Some((price, delta)) => {
                tracing::debug!("converting {} by price of {}", key, delta.asset);
                conversions.insert(key, Amount::new(price * &delta.number, base).abs());
            }
            None => missing.push(format!(
                "missing price of {} or {} on {}",
                cost.asset,
                split.delta().map_or("?", |d| d.asset.as_str()),
                date.format("%Y/%m/%d")
            )),
        }
    }

    let postings = postings
        .iter()
        .zip(&splits)
        .map(|(line, split)| {
            let line = line.as_ref();
            let Some(split) = split else {
                return line.to_string();
            };
            if split.is_priced() {
                let basis = split
                    .cost()
                    .ok()
                    .and_then(|cost| conversions.get(&cost.display(precision).to_string()));
                match basis {
                    Some(basis) => line.replacen('@', &format!("@@ {} ; @", basis.display(precision)), 1),
                    None => line.to_string(),
                }
            } else {
                let basis = split
                    .delta()
                    .and_then(|delta| conversions.get(&delta.abs().display(precision).to_string()));
                match basis {
                    Some(basis) => append_cost(line, &basis.display(precision).to_string()),
                    None => line.to_string(),
                }
            }
        })
        .collect();

    Ok(Converted { postings, missing })
}

/// Insert `@@ <cost>` after the amount of a posting, before any comment.
fn append_cost(line: &str, cost: &str) -> String {
    let (code, comment) = match line.find(';') {
        Some(at) => (&line[..at], Some(&line[at..])),
        None => (line, None),
    };
    let mut out = format!("{} @@ {cost}", code.trim_end());
    if let Some(comment) = comment {
        out.push(' ');
        out.push_str(comment);
    }
    out
}

/// The result of converting one journal.
#[derive(Debug, Default)]
pub struct Processed {
    /// Blocks read, transactions or not.
    pub blocks: usize,
    /// Transactions with at least one rewritten posting.
    pub converted: usize,
    /// Costs left unconverted for lack of a price.
    pub missing: usize,
}

/// Convert every transaction of `source` in order, writing the result.
///
/// Prices are collected as the journal is read, so a `P` directive only
/// applies to transactions that follow it.
pub fn process<W: Write>(
    source: &str,
    writer: &mut W,
    history: &mut PriceHistory,
    begin: Option<NaiveDate>,
    renderer: &Renderer,
) -> Result<Processed> {
    let mut processed = Processed::default();
    let mut precision = Precision::new();

    for block in TxScanner::new(source) {
        processed.blocks += 1;
        for line in block.lines() {
            history.observe(line.text)?;
        }

        let payee = match block.payee() {
            Some(payee) if begin.map_or(true, |begin| payee.date >= begin) => payee,
            _ => {
                writer.write_all(renderer.passthrough(block.lines()).as_bytes())?;
                continue;
            }
        };

        let postings = block.postings(&payee);
        let converted = convert_postings(payee.date, postings, history, &mut precision)
            .with_context(|| format!("failed to convert transaction {:?}", payee.line.text.trim()))?;
        if converted.changed(postings) {
            processed.converted += 1;
        }

        let mut out = renderer.original(&block.lines()[..=payee.index]);
        out.push_str(&renderer.original(&converted.postings));
        for message in &converted.missing {
            tracing::warn!("{}: {}", payee.line.text.trim(), message);
            out.push_str(&renderer.fixme("base", message));
        }
        out.push('\n');
        writer.write_all(out.as_bytes())?;
        processed.missing += converted.missing.len();
    }

    writer.flush()?;
    Ok(processed)
}

fn run(args: &Args) -> Result<ExitCode> {
    let base = args
        .base
        .as_deref()
        .map(str::trim)
        .filter(|base| !base.is_empty())
        .ok_or(ConfigError::MissingBase)?;
    let mut history = PriceHistory::new(base);
    let renderer = Renderer::new(FormatConfig {
        indent: args.indent,
        ..FormatConfig::default()
    });

    let source = read_input(&args.file)?;
    let mut writer = open_output(args.output.as_deref())?;
    let processed = process(&source, &mut writer, &mut history, args.begin, &renderer)?;

    tracing::info!(
        "read {} blocks and {} prices, converted {} transactions, {} costs lack a price",
        processed.blocks,
        history.len(),
        processed.converted,
        processed.missing
    );
    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the lotledger-base command.
pub fn main() -> ExitCode {
    main_with_name("lotledger-base")
}

/// Main entry point with a custom binary name.
pub fn main_with_name(bin_name: &str) -> ExitCode {
    let args = Args::parse();

    if let Some(shell) = args.generate_completions {
        crate::cmd::completions::generate_completions::<Args>(shell, bin_name);
        return ExitCode::SUCCESS;
    }

    init_logging(args.verbose);

    match run(&args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn history(lines: &[&str]) -> PriceHistory {
        let mut history = PriceHistory::new("USD");
        for line in lines {
            history.observe(line).unwrap();
        }
        history
    }

    fn convert(history: &PriceHistory, postings: &[&str]) -> Converted {
        convert_postings(date(2018, 1, 1), postings, history, &mut Precision::new()).unwrap()
    }

    fn run_journal(source: &str, begin: Option<NaiveDate>) -> (String, Processed) {
        let mut out = Vec::new();
        let processed = process(
            source,
            &mut out,
            &mut PriceHistory::new("USD"),
            begin,
            &Renderer::default(),
        )
        .unwrap();
        (String::from_utf8(out).unwrap(), processed)
    }

    #[test]
    fn test_price_directive_forms() {
        let history = history(&[
            "P 2018/01/01 BTC 10000 USD",
            "P 2018/01/02 12:30:00 ETH 250.5 USD ; close",
            "P 2018-01-03 USD 0.0001 BTC",
        ]);
        assert_eq!(history.len(), 3);
        let btc = Asset::new("BTC");
        assert_eq!(history.price(date(2018, 1, 1), &btc), Some(&BigRational::from_integer(10000.into())));
        assert_eq!(
            history.price(date(2018, 1, 2), &Asset::new("ETH")),
            Some(&BigRational::new(501.into(), 2.into()))
        );
        // base quoted first is inverted
        assert_eq!(history.price(date(2018, 1, 3), &btc), Some(&BigRational::from_integer(10000.into())));
        assert_eq!(history.price(date(2018, 1, 4), &btc), None);
    }

    #[test]
    fn test_non_price_lines_ignored() {
        let mut history = PriceHistory::new("USD");
        assert!(!history.observe("2018/01/01 Payee").unwrap());
        assert!(!history.observe("P 2018/01/01 BTC 20 ETH").unwrap());
        assert!(history.is_empty());
    }

    #[test]
    fn test_later_price_replaces_earlier() {
        let history = history(&["P 2018/01/01 BTC 1 USD", "P 2018/01/01 BTC 2 USD"]);
        assert_eq!(
            history.price(date(2018, 1, 1), &Asset::new("BTC")),
            Some(&BigRational::from_integer(2.into()))
        );
    }

    #[test]
    fn test_malformed_price_directives() {
        let mut history = PriceHistory::new("USD");
        for line in [
            "P 2018/01/01 BTC USD",
            "P 2018/13/01 BTC 1 USD",
            "P 2018/01/01 25:00:00 BTC 1 USD",
            "P 2018/01/01 BTC 1,000 USD",
            "P 2018/01/01 USD 0 BTC",
        ] {
            assert!(history.observe(line).is_err(), "{line} should be rejected");
        }
    }

    #[test]
    fn test_convert_by_cost() {
        let history = history(&["P 2018/01/01 BTC 10000 USD"]);
        let converted = convert(&history, &["    Assets:Crypto  30 ETH @@ 1 BTC", "    Assets:Crypto  -1 BTC"]);
        assert_eq!(
            converted.postings,
            [
                "    Assets:Crypto  30 ETH @@ 10000 USD ; @@ 1 BTC",
                "    Assets:Crypto  -1 BTC @@ 10000 USD",
            ]
        );
        assert!(converted.missing.is_empty());
    }

    #[test]
    fn test_convert_unit_price_by_delta() {
        let history = history(&["P 2018/01/01 ETH 300 USD"]);
        let converted = convert(
            &history,
            &["    Assets:Crypto  30 ETH @ 0.05 BTC", "    Assets:Crypto  -1.5 BTC ; sent"],
        );
        assert_eq!(
            converted.postings,
            [
                "    Assets:Crypto  30 ETH @@ 9000 USD ; @ 0.05 BTC",
                "    Assets:Crypto  -1.5 BTC @@ 9000 USD ; sent",
            ]
        );
    }

    #[test]
    fn test_convert_sale() {
        let history = history(&["P 2018/01/01 BTC 10000 USD"]);
        let converted = convert(&history, &["    Assets:Crypto  -30 ETH @@ 1 BTC", "    Assets:Crypto  1 BTC"]);
        assert_eq!(
            converted.postings,
            [
                "    Assets:Crypto  -30 ETH @@ 10000 USD ; @@ 1 BTC",
                "    Assets:Crypto  1 BTC @@ 10000 USD",
            ]
        );
    }

    #[test]
    fn test_missing_price_is_reported() {
        let postings = ["    Assets:Crypto  30 ETH @@ 1 BTC", "    Assets:Crypto  -1 BTC"];
        let converted = convert(&PriceHistory::new("USD"), &postings);
        assert_eq!(converted.postings, postings);
        assert_eq!(converted.missing, ["missing price of BTC or ETH on 2018/01/01"]);
        assert!(!converted.changed(&postings));
    }

    #[test]
    fn test_base_priced_and_unrelated_postings_unchanged() {
        let history = history(&["P 2018/01/01 BTC 10000 USD"]);
        let postings = [
            "    Assets:Crypto  1 BTC @ 9000 USD",
            "    Assets:Cash  -9000 USD",
            "    ; a note",
            "    Expenses:Fees",
        ];
        let converted = convert(&history, &postings);
        assert_eq!(converted.postings, postings);
        assert!(converted.missing.is_empty());
    }

    #[test]
    fn test_process_missing_price_writes_fixme() {
        let (out, processed) = run_journal(
            "2018/01/01 Swap\n    Assets:Crypto  30 ETH @@ 1 BTC\n    Assets:Crypto  -1 BTC\n",
            None,
        );
        assert_eq!(
            out,
            "2018/01/01 Swap\n    Assets:Crypto  30 ETH @@ 1 BTC\n    Assets:Crypto  -1 BTC\n    \
             FIXME:lotledger base:  missing price of BTC or ETH on 2018/01/01\n\n"
        );
        assert_eq!(processed.missing, 1);
        assert_eq!(processed.converted, 0);
    }

    #[test]
    fn test_process_prices_apply_to_later_transactions() {
        let source = "\
P 2018/01/01 BTC 10000 USD

2018/01/01 Swap
    Assets:Crypto  30 ETH @@ 1 BTC
    Assets:Crypto  -1 BTC
";
        let (out, processed) = run_journal(source, None);
        assert!(out.starts_with("P 2018/01/01 BTC 10000 USD\n\n2018/01/01 Swap\n"));
        assert!(out.contains("    Assets:Crypto  30 ETH @@ 10000 USD ; @@ 1 BTC\n"));
        assert_eq!(processed.blocks, 2);
        assert_eq!(processed.converted, 1);
    }

    #[test]
    fn test_process_skips_before_begin() {
        let source = "2017/12/31 Swap\n    Assets:Crypto  30 ETH @@ 1 BTC\n    Assets:Crypto  -1 BTC\n";
        let (out, processed) = run_journal(source, Some(date(2018, 1, 1)));
        assert_eq!(out, format!("{source}\n"));
        assert_eq!(processed.missing, 0);
    }

    #[test]
    fn test_bad_posting_is_error() {
        let mut out = Vec::new();
        let err = process(
            "2018/01/01 Swap\n    Assets:Crypto  (1 + 2) ETH\n",
            &mut out,
            &mut PriceHistory::new("USD"),
            None,
            &Renderer::default(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("failed to convert transaction \"2018/01/01 Swap\""));
    }

    #[test]
    fn test_begin_date_argument() {
        let args = Args::parse_from(["lotledger-base", "--base", "USD", "--begin", "2018/02/01"]);
        assert_eq!(args.begin, Some(date(2018, 2, 1)));
        assert!(Args::try_parse_from(["lotledger-base", "--begin", "Feb 1"]).is_err());
    }
}
