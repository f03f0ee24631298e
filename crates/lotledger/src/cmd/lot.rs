//! Implementation of the `lotledger` command.

use crate::cmd::common::{init_logging, is_stdin, open_output, read_input};
use crate::cmd::completions::ShellType;
use crate::render::{FormatConfig, Renderer};
use crate::report::{self, TxFailure};
use crate::scan::TxScanner;
use crate::summary::{Summary, SummaryBuilder};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use lotledger_booking::{BookingConfig, LotBook};
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Add lot inventory, basis and gain postings to a ledger journal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Journal to read, `-` for stdin
    #[arg(short = 'f', long = "file", value_name = "FILE", default_value = "-")]
    pub file: PathBuf,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL", hide = true)]
    pub generate_completions: Option<ShellType>,

    /// Currency that basis and gains are measured in
    #[arg(short = 'b', long, value_name = "ASSET")]
    pub base: Option<String>,

    /// Which lot a sale consumes first (fifo or lifo)
    #[arg(long, visible_alias = "order", value_name = "METHOD", default_value = "fifo")]
    pub method: String,

    /// Leading account segments that define a lot pool (0 = one pool per asset)
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub prune: usize,

    /// Keep a separate lot pool for every account
    #[arg(long, conflicts_with = "prune")]
    pub full_account: bool,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Write a JSON summary of realized gains and holdings
    #[arg(long, value_name = "JSON_FILE")]
    pub summary: Option<PathBuf>,

    /// Column for aligning amounts of generated postings
    #[arg(short = 'c', long = "amount-column", default_value = "60")]
    pub column: usize,

    /// Number of spaces for posting indentation
    #[arg(long, default_value = "4")]
    pub indent: usize,

    /// Log booking decisions to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// The booking configuration these arguments describe.
    pub fn booking_config(&self) -> Result<BookingConfig> {
        let prune = if self.full_account {
            None
        } else {
            Some(self.prune)
        };
        let config = BookingConfig::new(self.base.as_deref().unwrap_or_default())
            .with_prune(prune)
            .with_method_name(&self.method)?;
        config.validate()?;
        Ok(config)
    }
}

/// The result of processing one journal.
#[derive(Debug, Default)]
pub struct Processed {
    /// Blocks read, transactions or not.
    pub blocks: usize,
    /// Transactions booked.
    pub transactions: usize,
    /// The transaction that stopped the run.
    pub failure: Option<TxFailure>,
}

/// Book every transaction of `source` in order, writing the augmented journal.
///
/// Processing stops at the first transaction that cannot be booked; its
/// original lines are written before returning.
pub fn process<W: Write>(
    source: &str,
    writer: &mut W,
    book: &mut LotBook,
    renderer: &Renderer,
    summary: &mut SummaryBuilder,
) -> io::Result<Processed> {
    let mut processed = Processed::default();

    for block in TxScanner::new(source) {
        processed.blocks += 1;
        let Some(payee) = block.payee() else {
            writer.write_all(renderer.passthrough(block.lines()).as_bytes())?;
            continue;
        };

        tracing::debug!("transaction: {}", payee.line.text);
        let postings: Vec<&str> = block.postings(&payee).iter().map(|l| l.text).collect();

        match book.book(payee.date, &postings) {
            Ok(booking) => {
                let text = renderer.transaction(block.lines(), payee.index, &booking, book.precision());
                writer.write_all(text.as_bytes())?;
                summary.record(payee.date, payee.line.text, booking.gains.as_ref());
                processed.transactions += 1;
            }
            Err(error) => {
                writer.write_all(renderer.original(block.lines()).as_bytes())?;
                let line = error.line().and_then(|text| {
                    block
                        .postings(&payee)
                        .iter()
                        .find(|l| l.text == text)
                        .map(|l| l.span())
                });
                processed.failure = Some(TxFailure {
                    payee: payee.line.text.trim().to_string(),
                    span: block.span(),
                    line,
                    error,
                });
                break;
            }
        }
    }

    writer.flush()?;
    Ok(processed)
}

fn write_summary(path: &Path, summary: &Summary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json + "\n").with_context(|| format!("failed to write {}", path.display()))
}

fn run(args: &Args) -> Result<ExitCode> {
    let config = args.booking_config()?;
    let mut book = LotBook::new(config)?;
    let renderer = Renderer::new(FormatConfig::new(args.column, args.indent));
    let mut summary = SummaryBuilder::new();

    let source = read_input(&args.file)?;

    let mut writer = open_output(args.output.as_deref())?;
    let processed = process(&source, &mut writer, &mut book, &renderer, &mut summary)?;
    drop(writer);

    tracing::info!(
        "read {} blocks, booked {} transactions",
        processed.blocks,
        processed.transactions
    );

    if let Some(failure) = &processed.failure {
        let mut stderr = io::stderr().lock();
        if is_stdin(&args.file) {
            report::report_failure_plain(failure, &mut stderr)?;
        } else {
            let path = args.file.display().to_string();
            let color = io::stderr().is_terminal();
            report::report_failure(failure, &path, &source, color, &mut stderr)?;
        }
        return Ok(ExitCode::from(1));
    }

    if let Some(path) = &args.summary {
        write_summary(path, &summary.finish(&book))?;
    }

    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the lotledger command.
pub fn main() -> ExitCode {
    main_with_name("lotledger")
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
    use lotledger_core::BookingMethod;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("lotledger").chain(extra.iter().copied()))
    }

    fn run_journal(source: &str) -> (String, Processed) {
        let mut book = LotBook::new(BookingConfig::new("USD")).unwrap();
        let mut out = Vec::new();
        let processed = process(
            source,
            &mut out,
            &mut book,
            &Renderer::default(),
            &mut SummaryBuilder::new(),
        )
        .unwrap();
        (String::from_utf8(out).unwrap(), processed)
    }

    #[test]
    fn test_args_to_config() {
        let config = args(&["--base", "EUR", "--method", "LIFO", "--prune", "2"])
            .booking_config()
            .unwrap();
        assert_eq!(config.base, "EUR");
        assert_eq!(config.method, BookingMethod::Lifo);
        assert_eq!(config.prune, Some(2));

        let config = args(&["--base", "USD", "--full-account"]).booking_config().unwrap();
        assert_eq!(config.prune, None);
        assert_eq!(config.method, BookingMethod::Fifo);
    }

    #[test]
    fn test_config_errors() {
        let err = args(&[]).booking_config().unwrap_err();
        assert!(format!("{err:#}").contains("base currency is required"));

        let err = args(&["--base", "USD", "--method", "hifo"]).booking_config().unwrap_err();
        assert!(format!("{err:#}").contains("hifo"));
    }

    #[test]
    fn test_process_passes_other_blocks_through() {
        let (out, processed) = run_journal("; comment\nP 2024/01/01 X 5 USD\n\n");
        assert_eq!(out, "; comment\nP 2024/01/01 X 5 USD\n\n");
        assert_eq!(processed.blocks, 1);
        assert_eq!(processed.transactions, 0);
    }

    #[test]
    fn test_process_stops_at_failure() {
        let source = "\
2024/01/01 Sell
    Assets:Broker  -1 X @ 5 USD
    Assets:Cash

2024/01/02 Never reached
    Expenses:Food  1 USD
    Assets:Cash
";
        let (out, processed) = run_journal(source);
        assert_eq!(out, "2024/01/01 Sell\n    Assets:Broker  -1 X @ 5 USD\n    Assets:Cash\n");
        assert_eq!(processed.transactions, 0);

        let failure = processed.failure.unwrap();
        assert_eq!(failure.payee, "2024/01/01 Sell");
        assert_eq!(&source[failure.line.unwrap()], "    Assets:Broker  -1 X @ 5 USD");
        assert!(!failure.error.is_internal());
    }
}
