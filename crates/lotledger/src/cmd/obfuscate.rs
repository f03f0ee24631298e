//! Implementation of the `lotledger-obfuscate` command.
//!
//! Replaces account names and payees with salted hashes so a journal can be
//! shared without revealing where the money is. The same name always maps
//! to the same hash and accounts keep their depth, so `lotledger` books the
//! obfuscated journal exactly as it books the original.

use crate::cmd::common::{init_logging, open_output, read_input};
use crate::cmd::completions::ShellType;
use crate::render::Renderer;
use crate::scan::TxScanner;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use lotledger_core::{Precision, Split};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Conceal account names and payees behind salted hashes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Journal to read, `-` for stdin
    #[arg(short = 'f', long = "file", value_name = "FILE", default_value = "-")]
    pub file: PathBuf,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL", hide = true)]
    pub generate_completions: Option<ShellType>,

    /// Leading account segments left readable
    #[arg(long, value_name = "N", default_value = "1")]
    pub prune: usize,

    /// Hashes are only reproducible by someone who knows the salt
    #[arg(long, value_name = "SALT", default_value = "")]
    pub salt: String,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Log progress to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Bytes of digest kept for an account segment.
const SEGMENT_BYTES: usize = 3;
/// Bytes of digest kept for a payee.
const PAYEE_BYTES: usize = 8;

/// Salted hashing of names.
#[derive(Debug, Clone)]
pub struct Obfuscator {
    prune: usize,
    salt: String,
}

impl Obfuscator {
    /// Hash every account segment past the first `prune`.
    pub fn new(prune: usize, salt: impl Into<String>) -> Self {
        Self {
            prune,
            salt: salt.into(),
        }
    }

    fn digest(&self, text: &str, bytes: usize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(self.salt.as_bytes());
        hex::encode(&hasher.finalize()[..bytes])
    }

    /// `Assets:Bank:Checking` becomes `Assets:1a2b3c:4d5e6f` with a prune of one.
    pub fn account(&self, account: &str) -> String {
        account
            .split(':')
            .enumerate()
            .map(|(depth, part)| {
                if depth < self.prune {
                    part.to_string()
                } else {
                    self.digest(part, SEGMENT_BYTES)
                }
            })
            .collect::<Vec<_>>()
            .join(":")
    }

    /// A payee line as a comment holding the original, then the date and a hash.
    ///
    /// Anything after the date, including a trailing comment, is hashed away
    /// on the second line.
    pub fn payee(&self, line: &str) -> String {
        let code = line.split(';').next().unwrap_or_default();
        let (date, rest) = code.split_once(' ').unwrap_or((code, ""));
        format!("; {line}\n{date} {}", self.digest(rest, PAYEE_BYTES))
    }

    /// The lines of one block, obfuscated.
    pub fn block<S: AsRef<str>>(
        &self,
        lines: &[S],
        payee_index: Option<usize>,
        precision: &mut Precision,
    ) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(lines.len() + 1);
        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if Some(index) == payee_index {
                out.push(self.payee(line));
                continue;
            }
            let split = Split::parse(line, precision)
                .with_context(|| format!("failed to read posting {:?}", line.trim()))?;
            match split {
                Some(split) => {
                    let cleartext = split.account().trim_matches(['[', ']', '(', ')']);
                    out.push(line.replacen(cleartext, &self.account(cleartext), 1));
                }
                None => out.push(line.to_string()),
            }
        }
        Ok(out)
    }
}

/// Obfuscate every block of `source`, returning the number of transactions.
pub fn process<W: Write>(
    source: &str,
    writer: &mut W,
    obfuscator: &Obfuscator,
    renderer: &Renderer,
) -> Result<usize> {
    let mut precision = Precision::new();
    let mut transactions = 0;

    for block in TxScanner::new(source) {
        let payee = block.payee();
        // postings only count inside a transaction
        let lines = match payee {
            Some(payee) => {
                transactions += 1;
                obfuscator.block(block.lines(), Some(payee.index), &mut precision)?
            }
            None => block.lines().iter().map(|l| l.text.to_string()).collect(),
        };
        writer.write_all(renderer.passthrough(&lines).as_bytes())?;
    }

    writer.flush()?;
    Ok(transactions)
}

fn run(args: &Args) -> Result<ExitCode> {
    let obfuscator = Obfuscator::new(args.prune, args.salt.clone());
    let source = read_input(&args.file)?;
    let mut writer = open_output(args.output.as_deref())?;
    let transactions = process(&source, &mut writer, &obfuscator, &Renderer::default())?;
    tracing::info!("obfuscated {} transactions", transactions);
    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the lotledger-obfuscate command.
pub fn main() -> ExitCode {
    main_with_name("lotledger-obfuscate")
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
