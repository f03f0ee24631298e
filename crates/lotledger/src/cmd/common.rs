//! Plumbing shared by the lotledger commands.

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// True when `file` names stdin.
pub fn is_stdin(file: &Path) -> bool {
    file.as_os_str() == "-"
}

/// Read the whole journal from `file`, or stdin for `-`.
pub fn read_input(file: &Path) -> Result<String> {
    if is_stdin(file) {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    } else {
        if !file.exists() {
            anyhow::bail!("file not found: {}", file.display());
        }
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
    }
}

/// Where a command writes its journal: a buffered file, or stdout.
pub fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(io::BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

/// Install the stderr log subscriber: warn by default, `-v` debug, `-vv` trace.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
    if installed.is_err() {
        tracing::debug!("log subscriber already installed, keeping it");
    }
}
