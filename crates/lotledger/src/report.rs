//! Error reporting with source context.
//!
//! Uses ariadne to point at the journal line that stopped a run.

use std::io::Write;
use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use lotledger_booking::BookingError;

/// A transaction that could not be booked.
#[derive(Debug)]
pub struct TxFailure {
    /// The payee line, trimmed.
    pub payee: String,
    /// Byte range of the whole transaction.
    pub span: Range<usize>,
    /// Byte range of the offending line, when it could be located.
    pub line: Option<Range<usize>>,
    /// What went wrong.
    pub error: BookingError,
}

impl TxFailure {
    /// Short label for the offending span.
    pub fn label(&self) -> &'static str {
        if self.error.is_internal() {
            "booking stopped here (internal error)"
        } else {
            match &self.error {
                BookingError::Consume { .. } => "not enough inventory for this posting",
                BookingError::Parse(_) => "could not parse this line",
                _ => "rejected here",
            }
        }
    }
}

/// Write a failure with the journal excerpt it refers to.
pub fn report_failure<W: Write>(
    failure: &TxFailure,
    path: &str,
    source: &str,
    color: bool,
    writer: &mut W,
) -> std::io::Result<()> {
    let span = failure.line.clone().unwrap_or_else(|| failure.span.clone());

    Report::build(ReportKind::Error, (path, span.clone()))
        .with_message(format!("failed to book transaction {:?}: {}", failure.payee, failure.error))
        .with_label(
            Label::new((path, span))
                .with_message(failure.label())
                .with_color(Color::Red),
        )
        .with_config(Config::default().with_compact(false).with_color(color))
        .finish()
        .write((path, Source::from(source)), &mut *writer)
}

/// Write a failure without source context, for input read from stdin.
pub fn report_failure_plain<W: Write>(failure: &TxFailure, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "error: failed to book transaction {:?}", failure.payee)?;
    writeln!(writer, "  {}", failure.error)?;
    if let Some(line) = failure.error.line() {
        writeln!(writer, "  at: {}", line.trim())?;
    }
    Ok(())
}
