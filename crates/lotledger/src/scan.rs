//! Splitting a journal into blocks.
//!
//! A block is a run of lines ending at a blank line. Blank lines only end a
//! block once it holds something other than comments, so a comment header
//! stays attached to the transaction below it.

use std::ops::Range;

use chrono::NaiveDate;

const DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];

/// One line of the journal, without its line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// The text.
    pub text: &'a str,
    /// Byte offset of the first character in the journal.
    pub offset: usize,
}

impl Line<'_> {
    /// Byte range of the line in the journal.
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.text.len()
    }
}

impl AsRef<str> for Line<'_> {
    fn as_ref(&self) -> &str {
        self.text
    }
}

/// The line that opens a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payee<'a> {
    /// Index of the payee line in its block.
    pub index: usize,
    /// The transaction date.
    pub date: NaiveDate,
    /// The whole payee line.
    pub line: Line<'a>,
}

/// A group of lines read together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxBlock<'a> {
    lines: Vec<Line<'a>>,
}

impl<'a> TxBlock<'a> {
    /// All lines, in journal order.
    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    /// Byte range covering the whole block.
    pub fn span(&self) -> Range<usize> {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) => first.offset..last.span().end,
            _ => 0..0,
        }
    }

    /// Find the payee line; `None` when the block is not a transaction.
    ///
    /// Reading upwards, indented lines are postings. The first unindented
    /// line above them must start with a date.
    pub fn payee(&self) -> Option<Payee<'a>> {
        let mut has_postings = false;
        for (index, line) in self.lines.iter().enumerate().rev() {
            let code = before_comment(line.text);
            let trimmed = code.trim_start_matches([' ', '\t']);
            if trimmed.len() != code.len() {
                has_postings |= !trimmed.is_empty();
                continue;
            }
            if !has_postings {
                return None;
            }
            let first = code.split(' ').next().unwrap_or_default();
            return parse_date(first).map(|date| Payee {
                index,
                date,
                line: *line,
            });
        }
        None
    }

    /// Lines after the payee line.
    pub fn postings(&self, payee: &Payee<'_>) -> &[Line<'a>] {
        &self.lines[payee.index + 1..]
    }
}

/// Iterator over the blocks of a journal held in memory.
///
/// ```
/// use lotledger::scan::TxScanner;
///
/// let journal = "; header\n\n2024/1/2 Coffee\n    Expenses:Food  3 USD\n    Assets:Cash\n\n";
/// let blocks: Vec<_> = TxScanner::new(journal).collect();
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].lines().len(), 5);
/// assert!(blocks[0].payee().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct TxScanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> TxScanner<'a> {
    /// Scan `source` from the start.
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn next_line(&mut self) -> Option<Line<'a>> {
        if self.pos >= self.source.len() {
            return None;
        }
        let rest = &self.source[self.pos..];
        let (raw, advance) = match rest.find('\n') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };
        let line = Line {
            text: raw.strip_suffix('\r').unwrap_or(raw),
            offset: self.pos,
        };
        self.pos += advance;
        Some(line)
    }
}

impl<'a> Iterator for TxScanner<'a> {
    type Item = TxBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut lines = Vec::new();
        let mut has_content = false;

        while let Some(line) = self.next_line() {
            if line.text.trim().is_empty() && has_content {
                break;
            }
            has_content |= !before_comment(line.text).trim().is_empty();
            lines.push(line);
        }

        if lines.is_empty() {
            None
        } else {
            Some(TxBlock { lines })
        }
    }
}

fn before_comment(text: &str) -> &str {
    text.split(';').next().unwrap_or_default()
}

/// Parse a payee date, `2024/1/2` or `2024-01-02`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}
