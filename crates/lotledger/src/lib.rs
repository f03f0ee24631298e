//! Lot tracking for plain text ledger journals.
//!
//! The `lotledger` binary reads a journal, books every transaction against
//! FIFO or LIFO lot pools, and writes the journal back with lot inventory,
//! basis and realized gain postings added. Two companion binaries prepare
//! journals for it: `lotledger-base` restates costs priced in other assets
//! in the base currency, and `lotledger-obfuscate` hides account names.
//!
//! - [`scan`]: splits the journal into blocks and finds transactions
//! - [`render`]: writes booked transactions as journal text
//! - [`summary`]: JSON summary of gains and remaining holdings
//! - [`report`]: diagnostics for the transaction that stopped a run
//!
//! # Example Usage
//!
//! ```bash
//! lotledger -f journal.ledger --base USD
//! lotledger -f journal.ledger --base USD --method lifo --prune 2 -o booked.ledger
//! lotledger-base -f journal.ledger --base USD --begin 2018/01/01 | lotledger --base USD
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod render;
pub mod report;
pub mod scan;
pub mod summary;
