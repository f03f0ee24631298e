//! End to end booking scenarios.
//!
//! Each test drives a `LotBook` the way the journal processor does: one
//! call per transaction, in date order, against one set of lot pools.

use chrono::NaiveDate;
use lotledger_booking::{BookingConfig, BookingError, EventKind, LotBook, TxKind};
use lotledger_core::{Amount, BookingMethod};

// ============================================================================
// Helpers
// ============================================================================

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn amount(s: &str) -> Amount {
    s.parse().unwrap()
}

fn book_with(method: BookingMethod, prune: Option<usize>) -> LotBook {
    let config = BookingConfig::new("USD").with_method(method).with_prune(prune);
    LotBook::new(config).unwrap()
}

/// Two lots of X: 10 @ 100 on 2017-01-01 and 10 @ 500 on 2018-06-01.
fn two_lots(method: BookingMethod) -> LotBook {
    let mut book = book_with(method, Some(0));
    book.book(date(2017, 1, 1), &["    Assets:Broker  10 X @ 100 USD", "    Assets:Cash"])
        .unwrap();
    book.book(date(2018, 6, 1), &["    Assets:Broker  10 X @ 500 USD", "    Assets:Cash"])
        .unwrap();
    book
}

// ============================================================================
// Trades
// ============================================================================

#[test]
fn test_fifo_sale_across_holding_periods() {
    let mut book = two_lots(BookingMethod::Fifo);
    let sale = book
        .book(date(2018, 9, 1), &["    Assets:Broker  -20 X @@ 10000 USD", "    Assets:Cash"])
        .unwrap();

    assert_eq!(sale.kind, TxKind::Trade);
    assert_eq!(sale.events.len(), 2);
    assert_eq!(sale.events[0].lot_name, "Lot::2017-01-01:10X@100USD:1");
    assert_eq!(sale.events[0].basis, amount("-1000 USD"));
    assert_eq!(sale.events[1].lot_name, "Lot::2018-06-01:10X@500USD:2");
    assert_eq!(sale.events[1].basis, amount("-5000 USD"));

    // 10000 proceeds against 6000 basis, half the units held over a year
    let gains = sale.gains.unwrap();
    assert_eq!(gains.total, amount("4000 USD"));
    assert_eq!(gains.long_term, amount("2000 USD"));
    assert_eq!(gains.short_term, amount("2000 USD"));
    assert_eq!(gains.long_inventory, amount("10 X"));

    let postings = gains.postings();
    assert_eq!(postings.len(), 2);
    assert!(postings.iter().all(|p| p.amount == amount("-2000 USD")));
    assert_eq!(book.holdings().count(), 0);
}

#[test]
fn test_partial_sale_fifo_versus_lifo() {
    let sell = ["    Assets:Broker  -10 X @@ 6000 USD", "    Assets:Cash"];

    let mut fifo = two_lots(BookingMethod::Fifo);
    let gains = fifo.book(date(2018, 9, 1), &sell).unwrap().gains.unwrap();
    assert_eq!(gains.long_term, amount("5000 USD"));
    assert!(gains.short_term.is_zero());

    let mut lifo = two_lots(BookingMethod::Lifo);
    let sale = lifo.book(date(2018, 9, 1), &sell).unwrap();
    assert_eq!(sale.events[0].lot_name, "Lot::2018-06-01:10X@500USD:2");
    let gains = sale.gains.unwrap();
    assert_eq!(gains.short_term, amount("1000 USD"));
    assert!(gains.long_term.is_zero());

    let (_, _, left) = lifo.holdings().next().unwrap();
    assert_eq!(left.iter().next().unwrap().date(), date(2017, 1, 1));
}

#[test]
fn test_short_plus_long_is_total() {
    let mut book = book_with(BookingMethod::Fifo, Some(0));
    book.book(date(2017, 1, 1), &["    Assets:Broker  3 X @ 7 USD", "    Assets:Cash"])
        .unwrap();
    book.book(date(2019, 6, 1), &["    Assets:Broker  4 X @ 11 USD", "    Assets:Cash"])
        .unwrap();
    let gains = book
        .book(date(2019, 9, 1), &["    Assets:Broker  -7 X @@ 1000 USD", "    Assets:Cash"])
        .unwrap()
        .gains
        .unwrap();

    assert_eq!(gains.total, amount("935 USD"));
    assert_eq!(&gains.short_term + &gains.long_term, gains.total);
    assert_eq!(gains.short_term, amount("3740/7 USD"));
}

#[test]
fn test_deferred_barter_realizes_nothing() {
    let mut book = book_with(BookingMethod::Fifo, Some(0));
    book.book(date(2017, 1, 1), &["    Assets:Crypto  1 BTC @ 1000 USD", "    Assets:Cash"])
        .unwrap();

    let barter = book
        .book(date(2018, 3, 1), &["    Assets:Crypto  30 ETH @@ 1 BTC", "    Assets:Crypto  -1 BTC"])
        .unwrap();
    assert_eq!(barter.events[0].kind, EventKind::SellDeferred);
    assert_eq!(barter.events[1].kind, EventKind::BuyDeferred);
    assert_eq!(barter.events[1].lot_name, "Lot::2017-01-01:30ETH@0.033333BTC@1000USD:2");
    let gains = barter.gains.unwrap();
    assert!(gains.total.is_zero());
    assert!(gains.postings().is_empty());

    // the ETH lot inherits the BTC lot's date, so this is long term
    let sale = book
        .book(date(2018, 4, 1), &["    Assets:Crypto  -30 ETH @@ 1500 USD", "    Assets:Cash"])
        .unwrap();
    let gains = sale.gains.unwrap();
    assert_eq!(gains.long_term, amount("500 USD"));
    assert!(gains.short_term.is_zero());
}

#[test]
fn test_insufficient_inventory_fails() {
    let mut book = book_with(BookingMethod::Fifo, Some(0));
    book.book(date(2020, 1, 1), &["    Assets:Broker  5 X @ 1 USD", "    Assets:Cash"])
        .unwrap();

    let err = book
        .book(date(2020, 2, 1), &["    Assets:Broker  -8 X @ 2 USD", "    Assets:Cash"])
        .unwrap_err();
    assert!(matches!(err, BookingError::Consume { .. }));
    assert!(!err.is_internal());
    assert_eq!(err.line(), Some("    Assets:Broker  -8 X @ 2 USD"));

    // what was consumed before the shortfall stays consumed
    assert_eq!(book.holdings().count(), 0);
}

// ============================================================================
// Moves
// ============================================================================

#[test]
fn test_move_keeps_acquisition_date() {
    let mut book = book_with(BookingMethod::Fifo, None);
    book.book(date(2017, 1, 1), &["    Assets:Wallet:hot  1 BTC @ 1000 USD", "    Assets:Cash"])
        .unwrap();

    let moved = book
        .book(date(2017, 12, 1), &["    Assets:Wallet:hot  -1 BTC", "    Assets:Wallet:cold"])
        .unwrap();
    assert_eq!(moved.kind, TxKind::Move);
    assert!(moved.gains.is_none());
    assert_eq!(moved.events.len(), 2);
    assert_eq!(moved.events[1].lot_name, "Lot:Assets:Wallet:cold:2017-01-01:1BTC@1000USD:1");

    let pools: Vec<&str> = book.holdings().map(|(_, qual, _)| qual).collect();
    assert_eq!(pools, ["Assets:Wallet:cold"]);

    let gains = book
        .book(date(2018, 2, 1), &["    Assets:Wallet:cold  -1 BTC @ 3000 USD", "    Assets:Cash"])
        .unwrap()
        .gains
        .unwrap();
    assert_eq!(gains.long_term, amount("2000 USD"));
    assert!(gains.short_term.is_zero());
}

#[test]
fn test_move_within_pruned_pool_is_noop() {
    let mut book = book_with(BookingMethod::Fifo, Some(2));
    book.book(date(2017, 1, 1), &["    Assets:Wallet:hot  1 BTC @ 1000 USD", "    Assets:Cash"])
        .unwrap();
    let moved = book
        .book(date(2017, 2, 1), &["    Assets:Wallet:hot  -1 BTC", "    Assets:Wallet:cold  1 BTC"])
        .unwrap();
    assert!(moved.is_empty());

    let pools: Vec<&str> = book.holdings().map(|(_, qual, _)| qual).collect();
    assert_eq!(pools, ["Assets:Wallet"]);
}

#[test]
fn test_lots_after_a_move_keep_counting_weights() {
    let mut book = book_with(BookingMethod::Fifo, None);
    book.book(date(2017, 1, 1), &["    Assets:Broker:main  10 X @ 100 USD", "    Assets:Cash"])
        .unwrap();
    let moved = book
        .book(date(2017, 2, 1), &["    Assets:Broker:main  -5 X", "    Assets:Broker:cold"])
        .unwrap();
    assert_eq!(moved.events[1].lot_name, "Lot:Assets:Broker:cold:2017-01-01:5X@100USD:1");

    // the staged and the destination lot of the move each took a weight
    let bought = book
        .book(date(2017, 3, 1), &["    Assets:Broker:main  1 X @ 100 USD", "    Assets:Cash"])
        .unwrap();
    assert_eq!(bought.events[0].lot_name, "Lot:Assets:Broker:main:2017-03-01:1X@100USD:4");
}
