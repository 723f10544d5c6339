//! Scenario: Market Data Series
//!
//! # Invariant under test
//! Rate and tick series decode into the same typed rows whichever shape
//! the terminal answers with (columns+rows, bare arrays, objects), rows
//! come back oldest first, and an unknown symbol yields an absent series
//! plus an error code, never a raised error.

use bridge_common::constants::{copy_ticks, Timeframe};
use bridge_common::errors::codes;
use bridge_common::options::{SymbolSelectOptions, SymbolsFilter};
use bridge_core::{AsyncBridgeControl, AsyncTerminal, AsyncTerminalApi, BridgeControl, TerminalApi};
use bridge_testkit::{async_terminal, at, blocking_terminal, FakeDialer, FakeTerminal, FAKE_NOW};

async fn session() -> (AsyncTerminal, FakeDialer) {
    let (terminal, dialer) = async_terminal(FakeTerminal::new().initialized());
    assert!(terminal.connect().await.unwrap());
    (terminal, dialer)
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rates_from_pos_returns_count_rows_ascending() {
    let (terminal, _dialer) = session().await;

    let series = terminal
        .copy_rates_from_pos("EURUSD", Timeframe::H1, 0, 10)
        .await
        .unwrap()
        .expect("series");
    assert_eq!(series.len(), 10);
    assert!(series.is_sorted_by_time());

    let last = series.last().unwrap();
    assert!(last.time <= FAKE_NOW);
    assert_eq!(last.time % Timeframe::H1.seconds(), 0);
    for bar in series.iter() {
        assert!(bar.low <= bar.open.min(bar.close));
        assert!(bar.high >= bar.open.max(bar.close));
    }
}

#[tokio::test]
async fn all_three_rate_shapes_decode_alike() {
    let (terminal, _dialer) = session().await;
    let minute = Timeframe::M1.seconds();
    let to = at(FAKE_NOW);
    // The range starts on the opening time of the tenth newest bar.
    let from = at((FAKE_NOW / minute - 9) * minute);

    // copyRatesFrom answers with bare arrays, copyRatesRange with objects.
    let by_count = terminal
        .copy_rates_from("GBPUSD", Timeframe::M1, to, 10)
        .await
        .unwrap()
        .expect("rows");
    let by_range = terminal
        .copy_rates_range("GBPUSD", Timeframe::M1, from, to)
        .await
        .unwrap()
        .expect("rows");
    let by_pos = terminal
        .copy_rates_from_pos("GBPUSD", Timeframe::M1, 0, 10)
        .await
        .unwrap()
        .expect("rows");

    assert_eq!(by_count.rows(), by_range.rows());
    assert_eq!(by_count.rows(), by_pos.rows());
}

#[tokio::test]
async fn unknown_symbol_is_absent_with_invalid_params() {
    let (terminal, _dialer) = session().await;

    let series = terminal
        .copy_rates_from_pos("NOPE", Timeframe::D1, 0, 5)
        .await
        .unwrap();
    assert_eq!(series, None);
    assert_eq!(terminal.last_error().await.code, codes::RES_E_INVALID_PARAMS);
}

#[tokio::test]
async fn zero_count_is_an_empty_series() {
    let (terminal, _dialer) = session().await;
    let series = terminal
        .copy_rates_from_pos("EURUSD", Timeframe::M5, 0, 0)
        .await
        .unwrap()
        .expect("present but empty");
    assert!(series.is_empty());
}

// ---------------------------------------------------------------------------
// Ticks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ticks_from_and_range() {
    let (terminal, _dialer) = session().await;
    let start = at(FAKE_NOW - 60);

    let ticks = terminal
        .copy_ticks_from("USDJPY", start, 25, copy_ticks::ALL)
        .await
        .unwrap()
        .expect("ticks");
    assert_eq!(ticks.len(), 25);
    assert!(ticks.is_sorted_by_time());
    assert!(ticks.iter().all(|t| t.ask > t.bid));

    let range = terminal
        .copy_ticks_range("USDJPY", start, at(FAKE_NOW - 51), copy_ticks::INFO)
        .await
        .unwrap()
        .expect("ticks");
    assert_eq!(range.len(), 10);
    assert_eq!(range.first().unwrap().time, FAKE_NOW - 60);
}

// ---------------------------------------------------------------------------
// Symbols
// ---------------------------------------------------------------------------

#[tokio::test]
async fn symbol_catalogue() {
    let (terminal, _dialer) = session().await;

    assert_eq!(terminal.symbols_total().await.unwrap(), 4);

    let usd = terminal
        .symbols_get(SymbolsFilter::group("*USD*,!EUR*"))
        .await
        .unwrap()
        .expect("symbols");
    let names: Vec<&str> = usd.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["GBPUSD", "USDJPY", "XAUUSD"]);

    let info = terminal.symbol_info("XAUUSD").await.unwrap().expect("info");
    assert_eq!(info.digits, 2);
    assert!(info.ask > info.bid);

    let tick = terminal.symbol_info_tick("EURUSD").await.unwrap().expect("tick");
    assert_eq!(tick.time, FAKE_NOW);

    assert!(terminal
        .symbol_select("EURUSD", SymbolSelectOptions { enable: false })
        .await
        .unwrap());
    assert!(!terminal
        .symbol_select("NOPE", SymbolSelectOptions::default())
        .await
        .unwrap());
    assert_eq!(terminal.symbol_info("NOPE").await.unwrap(), None);
}

#[test]
fn blocking_rates_match_suspending_shape() {
    let (terminal, _dialer) = blocking_terminal(FakeTerminal::new().initialized()).unwrap();
    terminal.connect().unwrap();

    let series = terminal
        .copy_rates_from_pos("EURUSD", Timeframe::H4, 5, 3)
        .unwrap()
        .expect("series");
    assert_eq!(series.len(), 3);
    let latest_bar = FAKE_NOW / Timeframe::H4.seconds() - 5;
    assert_eq!(series.last().unwrap().time, latest_bar * Timeframe::H4.seconds());
}
