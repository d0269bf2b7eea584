// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{TimeZone, Utc};
use lotbook::commands::{doctor, portfolio};
use lotbook::models::{NewTrade, PriceMap, PriceQuote, Side};
use lotbook::{cli, db, store};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn add(conn: &Connection, symbol: &str, side: Side, qty: Decimal, price: Decimal, day: u32) {
    store::insert_trade(
        conn,
        &NewTrade {
            symbol: symbol.into(),
            side,
            quantity: qty,
            price,
            fee: Decimal::ZERO,
            date: Utc.with_ymd_and_hms(2025, 4, day, 10, 0, 0).unwrap(),
        },
    )
    .unwrap();
}

fn set_prices(conn: &mut Connection, prices: &[(&str, Decimal)]) {
    let map: PriceMap = prices
        .iter()
        .map(|(s, p)| (s.to_string(), PriceQuote::new(*p, *p, 1000)))
        .collect();
    store::replace_prices(conn, &map, Utc::now()).unwrap();
}

fn realized_rows(conn: &Connection, args: &[&str]) -> Vec<lotbook::ledger::RealizedPnl> {
    let mut argv = vec!["lotbook", "realized"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let Some(("realized", sub)) = matches.subcommand() else {
        panic!("no realized subcommand");
    };
    portfolio::realized_rows(conn, sub).unwrap()
}

#[test]
fn stored_trades_produce_expected_holding_and_realized_record() {
    let mut conn = setup();
    add(&conn, "AAA", Side::Sell, dec!(4), dec!(150), 2);
    add(&conn, "AAA", Side::Buy, dec!(10), dec!(100), 1);
    set_prices(&mut conn, &[("AAA", dec!(160))]);

    let v = portfolio::valuation(&conn).unwrap();
    assert_eq!(v.holdings.len(), 1);
    let h = &v.holdings[0];
    assert_eq!(h.quantity, dec!(6));
    assert_eq!(h.avg_price, dec!(100));
    assert_eq!(h.market_value, dec!(960));
    assert_eq!(h.unrealized_pnl, dec!(360));
    assert_eq!(h.pnl_percentage, dec!(60));
    assert_eq!(v.totals.total_value, dec!(960));
    assert_eq!(v.totals.pnl_percentage, dec!(60));
    assert_eq!(v.all_time_profit, dec!(200));

    let rows = realized_rows(&conn, &[]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, dec!(4));
    assert_eq!(rows[0].buy_price, dec!(100));
    assert_eq!(rows[0].sell_price, dec!(150));
    assert_eq!(rows[0].profit_loss, dec!(200));
}

#[test]
fn deleting_a_trade_changes_the_next_recomputation() {
    let conn = setup();
    add(&conn, "BBB", Side::Buy, dec!(5), dec!(10), 1);
    add(&conn, "BBB", Side::Sell, dec!(5), dec!(12), 2);
    assert!(portfolio::valuation(&conn).unwrap().holdings.is_empty());

    let sell_id = store::load_trades(&conn).unwrap()[1].id;
    store::delete_trade(&conn, sell_id).unwrap();

    let v = portfolio::valuation(&conn).unwrap();
    assert_eq!(v.holdings.len(), 1);
    assert_eq!(v.holdings[0].quantity, dec!(5));
    assert_eq!(v.all_time_profit, Decimal::ZERO);
}

#[test]
fn realized_rows_filter_and_sort_by_pnl() {
    let conn = setup();
    add(&conn, "WIN", Side::Buy, dec!(10), dec!(10), 1);
    add(&conn, "WIN", Side::Sell, dec!(5), dec!(20), 2);
    add(&conn, "LOSS", Side::Buy, dec!(10), dec!(10), 1);
    add(&conn, "LOSS", Side::Sell, dec!(5), dec!(8), 3);
    add(&conn, "WIN", Side::Sell, dec!(5), dec!(11), 4);

    let by_pnl = realized_rows(&conn, &["--sort", "pnl"]);
    let pnl: Vec<Decimal> = by_pnl.iter().map(|r| r.profit_loss).collect();
    assert_eq!(pnl, vec![dec!(50), dec!(5), dec!(-10)]);

    let by_date_asc = realized_rows(&conn, &["--asc"]);
    let syms: Vec<&str> = by_date_asc.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(syms, ["WIN", "LOSS", "WIN"]);

    let only_win = realized_rows(&conn, &["--symbol", "wi"]);
    assert_eq!(only_win.len(), 2);
    assert!(only_win.iter().all(|r| r.symbol == "WIN"));
}

#[test]
fn doctor_flags_oversold_unpriced_and_missing_feed() {
    let conn = setup();
    add(&conn, "OVR", Side::Buy, dec!(2), dec!(10), 1);
    add(&conn, "OVR", Side::Sell, dec!(3), dec!(12), 2);
    add(&conn, "HELD", Side::Buy, dec!(1), dec!(10), 1);

    let issues = doctor::diagnose(&conn).unwrap();
    let codes: Vec<&str> = issues.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(codes, ["oversold", "missing_price", "no_feed"]);
    assert!(issues[0].1.contains("exceeds held lots by 1"));
    assert!(issues[1].1.starts_with("HELD"));
}
