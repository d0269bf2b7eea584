// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{NewTrade, Side, Transaction};
use crate::store;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table, required_arg};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::cmp::Ordering;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("buy", sub)) => {
            record_trade(conn, sub, Side::Buy)?;
        }
        Some(("sell", sub)) => {
            record_trade(conn, sub, Side::Sell)?;
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing --id")?;
            store::delete_trade(conn, id)?;
            tracing::info!(trade_id = id, "trade deleted");
            println!("Deleted trade {}", id);
        }
        _ => {}
    }
    Ok(())
}

pub fn record_trade(conn: &Connection, sub: &clap::ArgMatches, side: Side) -> Result<i64> {
    let date = match sub.get_one::<String>("date") {
        Some(raw) => parse_date(raw)?,
        None => Utc::now(),
    };
    let fee = match sub.get_one::<String>("fee") {
        Some(raw) => parse_decimal(raw)?,
        None => Decimal::ZERO,
    };
    let trade = NewTrade {
        symbol: required_arg(sub, "symbol")?,
        side,
        quantity: parse_decimal(&required_arg(sub, "qty")?)?,
        price: parse_decimal(&required_arg(sub, "price")?)?,
        fee,
        date,
    }
    .validate()?;

    let id = store::insert_trade(conn, &trade)?;
    tracing::info!(trade_id = id, symbol = %trade.symbol, %side, "trade recorded");
    println!(
        "Recorded {} {} x {} @ {} (fee {}) as #{}",
        side, trade.quantity, trade.symbol, trade.price, trade.fee, id
    );
    Ok(id)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.date.format("%Y-%m-%d %H:%M").to_string(),
                    t.symbol.clone(),
                    t.side.to_string(),
                    t.quantity.to_string(),
                    format!("{:.2}", t.price),
                    format!("{:.2}", t.fee),
                    t.quantity
                        .checked_mul(t.price)
                        .and_then(|v| v.checked_add(t.fee))
                        .map(|v| format!("{:.2}", v))
                        .unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Symbol", "Side", "Qty", "Price", "Fee", "Total"],
                rows
            )
        );
    }
    Ok(())
}

fn compare(key: &str, a: &Transaction, b: &Transaction) -> Ordering {
    match key {
        "symbol" => a.symbol.cmp(&b.symbol),
        "side" => a.side.as_str().cmp(b.side.as_str()),
        "price" => a.price.cmp(&b.price),
        "qty" => a.quantity.cmp(&b.quantity),
        _ => a.date.cmp(&b.date),
    }
}

/// Trades filtered by `--symbol` substring and ordered by `--sort`/`--asc`.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Transaction>> {
    let needle = sub
        .get_one::<String>("symbol")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();
    let key = sub
        .get_one::<String>("sort")
        .map(String::as_str)
        .unwrap_or("date");
    let asc = sub.get_flag("asc");

    let mut trades: Vec<Transaction> = store::load_trades(conn)?
        .into_iter()
        .filter(|t| t.symbol.to_lowercase().contains(&needle))
        .collect();
    trades.sort_by(|a, b| {
        let ord = compare(key, a, b);
        if asc { ord } else { ord.reverse() }
    });
    Ok(trades)
}
