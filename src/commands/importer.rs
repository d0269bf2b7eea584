// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{NewTrade, Side};
use crate::store;
use crate::utils::{parse_date, parse_decimal, required_arg};
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("trades", sub)) => {
            let path = required_arg(sub, "path")?;
            let n = import_trades(conn, &path)?;
            println!("Imported {} trades from {}", n, path);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Reads `date,symbol,side,qty,price[,fee]` rows. Any invalid row aborts
/// the whole import.
pub fn import_trades(conn: &mut Connection, path: &str) -> Result<usize> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let tx = conn.transaction()?;
    let mut count = 0usize;
    for (idx, result) in rdr.records().enumerate() {
        let line = idx + 2;
        let rec = result.with_context(|| format!("Read CSV line {}", line))?;
        let date_raw = rec.get(0).context("date missing")?;
        let symbol = rec.get(1).context("symbol missing")?;
        let side_raw = rec.get(2).context("side missing")?;
        let qty_raw = rec.get(3).context("qty missing")?;
        let price_raw = rec.get(4).context("price missing")?;
        let fee = match rec.get(5).filter(|s| !s.is_empty()) {
            Some(raw) => parse_decimal(raw)?,
            None => Decimal::ZERO,
        };

        let trade = NewTrade {
            symbol: symbol.to_string(),
            side: side_raw
                .parse::<Side>()
                .with_context(|| format!("Line {}", line))?,
            quantity: parse_decimal(qty_raw).with_context(|| format!("Line {}", line))?,
            price: parse_decimal(price_raw).with_context(|| format!("Line {}", line))?,
            fee,
            date: parse_date(date_raw).with_context(|| format!("Line {}", line))?,
        }
        .validate()
        .with_context(|| format!("Line {}", line))?;

        store::insert_trade(&tx, &trade)?;
        count += 1;
    }
    tx.commit()?;
    tracing::info!(count, path, "trades imported");
    Ok(count)
}
