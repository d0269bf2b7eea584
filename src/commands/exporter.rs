// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::required_arg;
use anyhow::{Context, Result, anyhow};
use chrono::SecondsFormat;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("trades", sub)) => {
            let fmt = required_arg(sub, "format")?.to_lowercase();
            let out = required_arg(sub, "out")?;
            export_trades(conn, &fmt, &out)?;
            println!("Exported trades to {}", out);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Writes the trade log in date order, in the same column layout the
/// importer reads.
pub fn export_trades(conn: &Connection, fmt: &str, out: &str) -> Result<()> {
    let mut trades = store::load_trades(conn)?;
    trades.sort_by_key(|t| t.date);

    match fmt {
        "csv" => {
            let mut wtr =
                csv::Writer::from_path(out).with_context(|| format!("Create {}", out))?;
            wtr.write_record(["date", "symbol", "side", "qty", "price", "fee"])?;
            for t in &trades {
                wtr.write_record([
                    t.date.to_rfc3339_opts(SecondsFormat::Secs, true),
                    t.symbol.clone(),
                    t.side.to_string(),
                    t.quantity.to_string(),
                    t.price.to_string(),
                    t.fee.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = trades
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id,
                        "date": t.date.to_rfc3339_opts(SecondsFormat::Secs, true),
                        "symbol": t.symbol,
                        "side": t.side,
                        "qty": t.quantity.to_string(),
                        "price": t.price.to_string(),
                        "fee": t.fee.to_string(),
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)
                .with_context(|| format!("Write {}", out))?;
        }
        other => return Err(anyhow!("Unknown format: {} (use csv|json)", other)),
    }
    tracing::info!(count = trades.len(), out, "trades exported");
    Ok(())
}
