// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, HoldingView, Performer, Positions, RealizedPnl, Valuation};
use crate::models::PriceMap;
use crate::store;
use crate::utils::{fmt_money, fmt_signed_pct, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

/// Positions and prices as currently stored.
pub fn snapshot(conn: &Connection) -> Result<(Positions, PriceMap)> {
    let trades = store::load_trades(conn)?;
    let prices = store::load_prices(conn)?;
    Ok((ledger::aggregate(&trades), prices))
}

pub fn valuation(conn: &Connection) -> Result<Valuation> {
    let (positions, prices) = snapshot(conn)?;
    Ok(ledger::valuate(&positions, &prices))
}

pub fn holdings(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (positions, prices) = snapshot(conn)?;
    let rows = ledger::valuation::holdings(&positions, &prices);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        return Ok(());
    }
    println!("{}", holdings_table(&rows));
    Ok(())
}

fn holdings_table(rows: &[HoldingView]) -> comfy_table::Table {
    let data = rows
        .iter()
        .map(|h| {
            vec![
                h.symbol.clone(),
                h.quantity.to_string(),
                fmt_money(&h.avg_price),
                fmt_money(&h.current_price),
                fmt_money(&h.market_value),
                fmt_money(&h.unrealized_pnl),
                fmt_signed_pct(&h.pnl_percentage),
            ]
        })
        .collect();
    pretty_table(
        &[
            "Symbol",
            "Shares",
            "Avg Price",
            "Current",
            "Market Value",
            "Unrealized P/L",
            "Change %",
        ],
        data,
    )
}

#[derive(Debug, Serialize)]
struct SummaryOut<'a> {
    total_value: String,
    total_cost: String,
    unrealized_pnl: String,
    pnl_percentage: String,
    all_time_profit: String,
    best: Option<&'a Performer>,
    worst: Option<&'a Performer>,
}

pub fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let v = valuation(conn)?;
    if sub.get_flag("json") || sub.get_flag("jsonl") {
        let out = SummaryOut {
            total_value: v.totals.total_value.round_dp(2).to_string(),
            total_cost: v.totals.total_cost.round_dp(2).to_string(),
            unrealized_pnl: v.totals.total_pnl.round_dp(2).to_string(),
            pnl_percentage: v.totals.pnl_percentage.round_dp(2).to_string(),
            all_time_profit: v.all_time_profit.round_dp(2).to_string(),
            best: v.best.as_ref(),
            worst: v.worst.as_ref(),
        };
        maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &out)?;
        return Ok(());
    }
    print_summary(&v);
    Ok(())
}

pub fn print_summary(v: &Valuation) {
    let performer = |p: &Option<Performer>| {
        p.as_ref()
            .map(|p| format!("{} ({})", p.symbol, fmt_signed_pct(&p.pnl_percentage)))
            .unwrap_or_else(|| "-".to_string())
    };
    let rows = vec![
        vec!["Portfolio Value".to_string(), fmt_money(&v.totals.total_value)],
        vec!["Total Cost".to_string(), fmt_money(&v.totals.total_cost)],
        vec![
            "Unrealized P/L".to_string(),
            format!(
                "{} ({})",
                fmt_money(&v.totals.total_pnl),
                fmt_signed_pct(&v.totals.pnl_percentage)
            ),
        ],
        vec!["All-time Profit".to_string(), fmt_money(&v.all_time_profit)],
        vec!["Best Performer".to_string(), performer(&v.best)],
        vec!["Worst Performer".to_string(), performer(&v.worst)],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], rows));
}

/// Realized records filtered by `--symbol` substring, ordered by `--sort`.
pub fn realized_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<RealizedPnl>> {
    let (positions, _) = snapshot(conn)?;
    let needle = sub
        .get_one::<String>("symbol")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();
    let key = sub
        .get_one::<String>("sort")
        .map(String::as_str)
        .unwrap_or("date");
    let asc = sub.get_flag("asc");

    let mut rows: Vec<RealizedPnl> = positions
        .realized()
        .filter(|r| r.symbol.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    rows.sort_by(|a, b| {
        let ord = match key {
            "symbol" => a.symbol.cmp(&b.symbol),
            "pnl" => a.profit_loss.cmp(&b.profit_loss),
            _ => a.date.cmp(&b.date),
        };
        if asc { ord } else { ord.reverse() }
    });
    Ok(rows)
}

pub fn realized(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let rows = realized_rows(conn, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        return Ok(());
    }
    let data = rows
        .iter()
        .map(|r| {
            let mut qty = r.quantity.to_string();
            if r.matched_quantity < r.quantity {
                qty = format!("{} ({} unmatched)", qty, r.unmatched_quantity());
            }
            vec![
                r.date.format("%b %d, %Y").to_string(),
                r.symbol.clone(),
                qty,
                fmt_money(&r.buy_price),
                fmt_money(&r.sell_price),
                fmt_money(&r.profit_loss),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Date", "Symbol", "Quantity", "Buy Price", "Sell Price", "Profit/Loss"],
            data
        )
    );
    Ok(())
}
