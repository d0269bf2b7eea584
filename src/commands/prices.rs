// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::portfolio;
use crate::config::Settings;
use crate::feed;
use crate::models::{PriceMap, PriceQuote};
use crate::store;
use crate::utils::{fmt_money, fmt_signed_pct, http_client, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("fetch", sub)) => {
            let settings = Settings::load(conn)?;
            let url = match sub.get_one::<String>("url") {
                Some(u) => u.trim().to_string(),
                None => settings.require_feed_url()?.to_string(),
            };
            let n = refresh_prices(conn, &http_client()?, &url)?;
            println!("Fetched {} prices at {}", n, Utc::now().to_rfc3339());
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("leaders", sub)) => leaders(conn, sub)?,
        Some(("poll", sub)) => poll(conn, sub.get_one::<u64>("ticks").copied())?,
        _ => {}
    }
    Ok(())
}

/// Downloads the feed and swaps it in as the stored snapshot.
pub fn refresh_prices(
    conn: &mut Connection,
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<usize> {
    let map = feed::fetch_price_feed(client, url)?;
    let n = store::replace_prices(conn, &map, Utc::now())?;
    tracing::info!(symbols = n, "price snapshot refreshed");
    Ok(n)
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteRow {
    pub symbol: String,
    #[serde(flatten)]
    pub quote: PriceQuote,
}

/// Watched symbols that have a quote, in watchlist order.
pub fn watchlist_quotes(watchlist: &[String], prices: &PriceMap) -> Vec<QuoteRow> {
    watchlist
        .iter()
        .filter_map(|sym| {
            prices.get(sym).map(|q| QuoteRow {
                symbol: sym.clone(),
                quote: q.clone(),
            })
        })
        .collect()
}

/// The `limit` quotes with the largest volume.
pub fn volume_leaders(prices: &PriceMap, limit: usize) -> Vec<QuoteRow> {
    let mut rows: Vec<QuoteRow> = prices
        .iter()
        .map(|(s, q)| QuoteRow {
            symbol: s.clone(),
            quote: q.clone(),
        })
        .collect();
    rows.sort_by(|a, b| b.quote.volume.cmp(&a.quote.volume));
    rows.truncate(limit);
    rows
}

fn quotes_table(rows: &[QuoteRow]) -> comfy_table::Table {
    let data = rows
        .iter()
        .map(|r| {
            vec![
                r.symbol.clone(),
                fmt_money(&r.quote.price),
                fmt_money(&r.quote.open),
                fmt_signed_pct(&r.quote.change),
                r.quote.volume.to_string(),
            ]
        })
        .collect();
    pretty_table(&["Symbol", "Price", "Open", "Change %", "Volume"], data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let prices = store::load_prices(conn)?;
    let rows = if sub.get_flag("watchlist") {
        watchlist_quotes(&store::watchlist(conn)?, &prices)
    } else {
        prices
            .into_iter()
            .map(|(symbol, quote)| QuoteRow { symbol, quote })
            .collect()
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        println!("{}", quotes_table(&rows));
        if let Some(at) = store::prices_fetched_at(conn)? {
            println!("As of {}", at);
        }
    }
    Ok(())
}

fn leaders(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let limit = sub.get_one::<usize>("limit").copied().unwrap_or(50);
    let rows = volume_leaders(&store::load_prices(conn)?, limit);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        println!("{}", quotes_table(&rows));
    }
    Ok(())
}

/// Refreshes on the configured interval and reprints the summary each tick.
/// A failed fetch keeps the previous snapshot.
fn poll(conn: &mut Connection, ticks: Option<u64>) -> Result<()> {
    let settings = Settings::load(conn)?;
    let url = settings.require_feed_url()?.to_string();
    let client = http_client()?;
    let mut tick = 0u64;
    loop {
        tick += 1;
        if let Err(err) = refresh_prices(conn, &client, &url) {
            let reason = format!("{:#}", err);
            tracing::warn!(%reason, "price refresh failed; keeping last snapshot");
        }
        portfolio::print_summary(&portfolio::valuation(conn)?);

        if ticks.is_some_and(|max| tick >= max) {
            break;
        }
        std::thread::sleep(settings.poll_interval());
    }
    Ok(())
}
