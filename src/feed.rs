// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Published-spreadsheet price feed.
//!
//! The feed is CSV with a header row naming at least `symbol`, `close`,
//! `open` and `volume` in any order and any case. Numbers that are missing
//! or unparseable read as zero; rows without a symbol are dropped.

use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

use crate::models::{PriceMap, PriceQuote};

struct Columns {
    symbol: usize,
    close: Option<usize>,
    open: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let symbol = find("symbol").ok_or_else(|| anyhow!("Price feed has no 'symbol' column"))?;
        let close = find("close");
        if close.is_none() {
            tracing::warn!("price feed has no 'close' column; all prices read as 0");
        }
        Ok(Self {
            symbol,
            close,
            open: find("open"),
            volume: find("volume"),
        })
    }
}

fn field<'a>(rec: &'a csv::StringRecord, idx: Option<usize>) -> &'a str {
    idx.and_then(|i| rec.get(i)).map(str::trim).unwrap_or("")
}

fn decimal_or_zero(raw: &str) -> Decimal {
    let s = raw.trim();
    if s.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .unwrap_or(Decimal::ZERO)
}

fn volume_or_zero(raw: &str) -> u64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    cleaned
        .parse::<u64>()
        .ok()
        .or_else(|| {
            Decimal::from_str(cleaned)
                .ok()
                .and_then(|d| d.trunc().to_u64())
        })
        .unwrap_or(0)
}

/// Parses the feed body into a symbol→quote map. Later rows for the same
/// symbol replace earlier ones.
pub fn parse_price_feed(body: &str) -> Result<PriceMap> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.trim().as_bytes());
    let headers = rdr.headers().context("Read price feed header")?.clone();
    let cols = Columns::locate(&headers)?;

    let mut map = PriceMap::new();
    for (line, result) in rdr.records().enumerate() {
        let rec = match result {
            Ok(rec) => rec,
            Err(err) => {
                tracing::warn!(row = line + 2, %err, "skipping unreadable feed row");
                continue;
            }
        };
        let symbol = field(&rec, Some(cols.symbol)).to_uppercase();
        if symbol.is_empty() {
            continue;
        }
        let close = decimal_or_zero(field(&rec, cols.close));
        let open = decimal_or_zero(field(&rec, cols.open));
        let volume = volume_or_zero(field(&rec, cols.volume));
        map.insert(symbol, PriceQuote::new(close, open, volume));
    }
    tracing::debug!(symbols = map.len(), "parsed price feed");
    Ok(map)
}

/// Downloads and parses the feed at `url`.
pub fn fetch_price_feed(client: &reqwest::blocking::Client, url: &str) -> Result<PriceMap> {
    let body = client
        .get(url)
        .header("Cache-Control", "no-cache")
        .send()
        .with_context(|| format!("Fetch price feed {}", url))?
        .error_for_status()?
        .text()
        .context("Read price feed body")?;
    parse_price_feed(&body)
}
