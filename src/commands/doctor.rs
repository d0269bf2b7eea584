// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::portfolio::snapshot;
use crate::config::Settings;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

/// Issue code and detail for each problem found.
pub fn diagnose(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut issues = Vec::new();
    let (positions, prices) = snapshot(conn)?;

    // 1) sells larger than the lots available to them
    for r in positions.realized() {
        let excess = r.unmatched_quantity();
        if !excess.is_zero() {
            issues.push((
                "oversold".to_string(),
                format!(
                    "#{} {} sell of {} on {} exceeds held lots by {}",
                    r.trade_id,
                    r.symbol,
                    r.quantity,
                    r.date.format("%Y-%m-%d"),
                    excess
                ),
            ));
        }
    }

    // 2) held but unpriced
    for (sym, pos) in positions.open_positions() {
        if !prices.contains_key(sym) {
            issues.push((
                "missing_price".to_string(),
                format!("{} ({} held) has no quote", sym, pos.quantity),
            ));
        }
    }

    // 3) nothing to poll
    if Settings::load(conn)?.feed_url.is_none() {
        issues.push(("no_feed".to_string(), "feed_url is not set".to_string()));
    }

    Ok(issues)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = diagnose(conn)?;
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues.into_iter().map(|(a, b)| vec![a, b]).collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
