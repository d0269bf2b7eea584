// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;

const UA: &str = concat!("lotbook/", env!("CARGO_PKG_VERSION"));

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| {
        format!("Invalid date '{}', expected YYYY-MM-DD or RFC 3339", s)
    })?;
    day.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow!("Invalid date '{}'", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn fmt_signed_pct(d: &Decimal) -> String {
    let r = d.round_dp(2);
    if r >= Decimal::ZERO {
        format!("+{:.2}%", r)
    } else {
        format!("{:.2}%", r)
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

/// Trimmed value of a required string argument.
pub fn required_arg(m: &clap::ArgMatches, name: &str) -> Result<String> {
    m.get_one::<String>(name)
        .map(|s| s.trim().to_string())
        .with_context(|| format!("Missing required argument '{}'", name))
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_date_accepts_day_and_timestamp() {
        assert_eq!(
            parse_date(" 2025-03-04 ").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_date("2025-03-04T10:15:00+05:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 4, 5, 15, 0).unwrap()
        );
        assert!(parse_date("04/03/2025").is_err());
    }

    #[test]
    fn user_agent_names_only_the_crate() {
        assert_eq!(UA, format!("lotbook/{}", env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn signed_pct_formatting() {
        assert_eq!(fmt_signed_pct(&dec!(12.346)), "+12.35%");
        assert_eq!(fmt_signed_pct(&dec!(-3)), "-3.00%");
        assert_eq!(fmt_money(&dec!(1.005)), "1.00");
    }
}
