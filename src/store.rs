// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! SQLite reads and writes for trades, price snapshots and the watchlist.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

use crate::models::{NewTrade, PriceMap, PriceQuote, Side, Transaction, normalize_symbol};

pub fn insert_trade(conn: &Connection, trade: &NewTrade) -> Result<i64> {
    conn.execute(
        "INSERT INTO trades(date, symbol, side, quantity, price, fee)
         VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            trade.date.to_rfc3339_opts(SecondsFormat::Secs, true),
            trade.symbol,
            trade.side.as_str(),
            trade.quantity.to_string(),
            trade.price.to_string(),
            trade.fee.to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_trade(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM trades WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(anyhow!("Trade {} not found", id));
    }
    Ok(())
}

fn decode_trade(
    id: i64,
    date_s: &str,
    symbol: &str,
    side_s: &str,
    qty_s: &str,
    price_s: &str,
    fee_s: &str,
) -> Result<Transaction> {
    let date = DateTime::parse_from_rfc3339(date_s)
        .with_context(|| format!("Invalid stored date '{}'", date_s))?
        .with_timezone(&Utc);
    let side: Side = side_s.parse()?;
    let quantity = Decimal::from_str_exact(qty_s)
        .with_context(|| format!("Invalid stored quantity '{}'", qty_s))?;
    let price = Decimal::from_str_exact(price_s)
        .with_context(|| format!("Invalid stored price '{}'", price_s))?;
    let fee = Decimal::from_str_exact(fee_s)
        .with_context(|| format!("Invalid stored fee '{}'", fee_s))?;
    Ok(Transaction {
        id,
        symbol: symbol.trim().to_uppercase(),
        side,
        quantity,
        price,
        fee,
        date,
    })
}

/// Snapshot of the trade log in insertion order. Rows that no longer decode
/// are logged and left out.
pub fn load_trades(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, date, symbol, side, quantity, price, fee FROM trades ORDER BY id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
        ))
    })?;

    let mut trades = Vec::new();
    for row in rows {
        let (id, date_s, symbol, side_s, qty_s, price_s, fee_s) = row?;
        match decode_trade(id, &date_s, &symbol, &side_s, &qty_s, &price_s, &fee_s) {
            Ok(t) => trades.push(t),
            Err(err) => {
                let reason = format!("{:#}", err);
                tracing::warn!(trade_id = id, %reason, "skipping unreadable trade row");
            }
        }
    }
    Ok(trades)
}

/// Replaces the stored quote snapshot with `prices` in one transaction.
pub fn replace_prices(conn: &mut Connection, prices: &PriceMap, as_of: DateTime<Utc>) -> Result<usize> {
    let stamp = as_of.to_rfc3339_opts(SecondsFormat::Secs, true);
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM prices", [])?;
    {
        let mut insert = tx.prepare_cached(
            "INSERT INTO prices(symbol, price, open, volume, change, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (symbol, q) in prices {
            insert.execute(params![
                symbol,
                q.price.to_string(),
                q.open.to_string(),
                i64::try_from(q.volume).unwrap_or(i64::MAX),
                q.change.to_string(),
                &stamp
            ])?;
        }
    }
    tx.commit()?;
    Ok(prices.len())
}

pub fn load_prices(conn: &Connection) -> Result<PriceMap> {
    let mut stmt =
        conn.prepare_cached("SELECT symbol, price, open, volume, change FROM prices")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, i64>(3)?,
            r.get::<_, String>(4)?,
        ))
    })?;
    let mut map = PriceMap::new();
    for row in rows {
        let (symbol, price_s, open_s, volume, change_s) = row?;
        let parsed = (
            Decimal::from_str_exact(&price_s),
            Decimal::from_str_exact(&open_s),
            Decimal::from_str_exact(&change_s),
        );
        let (Ok(price), Ok(open), Ok(change)) = parsed else {
            tracing::warn!(%symbol, "skipping unreadable stored quote");
            continue;
        };
        map.insert(
            symbol,
            PriceQuote {
                price,
                open,
                volume: u64::try_from(volume).unwrap_or(0),
                change,
            },
        );
    }
    Ok(map)
}

/// Last successful fetch time, if any.
pub fn prices_fetched_at(conn: &Connection) -> Result<Option<String>> {
    let v: Option<String> = conn.query_row("SELECT MAX(fetched_at) FROM prices", [], |r| r.get(0))?;
    Ok(v)
}

pub fn watchlist(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached("SELECT symbol FROM watchlist ORDER BY id")?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Returns false when the symbol was already watched.
pub fn watch(conn: &Connection, symbol: &str) -> Result<bool> {
    let sym = normalize_symbol(symbol)?;
    let n = conn.execute(
        "INSERT OR IGNORE INTO watchlist(symbol) VALUES (?1)",
        params![sym],
    )?;
    Ok(n > 0)
}

/// Returns false when the symbol was not watched.
pub fn unwatch(conn: &Connection, symbol: &str) -> Result<bool> {
    let sym = normalize_symbol(symbol)?;
    let n = conn.execute("DELETE FROM watchlist WHERE symbol=?1", params![sym])?;
    Ok(n > 0)
}

/// Adds the symbol if absent, removes it otherwise. Returns whether it is
/// watched afterwards.
pub fn toggle_watch(conn: &Connection, symbol: &str) -> Result<bool> {
    if unwatch(conn, symbol)? {
        Ok(false)
    } else {
        watch(conn, symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn
    }

    fn buy(symbol: &str) -> NewTrade {
        NewTrade {
            symbol: symbol.into(),
            side: Side::Buy,
            quantity: dec!(1.5),
            price: dec!(10.25),
            fee: dec!(0.1),
            date: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn trades_round_trip_through_sqlite() {
        let c = conn();
        let id = insert_trade(&c, &buy("ABC")).unwrap();
        let trades = load_trades(&c).unwrap();
        assert_eq!(trades.len(), 1);
        let t = &trades[0];
        assert_eq!(t.id, id);
        assert_eq!(t.quantity, dec!(1.5));
        assert_eq!(t.fee, dec!(0.1));
        assert_eq!(t.date, Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap());
    }

    #[test]
    fn corrupt_rows_are_skipped() {
        let c = conn();
        insert_trade(&c, &buy("ABC")).unwrap();
        c.execute(
            "INSERT INTO trades(date, symbol, side, quantity, price, fee)
             VALUES ('yesterday','XYZ','buy','1','1','0')",
            [],
        )
        .unwrap();
        let trades = load_trades(&c).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "ABC");
    }

    #[test]
    fn delete_missing_trade_errors() {
        let c = conn();
        let err = delete_trade(&c, 42).unwrap_err();
        assert!(err.to_string().contains("Trade 42 not found"));
    }

    #[test]
    fn price_snapshot_is_replaced() {
        let mut c = conn();
        let now = Utc::now();
        let first = PriceMap::from([
            ("AAA".to_string(), PriceQuote::new(dec!(1), dec!(1), 10)),
            ("BBB".to_string(), PriceQuote::new(dec!(2), dec!(1), 20)),
        ]);
        replace_prices(&mut c, &first, now).unwrap();
        let second = PriceMap::from([("AAA".to_string(), PriceQuote::new(dec!(3), dec!(2), 5))]);
        replace_prices(&mut c, &second, now).unwrap();
        let loaded = load_prices(&c).unwrap();
        assert_eq!(loaded, second);
        assert!(prices_fetched_at(&c).unwrap().is_some());
    }

    #[test]
    fn watchlist_toggle_and_order() {
        let c = conn();
        assert!(watch(&c, "bbb").unwrap());
        assert!(!watch(&c, "BBB").unwrap());
        assert!(toggle_watch(&c, "aaa").unwrap());
        assert_eq!(watchlist(&c).unwrap(), vec!["BBB", "AAA"]);
        assert!(!toggle_watch(&c, "bbb").unwrap());
        assert_eq!(watchlist(&c).unwrap(), vec!["AAA"]);
    }
}
