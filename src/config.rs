// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Settings persisted in the `settings` table.

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::time::Duration;

pub const FEED_URL_KEY: &str = "feed_url";
pub const POLL_INTERVAL_KEY: &str = "poll_interval_secs";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", [key], |r| r.get(0))
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub feed_url: Option<String>,
    pub poll_interval_secs: u64,
}

impl Settings {
    pub fn load(conn: &Connection) -> Result<Self> {
        let feed_url = get_setting(conn, FEED_URL_KEY)?.filter(|s| !s.trim().is_empty());
        let poll_interval_secs = match get_setting(conn, POLL_INTERVAL_KEY)? {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid stored poll interval '{}'", raw))?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };
        Ok(Self {
            feed_url,
            poll_interval_secs,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn require_feed_url(&self) -> Result<&str> {
        self.feed_url
            .as_deref()
            .ok_or_else(|| anyhow!("No price feed configured; run `lotbook config set-feed <URL>`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn defaults_when_unset() {
        let s = Settings::load(&conn()).unwrap();
        assert_eq!(s.feed_url, None);
        assert_eq!(s.poll_interval_secs, 60);
        assert!(s.require_feed_url().is_err());
    }

    #[test]
    fn stored_values_override_defaults() {
        let c = conn();
        set_setting(&c, FEED_URL_KEY, "https://example.test/feed.csv").unwrap();
        set_setting(&c, POLL_INTERVAL_KEY, "15").unwrap();
        set_setting(&c, POLL_INTERVAL_KEY, "30").unwrap();
        let s = Settings::load(&c).unwrap();
        assert_eq!(s.require_feed_url().unwrap(), "https://example.test/feed.csv");
        assert_eq!(s.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn garbage_interval_is_reported() {
        let c = conn();
        set_setting(&c, POLL_INTERVAL_KEY, "soon").unwrap();
        let err = Settings::load(&c).unwrap_err();
        assert!(err.to_string().contains("Invalid stored poll interval 'soon'"));
    }
}
