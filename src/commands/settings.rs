// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{FEED_URL_KEY, POLL_INTERVAL_KEY, Settings, set_setting};
use crate::utils::{maybe_print_json, pretty_table, required_arg};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let s = Settings::load(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
                let rows = vec![
                    vec![
                        FEED_URL_KEY.to_string(),
                        s.feed_url.clone().unwrap_or_else(|| "(unset)".to_string()),
                    ],
                    vec![
                        POLL_INTERVAL_KEY.to_string(),
                        s.poll_interval_secs.to_string(),
                    ],
                ];
                println!("{}", pretty_table(&["Setting", "Value"], rows));
            }
        }
        Some(("set-feed", sub)) => {
            let url = required_arg(sub, "url")?;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow!("Feed URL must start with http:// or https://"));
            }
            set_setting(conn, FEED_URL_KEY, &url)?;
            println!("Price feed set to {}", url);
        }
        Some(("set-interval", sub)) => {
            let secs = *sub.get_one::<u64>("secs").context("Missing interval")?;
            set_setting(conn, POLL_INTERVAL_KEY, &secs.to_string())?;
            println!("Poll interval set to {}s", secs);
        }
        _ => {}
    }
    Ok(())
}
