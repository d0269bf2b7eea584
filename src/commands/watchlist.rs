// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::{maybe_print_json, pretty_table, required_arg};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let sym = required_arg(sub, "symbol")?;
            if store::watch(conn, &sym)? {
                println!("Watching {}", sym.to_uppercase());
            } else {
                println!("{} is already on the watchlist", sym.to_uppercase());
            }
        }
        Some(("rm", sub)) => {
            let sym = required_arg(sub, "symbol")?;
            if store::unwatch(conn, &sym)? {
                println!("Removed {} from the watchlist", sym.to_uppercase());
            } else {
                println!("{} was not on the watchlist", sym.to_uppercase());
            }
        }
        Some(("toggle", sub)) => {
            let sym = required_arg(sub, "symbol")?;
            let on = store::toggle_watch(conn, &sym)?;
            println!(
                "{} {}",
                sym.to_uppercase(),
                if on { "added" } else { "removed" }
            );
        }
        Some(("list", sub)) => {
            let symbols = store::watchlist(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &symbols)? {
                let rows = symbols.into_iter().map(|s| vec![s]).collect();
                println!("{}", pretty_table(&["Symbol"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
