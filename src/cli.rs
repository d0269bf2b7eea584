// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn trade_entry(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(Arg::new("symbol").long("symbol").required(true))
        .arg(Arg::new("qty").long("qty").required(true))
        .arg(Arg::new("price").long("price").required(true))
        .arg(Arg::new("fee").long("fee").help("Transaction cost, default 0"))
        .arg(
            Arg::new("date")
                .long("date")
                .help("YYYY-MM-DD or RFC 3339, default now"),
        )
}

fn sort_args(cmd: Command, keys: &'static [&'static str]) -> Command {
    cmd.arg(
        Arg::new("sort")
            .long("sort")
            .value_parser(keys.to_vec())
            .default_value(keys[0]),
    )
    .arg(
        Arg::new("asc")
            .long("asc")
            .action(ArgAction::SetTrue)
            .help("Ascending order (default is descending)"),
    )
    .arg(
        Arg::new("symbol")
            .long("symbol")
            .help("Case-insensitive symbol substring filter"),
    )
}

pub fn build_cli() -> Command {
    Command::new("lotbook")
        .version(env!("CARGO_PKG_VERSION"))
        .about("FIFO portfolio tracker: trades, holdings, realized and unrealized P/L")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("trade")
                .about("Record, list and delete trades")
                .subcommand(trade_entry("buy", "Record a buy"))
                .subcommand(trade_entry("sell", "Record a sell"))
                .subcommand(json_flags(sort_args(
                    Command::new("list").about("List trades"),
                    &["date", "symbol", "side", "price", "qty"],
                )))
                .subcommand(
                    Command::new("rm").about("Delete a trade").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(json_flags(
            Command::new("holdings").about("Open positions marked to the latest prices"),
        ))
        .subcommand(json_flags(
            Command::new("summary")
                .about("Portfolio totals, best/worst performer and all-time profit"),
        ))
        .subcommand(json_flags(sort_args(
            Command::new("realized").about("Realized profit/loss per sell"),
            &["date", "symbol", "pnl"],
        )))
        .subcommand(
            Command::new("prices")
                .about("Price feed snapshot")
                .subcommand(
                    Command::new("fetch")
                        .about("Download the feed and replace the stored snapshot")
                        .arg(Arg::new("url").long("url").help("Override the configured feed")),
                )
                .subcommand(json_flags(
                    Command::new("list").about("Stored quotes").arg(
                        Arg::new("watchlist")
                            .long("watchlist")
                            .action(ArgAction::SetTrue)
                            .help("Only watched symbols"),
                    ),
                ))
                .subcommand(json_flags(
                    Command::new("leaders").about("Top quotes by volume").arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize))
                            .default_value("50"),
                    ),
                ))
                .subcommand(
                    Command::new("poll")
                        .about("Refresh prices on the configured interval")
                        .arg(
                            Arg::new("ticks")
                                .long("ticks")
                                .value_parser(value_parser!(u64))
                                .help("Stop after this many fetches"),
                        ),
                ),
        )
        .subcommand(
            Command::new("watchlist")
                .about("Symbols to keep an eye on")
                .subcommand(Command::new("add").arg(Arg::new("symbol").required(true)))
                .subcommand(Command::new("rm").arg(Arg::new("symbol").required(true)))
                .subcommand(Command::new("toggle").arg(Arg::new("symbol").required(true)))
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("import").subcommand(
                Command::new("trades")
                    .about("Import trades from CSV: date,symbol,side,qty,price[,fee]")
                    .arg(Arg::new("path").long("path").required(true)),
            ),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("trades")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .value_parser(["csv", "json"])
                            .default_value("csv"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(
            Command::new("config")
                .about("Feed and polling settings")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(Command::new("set-feed").arg(Arg::new("url").required(true)))
                .subcommand(
                    Command::new("set-interval").arg(
                        Arg::new("secs")
                            .required(true)
                            .value_parser(value_parser!(u64).range(1..)),
                    ),
                ),
        )
        .subcommand(Command::new("doctor").about("Check for oversold sells and missing prices"))
}
