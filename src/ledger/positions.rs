// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::matcher::{Lot, match_lots};
use crate::models::{Side, Transaction};

/// Profit or loss locked in by one sell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealizedPnl {
    pub trade_id: i64,
    pub date: DateTime<Utc>,
    pub symbol: String,
    /// The sell's full quantity.
    pub quantity: Decimal,
    /// Portion of `quantity` covered by buy lots.
    pub matched_quantity: Decimal,
    /// Average cost per unit of the lots consumed by this sell.
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub profit_loss: Decimal,
}

impl RealizedPnl {
    pub fn unmatched_quantity(&self) -> Decimal {
        self.quantity - self.matched_quantity
    }
}

/// Quantity still held for a symbol after FIFO matching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenPosition {
    pub quantity: Decimal,
    pub avg_price: Decimal,
    pub total_cost: Decimal,
}

/// Everything derived from one symbol's trade history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolBook {
    pub symbol: String,
    pub open: Option<OpenPosition>,
    pub realized: Vec<RealizedPnl>,
}

/// Per-symbol books keyed by symbol, in symbol order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Positions {
    books: BTreeMap<String, SymbolBook>,
}

impl Positions {
    pub fn get(&self, symbol: &str) -> Option<&SymbolBook> {
        self.books.get(symbol)
    }

    pub fn books(&self) -> impl Iterator<Item = &SymbolBook> {
        self.books.values()
    }

    pub fn open_positions(&self) -> impl Iterator<Item = (&str, &OpenPosition)> {
        self.books
            .values()
            .filter_map(|b| b.open.as_ref().map(|o| (b.symbol.as_str(), o)))
    }

    /// Every realized record, grouped by symbol and in sell order within each.
    pub fn realized(&self) -> impl Iterator<Item = &RealizedPnl> {
        self.books.values().flat_map(|b| b.realized.iter())
    }

    /// Sum of every realized P/L. A symbol whose profit would push the sum
    /// past `Decimal`'s range is left out with a warning.
    pub fn all_time_profit(&self) -> Decimal {
        self.books.values().fold(Decimal::ZERO, |acc, book| {
            let total = book
                .realized
                .iter()
                .try_fold(acc, |sum, r| sum.checked_add(r.profit_loss));
            total.unwrap_or_else(|| {
                tracing::warn!(symbol = %book.symbol, "realized profit out of range; excluded from total");
                acc
            })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// Folds a trade log into FIFO-derived books, one per symbol.
///
/// Malformed records are skipped with a warning so one bad row cannot hide
/// the rest of the portfolio, and so is any symbol whose figures overflow.
/// Symbols are grouped by their canonical uppercase form. The input is never
/// modified.
pub fn aggregate(trades: &[Transaction]) -> Positions {
    let mut by_symbol: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for t in trades {
        match t.check() {
            Ok(symbol) => by_symbol.entry(symbol).or_default().push(t),
            Err(err) => tracing::warn!(trade_id = t.id, %err, "skipping malformed trade"),
        }
    }

    let books = by_symbol
        .into_iter()
        .filter_map(|(symbol, history)| match book_for_symbol(&symbol, &history) {
            Some(book) => Some((symbol, book)),
            None => {
                tracing::warn!(%symbol, "position figures out of range; skipping symbol");
                None
            }
        })
        .collect();

    Positions { books }
}

fn book_for_symbol(symbol: &str, history: &[&Transaction]) -> Option<SymbolBook> {
    let mut buys: Vec<&Transaction> = history
        .iter()
        .copied()
        .filter(|t| t.side == Side::Buy)
        .collect();
    let mut sells: Vec<&Transaction> = history
        .iter()
        .copied()
        .filter(|t| t.side == Side::Sell)
        .collect();
    // stable: same-date trades keep log order
    buys.sort_by_key(|t| t.date);
    sells.sort_by_key(|t| t.date);

    let mut lots: Vec<Lot> = buys.iter().map(|t| Lot::from_buy(t)).collect();
    let matches = match_lots(&mut lots, &sells);

    let mut realized = Vec::with_capacity(sells.len());
    for (sell, m) in sells.iter().zip(&matches) {
        let matched = m.matched();
        let cost = m.cost(&lots)?;
        if !m.unmatched.is_zero() {
            tracing::warn!(
                symbol,
                trade_id = sell.id,
                unmatched = %m.unmatched,
                "sell exceeds available lots; excess left unmatched"
            );
        }
        realized.push(RealizedPnl {
            trade_id: sell.id,
            date: sell.date,
            symbol: symbol.to_string(),
            quantity: sell.quantity,
            matched_quantity: matched,
            buy_price: cost.checked_div(matched).unwrap_or(Decimal::ZERO),
            sell_price: sell.price,
            profit_loss: sell.price.checked_mul(matched)?.checked_sub(cost)?,
        });
    }

    let (quantity, total_cost) = lots
        .iter()
        .filter(|l| l.remaining > Decimal::ZERO)
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(q, c), l| {
            Some((
                q.checked_add(l.remaining)?,
                c.checked_add(l.remaining.checked_mul(l.price)?)?,
            ))
        })?;

    let open = if quantity > Decimal::ZERO {
        Some(OpenPosition {
            quantity,
            avg_price: total_cost.checked_div(quantity)?,
            total_cost,
        })
    } else {
        None
    };

    tracing::debug!(symbol, lots = lots.len(), sells = sells.len(), "aggregated symbol");

    Some(SymbolBook {
        symbol: symbol.to_string(),
        open,
        realized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn trade(id: i64, sym: &str, side: Side, qty: Decimal, price: Decimal, day: u32) -> Transaction {
        Transaction {
            id,
            symbol: sym.into(),
            side,
            quantity: qty,
            price,
            fee: Decimal::ZERO,
            date: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        }
    }

    fn p1_log() -> Vec<Transaction> {
        // deliberately out of date order
        vec![
            trade(3, "ABC", Side::Sell, dec!(7), dec!(20), 3),
            trade(2, "ABC", Side::Buy, dec!(5), dec!(12), 2),
            trade(1, "ABC", Side::Buy, dec!(5), dec!(10), 1),
        ]
    }

    #[test]
    fn realized_profit_uses_oldest_lots_first() {
        let positions = aggregate(&p1_log());
        let book = positions.get("ABC").unwrap();
        assert_eq!(book.realized.len(), 1);
        let r = &book.realized[0];
        assert_eq!(r.quantity, dec!(7));
        assert_eq!(r.matched_quantity, dec!(7));
        assert_eq!(r.sell_price, dec!(20));
        assert_eq!(r.profit_loss, dec!(66));
        assert_eq!(r.buy_price * dec!(7), dec!(74));
    }

    #[test]
    fn remaining_position_after_partial_sell() {
        let positions = aggregate(&p1_log());
        let open = positions.get("ABC").unwrap().open.clone().unwrap();
        assert_eq!(open.quantity, dec!(3));
        assert_eq!(open.avg_price, dec!(12));
        assert_eq!(open.total_cost, dec!(36));
    }

    #[test]
    fn aggregating_twice_is_identical_and_leaves_input_untouched() {
        let log = p1_log();
        let before = log.clone();
        let a = aggregate(&log);
        let b = aggregate(&log);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        assert_eq!(log, before);
    }

    #[test]
    fn fully_sold_symbol_has_no_open_position_but_keeps_records() {
        let log = vec![
            trade(1, "XYZ", Side::Buy, dec!(10), dec!(100), 1),
            trade(2, "XYZ", Side::Sell, dec!(4), dec!(90), 2),
            trade(3, "XYZ", Side::Sell, dec!(6), dec!(110), 3),
        ];
        let positions = aggregate(&log);
        let book = positions.get("XYZ").unwrap();
        assert!(book.open.is_none());
        assert_eq!(book.realized.len(), 2);
        assert_eq!(positions.open_positions().count(), 0);
        assert_eq!(positions.all_time_profit(), dec!(20));
    }

    #[test]
    fn same_date_buys_keep_log_order() {
        let log = vec![
            trade(1, "TIE", Side::Buy, dec!(1), dec!(10), 5),
            trade(2, "TIE", Side::Buy, dec!(1), dec!(30), 5),
            trade(3, "TIE", Side::Sell, dec!(1), dec!(20), 6),
        ];
        let positions = aggregate(&log);
        let book = positions.get("TIE").unwrap();
        assert_eq!(book.realized[0].profit_loss, dec!(10));
        assert_eq!(book.open.as_ref().unwrap().avg_price, dec!(30));
    }

    #[test]
    fn oversold_sell_only_books_matched_quantity() {
        let log = vec![
            trade(1, "OVR", Side::Buy, dec!(3), dec!(10), 1),
            trade(2, "OVR", Side::Sell, dec!(5), dec!(12), 2),
        ];
        let positions = aggregate(&log);
        let r = &positions.get("OVR").unwrap().realized[0];
        assert_eq!(r.quantity, dec!(5));
        assert_eq!(r.matched_quantity, dec!(3));
        assert_eq!(r.unmatched_quantity(), dec!(2));
        assert_eq!(r.buy_price, dec!(10));
        assert_eq!(r.profit_loss, dec!(6));
        assert!(positions.get("OVR").unwrap().open.is_none());
    }

    #[test]
    fn malformed_rows_are_skipped_without_affecting_others() {
        let mut bad = trade(9, "BAD", Side::Buy, dec!(1), dec!(1), 1);
        bad.quantity = dec!(-1);
        let mut blank = trade(10, "", Side::Buy, dec!(1), dec!(1), 1);
        blank.symbol = "  ".into();
        let mut log = p1_log();
        log.push(bad);
        log.push(blank);
        let positions = aggregate(&log);
        assert!(positions.get("BAD").is_none());
        assert_eq!(positions.books().count(), 1);
        assert_eq!(positions.all_time_profit(), dec!(66));
    }

    #[test]
    fn symbol_whose_open_cost_overflows_is_skipped_alone() {
        let near_max = Decimal::MAX - dec!(10);
        let log = vec![
            trade(1, "OK", Side::Buy, dec!(10), dec!(5), 1),
            trade(2, "BIG", Side::Buy, dec!(1), near_max, 1),
            trade(3, "BIG", Side::Buy, dec!(1), near_max, 2),
        ];
        let positions = aggregate(&log);
        assert!(positions.get("BIG").is_none());
        let open = positions.get("OK").unwrap().open.clone().unwrap();
        assert_eq!(open.total_cost, dec!(50));
    }

    #[test]
    fn sell_whose_matched_cost_overflows_skips_only_that_symbol() {
        let near_max = Decimal::MAX - dec!(10);
        let mut log = p1_log();
        log.push(trade(4, "WIDE", Side::Buy, dec!(1), near_max, 1));
        log.push(trade(5, "WIDE", Side::Buy, dec!(1), near_max, 2));
        log.push(trade(6, "WIDE", Side::Sell, dec!(2), dec!(1), 3));
        let positions = aggregate(&log);
        assert!(positions.get("WIDE").is_none());
        assert_eq!(positions.books().count(), 1);
        assert_eq!(positions.all_time_profit(), dec!(66));
    }

    #[test]
    fn trade_whose_value_overflows_is_skipped_as_malformed() {
        let huge = Decimal::from_i128_with_scale(10_i128.pow(20), 0);
        let mut log = p1_log();
        log.push(trade(7, "HUGE", Side::Buy, huge, huge, 1));
        let positions = aggregate(&log);
        assert!(positions.get("HUGE").is_none());
        assert_eq!(positions.get("ABC").unwrap().open.as_ref().unwrap().quantity, dec!(3));
    }

    #[test]
    fn all_time_profit_leaves_out_a_symbol_that_would_overflow_the_sum() {
        let big = Decimal::MAX - dec!(10);
        let log = vec![
            trade(1, "A", Side::Buy, dec!(1), dec!(10), 1),
            trade(2, "A", Side::Sell, dec!(1), big, 2),
            trade(3, "B", Side::Buy, dec!(1), dec!(10), 1),
            trade(4, "B", Side::Sell, dec!(1), big, 2),
        ];
        let positions = aggregate(&log);
        assert_eq!(positions.books().count(), 2);
        assert_eq!(positions.all_time_profit(), big - dec!(10));
    }

    #[test]
    fn lowercase_symbols_share_one_book() {
        let log = vec![
            trade(1, "aaa", Side::Buy, dec!(2), dec!(10), 1),
            trade(2, "AAA", Side::Buy, dec!(2), dec!(20), 2),
            trade(3, " aaa ", Side::Sell, dec!(3), dec!(30), 3),
        ];
        let positions = aggregate(&log);
        assert_eq!(positions.books().count(), 1);
        let book = positions.get("AAA").unwrap();
        assert_eq!(book.realized[0].symbol, "AAA");
        assert_eq!(book.realized[0].profit_loss, dec!(50));
        assert_eq!(book.open.as_ref().unwrap().quantity, dec!(1));
    }

    #[test]
    fn fees_do_not_enter_cost_basis() {
        let mut buy = trade(1, "FEE", Side::Buy, dec!(2), dec!(50), 1);
        buy.fee = dec!(7.5);
        let positions = aggregate(&[buy]);
        let open = positions.get("FEE").unwrap().open.clone().unwrap();
        assert_eq!(open.total_cost, dec!(100));
    }
}
