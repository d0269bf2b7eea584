// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! FIFO lot matching for a single symbol.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::Transaction;

/// A buy trade's quantity still available to later sells.
///
/// Lots live in an arena owned by one aggregation call and are dropped with
/// it; they never alias the stored transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub trade_id: i64,
    pub date: DateTime<Utc>,
    pub price: Decimal,
    pub quantity: Decimal,
    pub remaining: Decimal,
}

impl Lot {
    pub fn from_buy(trade: &Transaction) -> Self {
        Self {
            trade_id: trade.id,
            date: trade.date,
            price: trade.price,
            quantity: trade.quantity,
            remaining: trade.quantity,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining <= Decimal::ZERO
    }
}

/// Quantity taken from the lot at `lot` (an index into the arena).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub lot: usize,
    pub quantity: Decimal,
}

/// How one sell was covered.
#[derive(Debug, Clone, PartialEq)]
pub struct SellMatch {
    pub fills: Vec<Fill>,
    /// Sell quantity left over once every lot was exhausted.
    pub unmatched: Decimal,
}

impl SellMatch {
    pub fn matched(&self) -> Decimal {
        self.fills.iter().map(|f| f.quantity).sum()
    }

    /// Σ fill quantity × lot price, or `None` if the sum does not fit a `Decimal`.
    pub fn cost(&self, lots: &[Lot]) -> Option<Decimal> {
        self.fills.iter().try_fold(Decimal::ZERO, |acc, f| {
            acc.checked_add(f.quantity.checked_mul(lots[f.lot].price)?)
        })
    }
}

/// Consumes `lots` oldest-first for each sell in order.
///
/// Both slices must already be sorted ascending by date. The cursor only moves
/// forward, so the whole sweep is linear in buys plus sells. Quantity that
/// cannot be covered is reported as `unmatched` rather than driving any lot
/// negative.
pub fn match_lots(lots: &mut [Lot], sells: &[&Transaction]) -> Vec<SellMatch> {
    let mut cursor = 0usize;
    let mut out = Vec::with_capacity(sells.len());

    for sell in sells {
        let mut to_sell = sell.quantity;
        let mut fills = Vec::new();

        while to_sell > Decimal::ZERO && cursor < lots.len() {
            let lot = &mut lots[cursor];
            if lot.remaining > Decimal::ZERO {
                let take = lot.remaining.min(to_sell);
                lot.remaining -= take;
                to_sell -= take;
                fills.push(Fill {
                    lot: cursor,
                    quantity: take,
                });
            }
            if lot.is_exhausted() {
                cursor += 1;
            }
        }

        out.push(SellMatch {
            fills,
            unmatched: to_sell.max(Decimal::ZERO),
        });
    }

    out
}
