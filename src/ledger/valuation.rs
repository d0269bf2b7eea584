// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;

use super::positions::{OpenPosition, Positions};
use crate::models::PriceMap;

/// One row of the holdings table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingView {
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_price: Decimal,
    pub current_price: Decimal,
    pub market_value: Decimal,
    pub total_cost: Decimal,
    pub unrealized_pnl: Decimal,
    pub pnl_percentage: Decimal,
}

/// Portfolio-level sums. Only symbols that have a quote contribute; an
/// unpriced holding shows up in `holdings` at zero value but not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioTotals {
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_pnl: Decimal,
    pub pnl_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performer {
    pub symbol: String,
    pub pnl_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    pub holdings: Vec<HoldingView>,
    pub totals: PortfolioTotals,
    pub best: Option<Performer>,
    pub worst: Option<Performer>,
    pub all_time_profit: Decimal,
}

fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    part.checked_div(whole)?.checked_mul(Decimal::ONE_HUNDRED)
}

fn holding_view(symbol: &str, pos: &OpenPosition, prices: &PriceMap) -> Option<HoldingView> {
    let current_price = prices
        .get(symbol)
        .map(|q| q.price)
        .unwrap_or(Decimal::ZERO);
    let market_value = pos.quantity.checked_mul(current_price)?;
    let unrealized_pnl = market_value.checked_sub(pos.total_cost)?;
    Some(HoldingView {
        symbol: symbol.to_string(),
        quantity: pos.quantity,
        avg_price: pos.avg_price,
        current_price,
        market_value,
        total_cost: pos.total_cost,
        unrealized_pnl,
        pnl_percentage: percent_of(unrealized_pnl, pos.total_cost).unwrap_or(Decimal::ZERO),
    })
}

/// Holdings table: every open position, unpriced ones at zero, largest
/// market value first. A row whose value does not fit is dropped.
pub fn holdings(positions: &Positions, prices: &PriceMap) -> Vec<HoldingView> {
    let mut rows: Vec<HoldingView> = positions
        .open_positions()
        .filter_map(|(sym, pos)| {
            let view = holding_view(sym, pos, prices);
            if view.is_none() {
                tracing::warn!(symbol = sym, "market value out of range; omitted from holdings");
            }
            view
        })
        .filter(|h| h.quantity > Decimal::ZERO)
        .collect();
    rows.sort_by(|a, b| b.market_value.cmp(&a.market_value));
    rows
}

/// Summary sums over open positions that have a quote. A symbol that would
/// push any sum out of range is left out.
pub fn totals(positions: &Positions, prices: &PriceMap) -> PortfolioTotals {
    let mut t = PortfolioTotals::default();
    for (sym, pos) in positions.open_positions() {
        let Some(quote) = prices.get(sym) else {
            continue;
        };
        let next = pos.quantity.checked_mul(quote.price).and_then(|value| {
            Some((
                t.total_value.checked_add(value)?,
                t.total_cost.checked_add(pos.total_cost)?,
                t.total_pnl.checked_add(value.checked_sub(pos.total_cost)?)?,
            ))
        });
        match next {
            Some((value, cost, pnl)) => {
                t.total_value = value;
                t.total_cost = cost;
                t.total_pnl = pnl;
            }
            None => tracing::warn!(symbol = sym, "value out of range; excluded from totals"),
        }
    }
    t.pnl_percentage = if t.total_cost > Decimal::ZERO {
        percent_of(t.total_pnl, t.total_cost).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };
    t
}

/// Best and worst open positions by `(current − avg) / avg`.
///
/// An unpriced symbol ranks at −100 %. Percentages that cannot be computed
/// are left out. `worst` is `None` unless at least two symbols qualify.
pub fn performers(positions: &Positions, prices: &PriceMap) -> (Option<Performer>, Option<Performer>) {
    let mut ranked: Vec<Performer> = positions
        .open_positions()
        .filter_map(|(sym, pos)| {
            let current = prices.get(sym).map(|q| q.price).unwrap_or(Decimal::ZERO);
            let pct = percent_of(current.checked_sub(pos.avg_price)?, pos.avg_price)?;
            Some(Performer {
                symbol: sym.to_string(),
                pnl_percentage: pct,
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.pnl_percentage.cmp(&a.pnl_percentage));

    let worst = if ranked.len() > 1 { ranked.pop() } else { None };
    let best = ranked.into_iter().next();
    (best, worst)
}

/// Full portfolio view from a positions snapshot and a price snapshot.
pub fn valuate(positions: &Positions, prices: &PriceMap) -> Valuation {
    let (best, worst) = performers(positions, prices);
    Valuation {
        holdings: holdings(positions, prices),
        totals: totals(positions, prices),
        best,
        worst,
        all_time_profit: positions.all_time_profit(),
    }
}
