// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static SYMBOL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z0-9][A-Z0-9.\-]*$").expect("symbol pattern is valid")
});

/// Rejections raised at the ingestion boundary, before a trade reaches the ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    #[error("Symbol must not be empty")]
    EmptySymbol,
    #[error("Invalid symbol '{0}'")]
    InvalidSymbol(String),
    #[error("Quantity must be greater than zero (got {0})")]
    NonPositiveQuantity(Decimal),
    #[error("Price must be greater than zero (got {0})")]
    NonPositivePrice(Decimal),
    #[error("Fee must not be negative (got {0})")]
    NegativeFee(Decimal),
    #[error("Trade value {0} x {1} is too large")]
    ValueOverflow(Decimal, Decimal),
    #[error("Unknown trade side '{0}' (expected buy or sell)")]
    UnknownSide(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(TradeError::UnknownSide(other.to_string())),
        }
    }
}

/// Trims and uppercases a ticker, rejecting anything that is not a plain symbol.
pub fn normalize_symbol(raw: &str) -> Result<String, TradeError> {
    let sym = raw.trim().to_uppercase();
    if sym.is_empty() {
        return Err(TradeError::EmptySymbol);
    }
    if !SYMBOL_RE.is_match(&sym) {
        return Err(TradeError::InvalidSymbol(sym));
    }
    Ok(sym)
}

/// A recorded trade. Immutable once stored; removed only by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fee: Decimal,
    pub date: DateTime<Utc>,
}

impl Transaction {
    /// Re-checks the invariants `NewTrade::validate` enforces and returns the
    /// canonical symbol. Rows loaded from storage or built by hand go through
    /// this before the ledger uses them.
    pub fn check(&self) -> Result<String, TradeError> {
        let symbol = normalize_symbol(&self.symbol)?;
        check_amounts(self.quantity, self.price, self.fee)?;
        Ok(symbol)
    }
}

fn check_amounts(quantity: Decimal, price: Decimal, fee: Decimal) -> Result<(), TradeError> {
    if quantity <= Decimal::ZERO {
        return Err(TradeError::NonPositiveQuantity(quantity));
    }
    if price <= Decimal::ZERO {
        return Err(TradeError::NonPositivePrice(price));
    }
    if fee < Decimal::ZERO {
        return Err(TradeError::NegativeFee(fee));
    }
    if quantity
        .checked_mul(price)
        .and_then(|v| v.checked_add(fee))
        .is_none()
    {
        return Err(TradeError::ValueOverflow(quantity, price));
    }
    Ok(())
}

/// A trade as entered by the user, not yet assigned an id.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fee: Decimal,
    pub date: DateTime<Utc>,
}

impl NewTrade {
    pub fn validate(mut self) -> Result<Self, TradeError> {
        self.symbol = normalize_symbol(&self.symbol)?;
        check_amounts(self.quantity, self.price, self.fee)?;
        Ok(self)
    }
}

/// Latest quote for one symbol as published by the price feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: Decimal,
    pub open: Decimal,
    pub volume: u64,
    pub change: Decimal,
}

impl PriceQuote {
    pub fn new(close: Decimal, open: Decimal, volume: u64) -> Self {
        let change = if open.is_zero() {
            Decimal::ZERO
        } else {
            close
                .checked_sub(open)
                .and_then(|d| d.checked_div(open))
                .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
                .unwrap_or(Decimal::ZERO)
        };
        Self {
            price: close,
            open,
            volume,
            change,
        }
    }
}

/// Uppercase symbol to quote.
pub type PriceMap = BTreeMap<String, PriceQuote>;
