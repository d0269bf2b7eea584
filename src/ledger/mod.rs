// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! FIFO cost-basis engine.
//!
//! Everything here is a pure function of a trade snapshot and a price
//! snapshot: trades are matched into lots, folded into per-symbol books and
//! then marked to market. Nothing is cached between calls.

pub mod matcher;
pub mod positions;
pub mod valuation;

pub use positions::{OpenPosition, Positions, RealizedPnl, SymbolBook, aggregate};
pub use valuation::{HoldingView, Performer, PortfolioTotals, Valuation, valuate};
