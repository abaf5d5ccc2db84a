//! Payout calculation

use serde::{Deserialize, Serialize};

use crate::evaluator::Evaluation;
use crate::symbols::{SymbolDefinition, SymbolId};

/// A paid line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineWin {
    /// Payline index
    pub payline_index: usize,
    /// Number of matching symbols
    pub match_count: usize,
    /// Symbol the line paid as
    pub symbol_id: SymbolId,
    /// value × count × bet
    pub payout: f64,
}

/// Payout for a whole spin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpinPayout {
    pub line_wins: Vec<LineWin>,
    pub total: f64,
}

impl SpinPayout {
    pub fn is_win(&self) -> bool {
        self.total > 0.0
    }

    /// Win as a multiple of the bet
    pub fn win_ratio(&self, bet: f64) -> f64 {
        if bet > 0.0 { self.total / bet } else { 0.0 }
    }
}

/// Turns matches into amounts. No cap is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinCalculator;

impl WinCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Pay for one line
    pub fn payout(match_count: usize, symbol: &SymbolDefinition, bet: f64) -> f64 {
        symbol.value * match_count as f64 * bet
    }

    /// Pay every winning line and sum them
    pub fn calculate(&self, evaluation: &Evaluation, bet: f64) -> SpinPayout {
        let line_wins: Vec<LineWin> = evaluation
            .wins
            .iter()
            .map(|m| LineWin {
                payline_index: m.payline_index,
                match_count: m.consecutive,
                symbol_id: m.target.id,
                payout: Self::payout(m.consecutive, &m.target, bet),
            })
            .collect();
        let total = line_wins.iter().map(|w| w.payout).sum();

        SpinPayout { line_wins, total }
    }
}
