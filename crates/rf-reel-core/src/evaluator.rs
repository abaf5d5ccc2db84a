//! Payline evaluation with wild substitution and scatter counting

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::ReelError;
use crate::grid::{REELS, ReelGrid};
use crate::paylines::{GridPosition, Payline, PaylineTable};
use crate::symbols::{SymbolDefinition, SymbolId, SymbolTable};

/// Free-spin symbol occurrences across the whole grid
pub type ScatterCounts = BTreeMap<SymbolId, u32>;

/// A winning run on one payline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Payline index
    pub payline_index: usize,
    /// Run length from the leftmost reel
    pub consecutive: usize,
    /// Symbol the run pays as (a higher-value wild can take over)
    pub target: SymbolDefinition,
    /// Run started on a wild and only continued through wilds
    pub wild_run: bool,
    /// Cells in the run
    pub positions: Vec<GridPosition>,
    /// Cells in the run holding a wild
    pub wild_positions: Vec<GridPosition>,
}

/// Output of one evaluation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    /// Winning lines in payline order
    pub wins: Vec<MatchResult>,
    /// Free-spin symbol counts
    pub scatter_counts: ScatterCounts,
    /// Lines skipped because a cell held an unknown id
    pub skipped_lines: Vec<usize>,
}

impl Evaluation {
    pub fn has_wins(&self) -> bool {
        !self.wins.is_empty()
    }

    /// Highest count among free-spin symbols
    pub fn max_scatter_count(&self) -> u32 {
        self.scatter_counts.values().copied().max().unwrap_or(0)
    }
}

/// Scans a resolved grid against every payline
#[derive(Debug, Clone)]
pub struct PaylineEvaluator {
    symbols: Arc<SymbolTable>,
    paylines: Arc<PaylineTable>,
}

impl PaylineEvaluator {
    pub fn new(symbols: Arc<SymbolTable>, paylines: Arc<PaylineTable>) -> Self {
        Self { symbols, paylines }
    }

    /// Evaluate all lines and count scatters
    pub fn evaluate(&self, grid: &ReelGrid) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for payline in self.paylines.lines() {
            match self.evaluate_line(grid, payline) {
                Ok(Some(win)) => evaluation.wins.push(win),
                Ok(None) => {}
                Err(e) => {
                    log::error!("Skipping payline {}: {}", payline.index, e);
                    evaluation.skipped_lines.push(payline.index);
                }
            }
        }

        evaluation.scatter_counts = self.count_scatters(grid);
        evaluation
    }

    /// Evaluate a single line. `Ok(None)` means no win.
    pub fn evaluate_line(
        &self,
        grid: &ReelGrid,
        payline: &Payline,
    ) -> Result<Option<MatchResult>, ReelError> {
        let line = self.resolve_line(grid, payline)?;

        if log::log_enabled!(log::Level::Trace) {
            let names: Vec<&str> = line.iter().map(|(_, s)| s.name.as_str()).collect();
            log::trace!("Payline {}: {:?}", payline.index, names);
        }

        let Some(&(first_pos, first)) = line.first() else {
            return Ok(None);
        };

        let mut target = first;
        let wild_run = first.is_wild;
        let mut positions = vec![first_pos];
        let mut wild_positions = Vec::new();
        if first.is_wild {
            wild_positions.push(first_pos);
        }

        for &(pos, current) in &line[1..] {
            let matched = if wild_run {
                current.is_wild
            } else {
                current.id == first.id || current.is_wild
            };
            if !matched {
                break;
            }

            if !wild_run && current.is_wild && current.value > target.value {
                target = current;
            }
            if current.is_wild {
                wild_positions.push(pos);
            }
            positions.push(pos);
        }

        let consecutive = positions.len();
        let required = if wild_run {
            2
        } else {
            usize::from(target.min_matches_required)
        };

        if consecutive < required {
            return Ok(None);
        }

        Ok(Some(MatchResult {
            payline_index: payline.index,
            consecutive,
            target: target.clone(),
            wild_run,
            positions,
            wild_positions,
        }))
    }

    fn resolve_line<'a>(
        &'a self,
        grid: &ReelGrid,
        payline: &Payline,
    ) -> Result<Vec<(GridPosition, &'a SymbolDefinition)>, ReelError> {
        let mut line = Vec::with_capacity(REELS);
        for &pos in &payline.positions {
            let id = grid.symbol_at(pos).ok_or_else(|| {
                ReelError::config(format!("payline {} leaves the grid", payline.index))
            })?;
            let symbol = self.symbols.get(id).ok_or(ReelError::LookupMiss {
                symbol_id: id,
                row: pos.row,
                col: pos.col,
            })?;
            line.push((pos, symbol));
        }
        Ok(line)
    }

    /// Count every free-spin symbol on the grid, per kind
    pub fn count_scatters(&self, grid: &ReelGrid) -> ScatterCounts {
        let mut counts = ScatterCounts::new();
        for (pos, id) in grid.cells() {
            match self.symbols.get(id) {
                Some(symbol) if symbol.is_free_spin => *counts.entry(id).or_insert(0) += 1,
                Some(_) => {}
                None => log::warn!(
                    "Unknown symbol {} at row {}, reel {} ignored in scatter count",
                    id,
                    pos.row,
                    pos.col
                ),
            }
        }
        counts
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    pub fn paylines(&self) -> &Arc<PaylineTable> {
        &self.paylines
    }
}
