//! The 3x5 symbol grid

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};
use crate::paylines::GridPosition;
use crate::sampler::WeightedSampler;
use crate::symbols::SymbolId;

/// Visible rows per reel
pub const ROWS: usize = 3;
/// Number of reels
pub const REELS: usize = 5;

/// One reel's visible symbols, top row first
pub type Column = [SymbolId; ROWS];

/// Grid of symbol ids, stored column-major (`columns[reel][row]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelGrid {
    columns: [Column; REELS],
}

impl ReelGrid {
    /// Fill every cell from the sampler
    pub fn sampled(sampler: &mut WeightedSampler) -> Self {
        Self {
            columns: std::array::from_fn(|_| sampler.sample_column()),
        }
    }

    /// Build from explicit columns
    pub fn from_columns(columns: [Column; REELS]) -> Self {
        Self { columns }
    }

    /// Build from rows (`rows[row][reel]`), which reads more naturally in tests
    pub fn from_rows(rows: [[SymbolId; REELS]; ROWS]) -> Self {
        Self {
            columns: std::array::from_fn(|reel| std::array::from_fn(|row| rows[row][reel])),
        }
    }

    /// Overwrite one reel with fresh draws
    pub fn populate(&mut self, reel: usize, sampler: &mut WeightedSampler) -> ReelResult<()> {
        let column = sampler.sample_column();
        self.set_column(reel, column)
    }

    /// Overwrite every reel
    pub fn populate_all(&mut self, sampler: &mut WeightedSampler) {
        for column in &mut self.columns {
            *column = sampler.sample_column();
        }
    }

    pub fn set_column(&mut self, reel: usize, column: Column) -> ReelResult<()> {
        let slot = self
            .columns
            .get_mut(reel)
            .ok_or_else(|| ReelError::invalid(format!("reel {reel} out of range")))?;
        *slot = column;
        Ok(())
    }

    pub fn column(&self, reel: usize) -> Option<&Column> {
        self.columns.get(reel)
    }

    pub fn columns(&self) -> &[Column; REELS] {
        &self.columns
    }

    pub fn symbol_at(&self, pos: GridPosition) -> Option<SymbolId> {
        self.columns.get(pos.col)?.get(pos.row).copied()
    }

    /// Every cell with its position, reel by reel
    pub fn cells(&self) -> impl Iterator<Item = (GridPosition, SymbolId)> + '_ {
        self.columns.iter().enumerate().flat_map(|(col, column)| {
            column
                .iter()
                .enumerate()
                .map(move |(row, &id)| (GridPosition::new(row, col), id))
        })
    }

    /// Rows as `Vec<Vec<u32>>` (row-major), for logging and JSON output
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        (0..ROWS)
            .map(|row| self.columns.iter().map(|c| c[row].get()).collect())
            .collect()
    }
}
