//! Weighted symbol sampling

use std::sync::Arc;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::error::{ReelError, ReelResult};
use crate::grid::ROWS;
use crate::symbols::{SymbolId, SymbolTable};

/// Draws symbol ids proportionally to their table weight
pub struct WeightedSampler {
    table: Arc<SymbolTable>,
    rng: ChaCha8Rng,
}

impl WeightedSampler {
    /// Create a sampler; a seed makes the draw sequence reproducible
    pub fn new(table: Arc<SymbolTable>, seed: Option<u64>) -> ReelResult<Self> {
        if table.is_empty() {
            return Err(ReelError::config("cannot sample from an empty symbol table"));
        }
        if table.total_weight() <= 0.0 {
            return Err(ReelError::config(format!(
                "cannot sample with total weight {}",
                table.total_weight()
            )));
        }

        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_os_rng(),
        };

        Ok(Self { table, rng })
    }

    /// Draw one symbol
    pub fn sample(&mut self) -> SymbolId {
        let r = self.rng.random_range(0.0..self.table.total_weight());
        Self::pick(&self.table, r)
    }

    /// Draw one full reel column, top row first
    pub fn sample_column(&mut self) -> [SymbolId; ROWS] {
        std::array::from_fn(|_| self.sample())
    }

    /// Map a point in `[0, total_weight)` onto the table.
    ///
    /// Walks the cumulative weights in table order and returns the first
    /// symbol whose running total reaches `r`. Zero-weight symbols are skipped
    /// on purpose, including at `r == 0.0` where the bare walk would return a
    /// leading zero-weight entry: a symbol with no weight never lands. If
    /// rounding leaves `r` beyond the last running total, the last symbol in
    /// the table is returned.
    pub fn pick(table: &SymbolTable, r: f64) -> SymbolId {
        let mut cumulative = 0.0;
        for symbol in table.symbols() {
            if symbol.weight <= 0.0 {
                continue;
            }
            cumulative += symbol.weight;
            if cumulative >= r {
                return symbol.id;
            }
        }

        // Table is non-empty by construction
        table
            .symbols()
            .last()
            .map(|s| s.id)
            .unwrap_or(SymbolId(0))
    }

    pub fn table(&self) -> &Arc<SymbolTable> {
        &self.table
    }
}
