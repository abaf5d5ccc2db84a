//! Payline definitions

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};
use crate::grid::{REELS, ROWS};

/// Number of lines in the standard table
pub const PAYLINE_COUNT: usize = 20;

/// A cell on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
}

impl GridPosition {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A payline: one cell per reel, left to right
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payline {
    /// Payline index (0-based)
    pub index: usize,
    /// Cells visited, reel 0 first
    pub positions: Vec<GridPosition>,
}

impl Payline {
    /// Create a line from the row it visits on each reel (e.g., [0, 1, 2, 1, 0] for a "V")
    pub fn from_rows(index: usize, rows: [usize; REELS]) -> Self {
        Self {
            index,
            positions: rows
                .iter()
                .enumerate()
                .map(|(col, &row)| GridPosition::new(row, col))
                .collect(),
        }
    }

    /// Create a straight line (same row across all reels)
    pub fn straight(index: usize, row: usize) -> Self {
        Self::from_rows(index, [row; REELS])
    }

    /// Row visited on each reel
    pub fn rows(&self) -> Vec<usize> {
        self.positions.iter().map(|p| p.row).collect()
    }

    /// True when every cell sits on one row
    pub fn is_straight(&self) -> bool {
        self.positions.windows(2).all(|w| w[0].row == w[1].row)
    }

    fn validate(&self) -> ReelResult<()> {
        if self.positions.len() != REELS {
            return Err(ReelError::config(format!(
                "payline {} has {} positions, expected {}",
                self.index,
                self.positions.len(),
                REELS
            )));
        }
        for (reel, pos) in self.positions.iter().enumerate() {
            if pos.col != reel {
                return Err(ReelError::config(format!(
                    "payline {} visits reel {} at step {}",
                    self.index, pos.col, reel
                )));
            }
            if pos.row >= ROWS {
                return Err(ReelError::config(format!(
                    "payline {} row {} out of bounds on reel {}",
                    self.index, pos.row, reel
                )));
            }
        }
        Ok(())
    }
}

/// Fixed, read-only set of paylines
#[derive(Debug, Clone, Serialize)]
pub struct PaylineTable {
    lines: Vec<Payline>,
}

impl PaylineTable {
    /// Validate and wrap a set of lines. Indexes must run 0..n in order.
    pub fn new(lines: Vec<Payline>) -> ReelResult<Self> {
        if lines.is_empty() {
            return Err(ReelError::config("payline table is empty"));
        }
        for (i, line) in lines.iter().enumerate() {
            if line.index != i {
                return Err(ReelError::config(format!(
                    "payline at slot {} carries index {}",
                    i, line.index
                )));
            }
            line.validate()?;
        }
        Ok(Self { lines })
    }

    /// The 20-line table the paired front end draws. Must not change.
    pub fn standard() -> Self {
        let lines = standard_20_rows()
            .into_iter()
            .enumerate()
            .map(|(i, rows)| Payline::from_rows(i, rows))
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[Payline] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&Payline> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for PaylineTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Row per reel for each standard line
fn standard_20_rows() -> [[usize; REELS]; PAYLINE_COUNT] {
    [
        // Straight lines
        [0, 0, 0, 0, 0], // Top
        [1, 1, 1, 1, 1], // Middle
        [2, 2, 2, 2, 2], // Bottom
        // V shapes
        [0, 1, 2, 1, 0],
        [2, 1, 0, 1, 2],
        // Zigzag
        [1, 0, 2, 0, 1],
        [1, 2, 0, 2, 1],
        [0, 0, 1, 2, 2],
        [2, 2, 1, 0, 0],
        [1, 2, 1, 0, 1],
        [1, 0, 1, 2, 1],
        [0, 2, 2, 2, 0],
        [2, 0, 0, 0, 2],
        [0, 2, 0, 2, 0],
        [2, 0, 2, 0, 2],
        [2, 2, 1, 2, 2],
        [0, 0, 1, 0, 0],
        [0, 0, 2, 0, 0],
        [2, 2, 0, 2, 2],
        // Same shape as line 11; kept for front-end index compatibility
        [0, 2, 2, 2, 0],
    ]
}
