//! Symbol definitions and the weighted symbol table

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};

/// Stable symbol identifier, compared by value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for SymbolId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

fn default_min_matches() -> u8 {
    3
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDefinition {
    /// Unique symbol ID
    pub id: SymbolId,
    /// Display name (e.g., "SEVEN", "WILD")
    pub name: String,
    /// Relative sampling weight
    pub weight: f64,
    /// Payout multiplier per matched symbol
    pub value: f64,
    /// Run length needed for a line win
    #[serde(default = "default_min_matches")]
    pub min_matches_required: u8,
    /// Substitutes for any non-wild symbol on a line
    #[serde(default)]
    pub is_wild: bool,
    /// Counted across the whole grid for the free-spin bonus
    #[serde(default, alias = "is_scatter")]
    pub is_free_spin: bool,
}

impl SymbolDefinition {
    /// Create a regular paying symbol
    pub fn regular(id: u32, name: impl Into<String>, weight: f64, value: f64) -> Self {
        Self {
            id: SymbolId(id),
            name: name.into(),
            weight,
            value,
            min_matches_required: default_min_matches(),
            is_wild: false,
            is_free_spin: false,
        }
    }

    /// Create a wild symbol
    pub fn wild(id: u32, name: impl Into<String>, weight: f64, value: f64) -> Self {
        Self {
            is_wild: true,
            ..Self::regular(id, name, weight, value)
        }
    }

    /// Create a free-spin (scatter) symbol
    pub fn free_spin(id: u32, name: impl Into<String>, weight: f64, value: f64) -> Self {
        Self {
            is_free_spin: true,
            ..Self::regular(id, name, weight, value)
        }
    }

    /// Builder: override the run length needed for a win
    pub fn with_min_matches(mut self, min_matches: u8) -> Self {
        self.min_matches_required = min_matches;
        self
    }

    fn validate(&self) -> ReelResult<()> {
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ReelError::config(format!(
                "symbol {} ({}) has invalid weight {}",
                self.id, self.name, self.weight
            )));
        }
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(ReelError::config(format!(
                "symbol {} ({}) has invalid value {}",
                self.id, self.name, self.value
            )));
        }
        if self.min_matches_required < 2 {
            return Err(ReelError::config(format!(
                "symbol {} ({}) requires {} matches, minimum is 2",
                self.id, self.name, self.min_matches_required
            )));
        }
        Ok(())
    }
}

/// Ordered symbol catalog with a cached total weight
#[derive(Debug, Clone, Serialize)]
pub struct SymbolTable {
    symbols: Vec<SymbolDefinition>,
    total_weight: f64,
}

impl SymbolTable {
    /// Build a table, rejecting anything a sampler could not draw from
    pub fn new(symbols: Vec<SymbolDefinition>) -> ReelResult<Self> {
        let mut table = Self {
            symbols,
            total_weight: 0.0,
        };
        table.recompute()?;
        Ok(table)
    }

    /// Classic fruit-machine catalog used when no symbols are configured
    pub fn classic() -> Self {
        let symbols = classic_symbols();
        let total_weight = symbols.iter().map(|s| s.weight).sum();
        Self {
            symbols,
            total_weight,
        }
    }

    /// Append a symbol; the total weight is recomputed
    pub fn push(&mut self, symbol: SymbolDefinition) -> ReelResult<()> {
        self.symbols.push(symbol);
        if let Err(e) = self.recompute() {
            self.symbols.pop();
            // Table was valid before the push
            let _ = self.recompute();
            return Err(e);
        }
        Ok(())
    }

    /// Remove a symbol by id; the total weight is recomputed
    pub fn remove(&mut self, id: SymbolId) -> ReelResult<SymbolDefinition> {
        let idx = self
            .symbols
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ReelError::config(format!("symbol {id} not in table")))?;
        let removed = self.symbols.remove(idx);
        if let Err(e) = self.recompute() {
            self.symbols.insert(idx, removed);
            let _ = self.recompute();
            return Err(e);
        }
        Ok(removed)
    }

    fn recompute(&mut self) -> ReelResult<()> {
        if self.symbols.is_empty() {
            return Err(ReelError::config("symbol table is empty"));
        }

        let mut seen = HashSet::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            symbol.validate()?;
            if !seen.insert(symbol.id) {
                return Err(ReelError::config(format!("duplicate symbol id {}", symbol.id)));
            }
        }

        let total: f64 = self.symbols.iter().map(|s| s.weight).sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(ReelError::config(format!(
                "symbol table total weight must be positive, got {total}"
            )));
        }
        self.total_weight = total;
        Ok(())
    }

    /// Get symbol by ID
    pub fn get(&self, id: SymbolId) -> Option<&SymbolDefinition> {
        self.symbols.iter().find(|s| s.id == id)
    }

    /// Get symbol by ID or fail with a configuration error
    pub fn require(&self, id: SymbolId) -> ReelResult<&SymbolDefinition> {
        self.get(id)
            .ok_or_else(|| ReelError::config(format!("sampled symbol {id} missing from table")))
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.get(id).is_some()
    }

    /// Symbols in table (sampling) order
    pub fn symbols(&self) -> &[SymbolDefinition] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Probability of drawing `id` on a single sample
    pub fn probability(&self, id: SymbolId) -> f64 {
        self.get(id)
            .map(|s| s.weight / self.total_weight)
            .unwrap_or(0.0)
    }

    pub fn wild_ids(&self) -> Vec<SymbolId> {
        self.symbols.iter().filter(|s| s.is_wild).map(|s| s.id).collect()
    }

    pub fn free_spin_ids(&self) -> Vec<SymbolId> {
        self.symbols
            .iter()
            .filter(|s| s.is_free_spin)
            .map(|s| s.id)
            .collect()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::classic()
    }
}

/// Classic catalog: seven fruits/bars, one wild, one free-spin scatter
pub fn classic_symbols() -> Vec<SymbolDefinition> {
    vec![
        SymbolDefinition::regular(1, "CHERRY", 30.0, 1.0),
        SymbolDefinition::regular(2, "LEMON", 25.0, 1.0),
        SymbolDefinition::regular(3, "ORANGE", 20.0, 2.0),
        SymbolDefinition::regular(4, "PLUM", 15.0, 2.0),
        SymbolDefinition::regular(5, "BELL", 10.0, 5.0),
        SymbolDefinition::regular(6, "BAR", 6.0, 10.0),
        // Premium symbol pays from two in a row
        SymbolDefinition::regular(7, "SEVEN", 3.0, 20.0).with_min_matches(2),
        SymbolDefinition::wild(8, "WILD", 4.0, 25.0),
        SymbolDefinition::free_spin(9, "FREE_SPIN", 4.0, 2.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_table() {
        let table = SymbolTable::classic();
        assert!(SymbolTable::new(classic_symbols()).is_ok());
        assert_eq!(table.len(), 9);
        assert_eq!(table.total_weight(), 117.0);
        assert_eq!(table.wild_ids(), vec![SymbolId(8)]);
        assert_eq!(table.free_spin_ids(), vec![SymbolId(9)]);
        assert_eq!(table.get(SymbolId(7)).map(|s| s.min_matches_required), Some(2));
    }

    #[test]
    fn test_empty_table_rejected() {
        let err = SymbolTable::new(Vec::new()).unwrap_err();
        assert!(matches!(err, ReelError::Configuration(_)));
    }

    #[test]
    fn test_zero_weight_table_rejected() {
        let symbols = vec![
            SymbolDefinition::regular(1, "A", 0.0, 1.0),
            SymbolDefinition::regular(2, "B", 0.0, 1.0),
        ];
        assert!(SymbolTable::new(symbols).is_err());
    }

    #[test]
    fn test_negative_weight_and_duplicates_rejected() {
        let negative = vec![SymbolDefinition::regular(1, "A", -1.0, 1.0)];
        assert!(SymbolTable::new(negative).is_err());

        let dup = vec![
            SymbolDefinition::regular(1, "A", 1.0, 1.0),
            SymbolDefinition::regular(1, "B", 1.0, 1.0),
        ];
        assert!(SymbolTable::new(dup).is_err());
    }

    #[test]
    fn test_min_matches_below_two_rejected() {
        let symbols = vec![SymbolDefinition::regular(1, "A", 1.0, 1.0).with_min_matches(1)];
        assert!(SymbolTable::new(symbols).is_err());
    }

    #[test]
    fn test_total_weight_recomputed() {
        let mut table =
            SymbolTable::new(vec![SymbolDefinition::regular(1, "A", 2.0, 1.0)]).unwrap();
        table.push(SymbolDefinition::regular(2, "B", 3.0, 1.0)).unwrap();
        assert_eq!(table.total_weight(), 5.0);

        // Rejected push leaves the table untouched
        assert!(table.push(SymbolDefinition::regular(2, "C", 1.0, 1.0)).is_err());
        assert_eq!(table.len(), 2);
        assert_eq!(table.total_weight(), 5.0);

        table.remove(SymbolId(1)).unwrap();
        assert_eq!(table.total_weight(), 3.0);

        // Removing the last symbol would empty the table
        assert!(table.remove(SymbolId(2)).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_symbol_serde_defaults() {
        let json = r#"{ "id": 4, "name": "PLUM", "weight": 15.0, "value": 2.0 }"#;
        let symbol: SymbolDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(symbol.min_matches_required, 3);
        assert!(!symbol.is_wild);
        assert!(!symbol.is_free_spin);

        let scatter =
            r#"{ "id": 9, "name": "FS", "weight": 1.0, "value": 0.0, "is_scatter": true }"#;
        let symbol: SymbolDefinition = serde_json::from_str(scatter).unwrap();
        assert!(symbol.is_free_spin);
    }
}
