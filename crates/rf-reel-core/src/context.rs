//! Session-scoped shared state

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::SlotConfig;
use crate::error::ReelResult;
use crate::events::{NullObserver, SlotObserver};
use crate::grid::ReelGrid;
use crate::paylines::PaylineTable;
use crate::sampler::WeightedSampler;
use crate::symbols::SymbolTable;

/// Everything a session's components share. Created once per session and
/// handed to each component; there are no globals.
pub struct SlotContext {
    pub config: SlotConfig,
    pub symbols: Arc<SymbolTable>,
    pub paylines: Arc<PaylineTable>,
    pub sampler: Mutex<WeightedSampler>,
    /// Written by reel tasks (one column each), read after the barrier
    pub grid: Mutex<ReelGrid>,
    pub observer: Arc<dyn SlotObserver>,
}

impl SlotContext {
    /// Validate the config, build the tables and fill the idle grid
    pub fn new(config: SlotConfig, observer: Arc<dyn SlotObserver>) -> ReelResult<Arc<Self>> {
        Self::with_paylines(config, PaylineTable::standard(), observer)
    }

    pub fn with_paylines(
        config: SlotConfig,
        paylines: PaylineTable,
        observer: Arc<dyn SlotObserver>,
    ) -> ReelResult<Arc<Self>> {
        config.validate()?;
        let symbols = Arc::new(config.symbol_table()?);
        let mut sampler = WeightedSampler::new(Arc::clone(&symbols), config.seed)?;
        let grid = ReelGrid::sampled(&mut sampler);

        log::info!(
            "Session '{}': {} symbols, {} paylines, seed {:?}",
            config.name,
            symbols.len(),
            paylines.len(),
            config.seed
        );

        Ok(Arc::new(Self {
            config,
            symbols,
            paylines: Arc::new(paylines),
            sampler: Mutex::new(sampler),
            grid: Mutex::new(grid),
            observer,
        }))
    }

    /// Context with no observer attached
    pub fn headless(config: SlotConfig) -> ReelResult<Arc<Self>> {
        Self::new(config, Arc::new(NullObserver))
    }

    pub fn grid_snapshot(&self) -> ReelGrid {
        self.grid.lock().clone()
    }
}

impl std::fmt::Debug for SlotContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotContext")
            .field("name", &self.config.name)
            .field("symbols", &self.symbols.len())
            .field("paylines", &self.paylines.len())
            .finish_non_exhaustive()
    }
}
