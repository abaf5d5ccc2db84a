//! Error types for the reel core

use thiserror::Error;

use crate::symbols::SymbolId;

/// Core error type
#[derive(Error, Debug)]
pub enum ReelError {
    /// Symbol catalog, payline table or timing is unusable. Fatal, raised before any spin.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Operation rejected in the current state (spin already running, bonus not ready).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Grid cell holds an id the symbol table does not know
    #[error("Symbol {symbol_id} at row {row}, reel {col} is not in the symbol table")]
    LookupMiss {
        symbol_id: SymbolId,
        row: usize,
        col: usize,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReelError {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Shorthand for a rejected operation
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// True for errors that callers recover from as a no-op
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidOperation(_))
    }
}

/// Result type alias
pub type ReelResult<T> = Result<T, ReelError>;
