//! # rf-reel-core — Reel Resolution Core
//!
//! Resolution logic for a 5-reel, 3-row, 20-line slot machine: weighted symbol
//! sampling, timed reel spins joined by a completion barrier, payline
//! evaluation with wilds and scatters, payouts, and the free spin bonus.
//! Presentation lives elsewhere and talks to the core through [`SlotObserver`].
//!
//! ## Features
//!
//! - **Weighted Sampling**: Seedable ChaCha8 draws over a validated symbol table
//! - **Reel Coordination**: Staggered async reel tasks, interrupt, barrier
//! - **Payline Evaluation**: Left-to-right runs with wild substitution and override
//! - **Free Spins**: Award, retrigger and auto-play lifecycle
//! - **Timing Profiles**: Normal, Turbo, Instant timing modes
//!
//! ## Architecture
//!
//! ```text
//! SlotMachine
//!     │
//!     ├── SlotContext (config, SymbolTable, PaylineTable, sampler, grid, observer)
//!     ├── ReelSpinCoordinator
//!     │       ├── 5 × reel task ──► ReelGrid column
//!     │       └── SpinBarrier
//!     │             │
//!     │             v
//!     │       PaylineEvaluator → WinCalculator → ResolvedSpin
//!     │
//!     └── FreeSpinStateMachine ◄── scatter counts
//! ```

pub mod barrier;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod free_spins;
pub mod grid;
pub mod machine;
pub mod paylines;
pub mod payout;
pub mod sampler;
pub mod symbols;

pub use barrier::*;
pub use config::*;
pub use context::*;
pub use coordinator::*;
pub use error::*;
pub use evaluator::*;
pub use events::*;
pub use free_spins::*;
pub use grid::*;
pub use machine::*;
pub use paylines::*;
pub use payout::*;
pub use sampler::*;
pub use symbols::*;
