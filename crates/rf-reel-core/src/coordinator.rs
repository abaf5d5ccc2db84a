//! Reel spin coordination
//!
//! A spin launches one task per reel, each started a fixed stagger after the
//! previous one. A reel rolls (cosmetic re-samples every tick) until its spin
//! duration elapses, then draws its final column and arrives at the barrier.
//! The grid is only evaluated once every reel has arrived.
//!
//! ```text
//!  reel 0  |--roll--|final|
//!  reel 1     |--roll--|final|
//!  reel 2        |--roll--|final|
//!  ...                          ▼
//!                          barrier clear → evaluate → Idle
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};

use crate::barrier::{CompletionGuard, SpinBarrier};
use crate::context::SlotContext;
use crate::error::{ReelError, ReelResult};
use crate::evaluator::{Evaluation, PaylineEvaluator};
use crate::grid::{REELS, ReelGrid};
use crate::payout::{SpinPayout, WinCalculator};

/// Coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoordinatorState {
    Idle,
    Spinning,
    Resolved,
}

/// A completed spin
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSpin {
    /// Grid the evaluation ran on
    pub grid: ReelGrid,
    pub evaluation: Evaluation,
    pub payout: SpinPayout,
    pub bet: f64,
    /// At least one reel was stopped early and kept its last rolled column
    pub interrupted: bool,
}

/// Resets the coordinator to Idle however the spin ends
struct StateReset<'a>(&'a Mutex<CoordinatorState>);

impl Drop for StateReset<'_> {
    fn drop(&mut self) {
        *self.0.lock() = CoordinatorState::Idle;
    }
}

/// Runs spins, one at a time
pub struct ReelSpinCoordinator {
    ctx: Arc<SlotContext>,
    evaluator: PaylineEvaluator,
    calculator: WinCalculator,
    state: Mutex<CoordinatorState>,
    interrupt_tx: broadcast::Sender<()>,
}

impl ReelSpinCoordinator {
    pub fn new(ctx: Arc<SlotContext>) -> Self {
        let evaluator = PaylineEvaluator::new(Arc::clone(&ctx.symbols), Arc::clone(&ctx.paylines));
        let (interrupt_tx, _) = broadcast::channel(1);
        Self {
            ctx,
            evaluator,
            calculator: WinCalculator::new(),
            state: Mutex::new(CoordinatorState::Idle),
            interrupt_tx,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        *self.state.lock()
    }

    pub fn is_idle(&self) -> bool {
        self.state() == CoordinatorState::Idle
    }

    /// Stop every rolling reel on its current column.
    /// Returns false when no spin was listening.
    pub fn interrupt(&self) -> bool {
        let delivered = self.interrupt_tx.send(()).is_ok();
        if delivered {
            log::debug!("Interrupt sent to running spin");
        }
        delivered
    }

    /// Spin, or `Ok(None)` when a spin is already running
    pub async fn spin(&self, bet: f64) -> ReelResult<Option<ResolvedSpin>> {
        match self.try_spin(bet).await {
            Ok(spin) => Ok(Some(spin)),
            Err(e) if e.is_recoverable() => {
                log::debug!("Spin request ignored: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Spin, failing with `InvalidOperation` when a spin is already running
    pub async fn try_spin(&self, bet: f64) -> ReelResult<ResolvedSpin> {
        {
            let mut state = self.state.lock();
            if *state != CoordinatorState::Idle {
                return Err(ReelError::invalid(format!("spin requested while {:?}", *state)));
            }
            *state = CoordinatorState::Spinning;
        }
        let _reset = StateReset(&self.state);

        let stagger = self.ctx.config.timing.reel_stagger();
        let barrier = Arc::new(SpinBarrier::new(REELS));
        // Subscribe every reel up front so an interrupt during the stagger reaches all of them
        let cancels: Vec<_> = (0..REELS).map(|_| self.interrupt_tx.subscribe()).collect();
        let mut stagger_cancel = self.interrupt_tx.subscribe();
        let mut stop_requested = false;
        let mut reels = JoinSet::new();

        log::debug!("Spin started, bet {}", bet);

        for (reel, cancel_rx) in cancels.into_iter().enumerate() {
            if reel > 0 && !stop_requested {
                tokio::select! {
                    biased;
                    _ = stagger_cancel.recv() => stop_requested = true,
                    _ = time::sleep(stagger) => {}
                }
            }
            let guard = CompletionGuard::new(Arc::clone(&barrier), reel);
            reels.spawn(run_reel(reel, Arc::clone(&self.ctx), cancel_rx, guard));
        }

        barrier.wait().await;

        let mut interrupted = false;
        while let Some(result) = reels.join_next().await {
            match result {
                Ok(stopped_early) => interrupted |= stopped_early,
                Err(e) => {
                    log::error!("Reel task failed: {}", e);
                    interrupted = true;
                }
            }
        }

        *self.state.lock() = CoordinatorState::Resolved;
        let grid = self.ctx.grid_snapshot();
        let evaluation = self.evaluator.evaluate(&grid);
        let payout = self.calculator.calculate(&evaluation, bet);

        log::info!(
            "Spin resolved: {} winning lines, payout {}{}",
            payout.line_wins.len(),
            payout.total,
            if interrupted { " (interrupted)" } else { "" }
        );
        self.ctx
            .observer
            .on_spin_resolved(&payout.line_wins, &evaluation.scatter_counts, payout.total);

        Ok(ResolvedSpin {
            grid,
            evaluation,
            payout,
            bet,
            interrupted,
        })
    }

    pub fn evaluator(&self) -> &PaylineEvaluator {
        &self.evaluator
    }

    pub fn context(&self) -> &Arc<SlotContext> {
        &self.ctx
    }
}

/// One reel's spin. Returns true if it was interrupted.
async fn run_reel(
    reel: usize,
    ctx: Arc<SlotContext>,
    mut cancel_rx: broadcast::Receiver<()>,
    guard: CompletionGuard,
) -> bool {
    let _guard = guard;
    let timing = &ctx.config.timing;

    let deadline = time::sleep(timing.spin_duration());
    tokio::pin!(deadline);
    let mut ticker = time::interval(timing.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let interrupted = loop {
        tokio::select! {
            biased;
            _ = cancel_rx.recv() => break true,
            _ = &mut deadline => break false,
            _ = ticker.tick() => roll(reel, &ctx),
        }
    };

    if interrupted {
        log::warn!("Reel {} interrupted, keeping last rolled column", reel);
    } else {
        roll(reel, &ctx);
    }

    let column = ctx.grid.lock().column(reel).copied();
    if let Some(column) = column {
        log::debug!("Reel {} settled on {:?}", reel, column);
        ctx.observer.on_reel_settled(reel, &column, interrupted);
    }

    interrupted
}

/// Draw a fresh column for one reel
fn roll(reel: usize, ctx: &SlotContext) {
    let column = ctx.sampler.lock().sample_column();
    if let Err(e) = ctx.grid.lock().set_column(reel, column) {
        log::error!("{}", e);
    }
}
