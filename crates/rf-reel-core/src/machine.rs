//! Session facade: paid spins, free spin auto-play, statistics

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time;

use crate::config::SlotConfig;
use crate::context::SlotContext;
use crate::coordinator::{ReelSpinCoordinator, ResolvedSpin};
use crate::error::{ReelError, ReelResult};
use crate::events::{NullObserver, SlotObserver};
use crate::free_spins::{FreeSpinState, FreeSpinStateMachine, FreeSpinTransition};
use crate::grid::ReelGrid;

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub paid_spins: u64,
    pub free_spins_played: u64,
    /// Paid spins only; free spins cost nothing
    pub total_bet: f64,
    pub total_win: f64,
    pub wins: u64,
    pub losses: u64,
    pub bonus_triggers: u64,
    pub retriggers: u64,
    pub interrupted_spins: u64,
    pub max_win: f64,
}

impl SessionStats {
    /// Calculate RTP
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            (self.total_win / self.total_bet) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate hit rate over all spins, paid and free
    pub fn hit_rate(&self) -> f64 {
        let spins = self.paid_spins + self.free_spins_played;
        if spins > 0 {
            (self.wins as f64 / spins as f64) * 100.0
        } else {
            0.0
        }
    }

    fn record(&mut self, spin: &ResolvedSpin, free: bool) {
        if free {
            self.free_spins_played += 1;
        } else {
            self.paid_spins += 1;
            self.total_bet += spin.bet;
        }
        let win = spin.payout.total;
        self.total_win += win;
        if win > 0.0 {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        if spin.interrupted {
            self.interrupted_spins += 1;
        }
        self.max_win = self.max_win.max(win);
    }

    fn record_transition(&mut self, transition: FreeSpinTransition) {
        match transition {
            FreeSpinTransition::Triggered { .. } => self.bonus_triggers += 1,
            FreeSpinTransition::Retriggered { kinds, .. } => self.retriggers += u64::from(kinds),
        }
    }
}

/// Result of one spin as seen by the session
#[derive(Debug, Clone, Serialize)]
pub struct SpinReport {
    #[serde(flatten)]
    pub spin: ResolvedSpin,
    /// Played as part of a free spin sequence
    pub free_spin: bool,
    pub transition: Option<FreeSpinTransition>,
    pub free_spin_state: FreeSpinState,
    pub remaining_free_spins: u32,
}

impl SpinReport {
    pub fn total_win(&self) -> f64 {
        self.spin.payout.total
    }
}

/// Totals for one completed free spin sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinSummary {
    pub spins_played: u32,
    pub retriggers: u32,
    pub total_win: f64,
}

/// Clears the auto-play flag however the sequence ends
struct AutoPlay<'a>(&'a AtomicBool);

impl Drop for AutoPlay<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A free spin taken off the counter. Given back on drop unless its spin
/// resolved, so a rejected, failed or cancelled start costs nothing.
struct TakenSpin<'a> {
    machine: &'a SlotMachine,
    resolved: bool,
}

impl Drop for TakenSpin<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            self.machine.update_free_spins(FreeSpinStateMachine::restore_spin);
        }
    }
}

/// One player session
pub struct SlotMachine {
    ctx: Arc<SlotContext>,
    coordinator: ReelSpinCoordinator,
    free_spins: Mutex<FreeSpinStateMachine>,
    stats: Mutex<SessionStats>,
    /// Bet that triggered the pending or running bonus
    bonus_bet: Mutex<f64>,
    auto_playing: AtomicBool,
}

impl SlotMachine {
    pub fn new(config: SlotConfig, observer: Arc<dyn SlotObserver>) -> ReelResult<Self> {
        Ok(Self::with_context(SlotContext::new(config, observer)?))
    }

    /// Session with no observer attached
    pub fn headless(config: SlotConfig) -> ReelResult<Self> {
        Self::new(config, Arc::new(NullObserver))
    }

    pub fn with_context(ctx: Arc<SlotContext>) -> Self {
        let free_spins = FreeSpinStateMachine::new(ctx.config.free_spins.clone());
        let bonus_bet = ctx.config.bet;
        Self {
            coordinator: ReelSpinCoordinator::new(Arc::clone(&ctx)),
            ctx,
            free_spins: Mutex::new(free_spins),
            stats: Mutex::new(SessionStats::default()),
            bonus_bet: Mutex::new(bonus_bet),
            auto_playing: AtomicBool::new(false),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PAID SPINS
    // ═══════════════════════════════════════════════════════════════════════

    /// Paid spin at the configured bet
    pub async fn spin(&self) -> ReelResult<Option<SpinReport>> {
        self.start_spin(self.ctx.config.bet).await
    }

    /// Paid spin. `Ok(None)` when a spin is already running or a bonus is
    /// pending; nothing changes in that case.
    pub async fn start_spin(&self, bet: f64) -> ReelResult<Option<SpinReport>> {
        if !bet.is_finite() || bet <= 0.0 {
            return Err(ReelError::invalid(format!("bet must be positive, got {bet}")));
        }

        let state = self.free_spins.lock().state();
        if !state.allows_paid_spin() {
            log::debug!("Paid spin ignored while free spins are {:?}", state);
            return Ok(None);
        }

        let Some(spin) = self.coordinator.spin(bet).await? else {
            return Ok(None);
        };

        self.stats.lock().record(&spin, false);
        let transition = self.apply_scatters(&spin);
        if matches!(transition, Some(FreeSpinTransition::Triggered { .. })) {
            *self.bonus_bet.lock() = bet;
        }

        Ok(Some(self.report(spin, false, transition)))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // FREE SPINS
    // ═══════════════════════════════════════════════════════════════════════

    /// Awarded → WaitingToStart
    pub fn acknowledge_award(&self) -> bool {
        self.update_free_spins(FreeSpinStateMachine::acknowledge_award)
    }

    /// Ended → Idle
    pub fn acknowledge_end(&self) -> bool {
        self.update_free_spins(FreeSpinStateMachine::acknowledge_end)
    }

    /// Play the whole bonus sequence, one spin at a time, and end it.
    ///
    /// Starts from `WaitingToStart`, or resumes an `Active` sequence whose
    /// auto-play was cancelled. Returns `Ok(None)` without changing anything
    /// when the coordinator is busy, another auto-play is running, or no bonus
    /// is ready. The summary covers the spins played by this call.
    pub async fn run_free_spins(&self) -> ReelResult<Option<FreeSpinSummary>> {
        self.run_free_spins_with(|_| {}).await
    }

    /// Like [`run_free_spins`](Self::run_free_spins), handing each spin to `on_spin`
    pub async fn run_free_spins_with<F>(
        &self,
        mut on_spin: F,
    ) -> ReelResult<Option<FreeSpinSummary>>
    where
        F: FnMut(&SpinReport),
    {
        if !self.coordinator.is_idle() {
            log::debug!("Free spins not started: coordinator busy");
            return Ok(None);
        }
        if self.auto_playing.swap(true, Ordering::AcqRel) {
            log::debug!("Free spins not started: auto-play already running");
            return Ok(None);
        }
        let _auto_play = AutoPlay(&self.auto_playing);

        let resumed = self.free_spin_state() == FreeSpinState::Active;
        if !resumed && !self.update_free_spins(FreeSpinStateMachine::begin) {
            return Ok(None);
        }

        let timing = self.ctx.config.timing.clone();
        let bet = *self.bonus_bet.lock();
        let mut summary = FreeSpinSummary::default();

        if resumed {
            log::info!("Free spin sequence resumed, {} left", self.remaining_free_spins());
        } else {
            log::info!("Free spin sequence started");
        }

        loop {
            while !self.coordinator.is_idle() {
                time::sleep(timing.idle_poll()).await;
            }

            if !self.update_free_spins(FreeSpinStateMachine::take_spin) {
                break;
            }
            let mut taken = TakenSpin {
                machine: self,
                resolved: false,
            };

            let Some(spin) = self.coordinator.spin(bet).await? else {
                // Someone else started a spin between the idle check and ours
                continue;
            };
            taken.resolved = true;

            self.stats.lock().record(&spin, true);
            let transition = self.apply_scatters(&spin);
            summary.spins_played += 1;
            summary.total_win += spin.payout.total;
            if let Some(FreeSpinTransition::Retriggered { kinds, .. }) = transition {
                summary.retriggers += kinds;
            }

            let report = self.report(spin, true, transition);
            on_spin(&report);

            if report.remaining_free_spins > 0 {
                time::sleep(timing.free_spin_interval()).await;
            }
        }

        self.update_free_spins(FreeSpinStateMachine::finish_if_exhausted);

        log::info!(
            "Free spin sequence done: {} spins, {} retriggers, won {}",
            summary.spins_played,
            summary.retriggers,
            summary.total_win
        );
        Ok(Some(summary))
    }

    fn apply_scatters(&self, spin: &ResolvedSpin) -> Option<FreeSpinTransition> {
        let mut transition = None;
        self.update_free_spins(|fsm| {
            transition = fsm.apply_scatter_counts(&spin.evaluation.scatter_counts);
            transition.is_some()
        });
        if let Some(t) = transition {
            self.stats.lock().record_transition(t);
        }
        transition
    }

    /// Apply `change` to the bonus state. When it reports a change the observer
    /// is told, after the lock is released so callbacks may query the machine.
    fn update_free_spins<F>(&self, change: F) -> bool
    where
        F: FnOnce(&mut FreeSpinStateMachine) -> bool,
    {
        let snapshot = {
            let mut fsm = self.free_spins.lock();
            change(&mut *fsm).then(|| (fsm.state(), fsm.remaining()))
        };
        match snapshot {
            Some((state, remaining)) => {
                self.ctx.observer.on_free_spin_state_changed(state, remaining);
                true
            }
            None => false,
        }
    }

    fn report(
        &self,
        spin: ResolvedSpin,
        free_spin: bool,
        transition: Option<FreeSpinTransition>,
    ) -> SpinReport {
        let fsm = self.free_spins.lock();
        SpinReport {
            spin,
            free_spin,
            transition,
            free_spin_state: fsm.state(),
            remaining_free_spins: fsm.remaining(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Stop the running spin on the reels' current columns
    pub fn interrupt(&self) -> bool {
        self.coordinator.interrupt()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.lock().clone()
    }

    pub fn reset_stats(&self) {
        *self.stats.lock() = SessionStats::default();
    }

    pub fn free_spin_state(&self) -> FreeSpinState {
        self.free_spins.lock().state()
    }

    pub fn remaining_free_spins(&self) -> u32 {
        self.free_spins.lock().remaining()
    }

    pub fn grid(&self) -> ReelGrid {
        self.ctx.grid_snapshot()
    }

    pub fn coordinator(&self) -> &ReelSpinCoordinator {
        &self.coordinator
    }

    pub fn context(&self) -> &Arc<SlotContext> {
        &self.ctx
    }
}
