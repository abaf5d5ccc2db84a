//! Free spin bonus lifecycle
//!
//! ```text
//! Idle ──(scatters ≥ trigger)──► Awarded ──ack──► WaitingToStart ──begin──► Active
//!  ▲                                                                          │
//!  └──────────────ack────────────── Ended ◄──────(remaining == 0)─────────────┘
//! ```
//!
//! While `Active`, each automatic spin takes one spin off the counter before it
//! starts, and scatter counts at or above the retrigger threshold add spins.

use serde::{Deserialize, Serialize};

use crate::config::FreeSpinConfig;
use crate::evaluator::ScatterCounts;

/// Bonus state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FreeSpinState {
    Idle,
    Awarded,
    WaitingToStart,
    Active,
    Ended,
}

impl Default for FreeSpinState {
    fn default() -> Self {
        Self::Idle
    }
}

impl FreeSpinState {
    /// Paid spins are only allowed with no bonus pending or running
    pub fn allows_paid_spin(self) -> bool {
        self == Self::Idle
    }
}

/// Outcome of feeding scatter counts into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FreeSpinTransition {
    /// Idle → Awarded
    Triggered { awarded: u32 },
    /// Spins added while Active; one award per qualifying symbol kind
    Retriggered { added: u32, kinds: u32 },
}

/// Tracks bonus state and remaining spins
#[derive(Debug, Clone)]
pub struct FreeSpinStateMachine {
    config: FreeSpinConfig,
    state: FreeSpinState,
    remaining: u32,
    spins_played: u32,
    retriggers: u32,
}

impl FreeSpinStateMachine {
    pub fn new(config: FreeSpinConfig) -> Self {
        Self {
            config,
            state: FreeSpinState::Idle,
            remaining: 0,
            spins_played: 0,
            retriggers: 0,
        }
    }

    /// Apply the scatter counts of a resolved spin
    pub fn apply_scatter_counts(&mut self, counts: &ScatterCounts) -> Option<FreeSpinTransition> {
        match self.state {
            FreeSpinState::Idle => {
                let triggered = counts.values().any(|&c| c >= self.config.trigger_count);
                if !triggered {
                    return None;
                }
                self.state = FreeSpinState::Awarded;
                self.remaining = self.config.initial_spins;
                self.spins_played = 0;
                self.retriggers = 0;
                log::info!("Free spins awarded: {}", self.remaining);
                Some(FreeSpinTransition::Triggered {
                    awarded: self.remaining,
                })
            }
            FreeSpinState::Active => {
                let kinds = counts
                    .values()
                    .filter(|&&c| c >= self.config.retrigger_count)
                    .count() as u32;
                if kinds == 0 {
                    return None;
                }
                let added = self.config.retrigger_spins * kinds;
                self.remaining += added;
                self.retriggers += kinds;
                log::info!("Free spins retriggered: +{} ({} left)", added, self.remaining);
                Some(FreeSpinTransition::Retriggered { added, kinds })
            }
            _ => None,
        }
    }

    /// Awarded → WaitingToStart
    pub fn acknowledge_award(&mut self) -> bool {
        self.transition(FreeSpinState::Awarded, FreeSpinState::WaitingToStart)
    }

    /// WaitingToStart → Active
    pub fn begin(&mut self) -> bool {
        self.transition(FreeSpinState::WaitingToStart, FreeSpinState::Active)
    }

    /// Take one spin off the counter before it starts
    pub fn take_spin(&mut self) -> bool {
        if self.state != FreeSpinState::Active || self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.spins_played += 1;
        true
    }

    /// Give back a spin that never resolved
    pub fn restore_spin(&mut self) -> bool {
        if self.state != FreeSpinState::Active || self.spins_played == 0 {
            return false;
        }
        self.remaining += 1;
        self.spins_played -= 1;
        true
    }

    /// Active with nothing left → Ended
    pub fn finish_if_exhausted(&mut self) -> bool {
        if self.state == FreeSpinState::Active && self.remaining == 0 {
            self.state = FreeSpinState::Ended;
            log::info!(
                "Free spins ended after {} spins ({} retriggers)",
                self.spins_played,
                self.retriggers
            );
            true
        } else {
            false
        }
    }

    /// Ended → Idle
    pub fn acknowledge_end(&mut self) -> bool {
        self.transition(FreeSpinState::Ended, FreeSpinState::Idle)
    }

    fn transition(&mut self, from: FreeSpinState, to: FreeSpinState) -> bool {
        if self.state != from {
            log::debug!(
                "Ignoring free spin transition {:?} -> {:?} in state {:?}",
                from,
                to,
                self.state
            );
            return false;
        }
        log::debug!("Free spins {:?} -> {:?}", from, to);
        self.state = to;
        true
    }

    pub fn state(&self) -> FreeSpinState {
        self.state
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn spins_played(&self) -> u32 {
        self.spins_played
    }

    pub fn retriggers(&self) -> u32 {
        self.retriggers
    }

    pub fn is_active(&self) -> bool {
        self.state == FreeSpinState::Active
    }

    pub fn config(&self) -> &FreeSpinConfig {
        &self.config
    }
}

impl Default for FreeSpinStateMachine {
    fn default() -> Self {
        Self::new(FreeSpinConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolId;

    fn counts(entries: &[(u32, u32)]) -> ScatterCounts {
        entries.iter().map(|&(id, n)| (SymbolId(id), n)).collect()
    }

    fn active() -> FreeSpinStateMachine {
        let mut fsm = FreeSpinStateMachine::default();
        fsm.apply_scatter_counts(&counts(&[(9, 3)]));
        assert!(fsm.acknowledge_award());
        assert!(fsm.begin());
        fsm
    }

    #[test]
    fn test_three_scatters_award() {
        let mut fsm = FreeSpinStateMachine::default();
        assert_eq!(fsm.apply_scatter_counts(&counts(&[(9, 2)])), None);
        assert_eq!(fsm.state(), FreeSpinState::Idle);

        assert_eq!(
            fsm.apply_scatter_counts(&counts(&[(9, 3)])),
            Some(FreeSpinTransition::Triggered { awarded: 8 })
        );
        assert_eq!(fsm.state(), FreeSpinState::Awarded);
        assert_eq!(fsm.remaining(), 8);

        // Further scatters before the bonus starts change nothing
        assert_eq!(fsm.apply_scatter_counts(&counts(&[(9, 5)])), None);
        assert_eq!(fsm.remaining(), 8);
    }

    #[test]
    fn test_two_scatters_retrigger_while_active() {
        let mut fsm = active();
        assert_eq!(
            fsm.apply_scatter_counts(&counts(&[(9, 2)])),
            Some(FreeSpinTransition::Retriggered { added: 5, kinds: 1 })
        );
        assert_eq!(fsm.state(), FreeSpinState::Active);
        assert_eq!(fsm.remaining(), 13);
        assert_eq!(fsm.retriggers(), 1);
    }

    #[test]
    fn test_retrigger_per_symbol_kind() {
        let mut fsm = active();
        fsm.apply_scatter_counts(&counts(&[(9, 2), (10, 3), (11, 1)]));
        assert_eq!(fsm.remaining(), 18);
        assert_eq!(fsm.retriggers(), 2);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut fsm = FreeSpinStateMachine::new(FreeSpinConfig {
            initial_spins: 2,
            ..Default::default()
        });
        assert!(!fsm.begin());
        fsm.apply_scatter_counts(&counts(&[(9, 4)]));
        assert!(!fsm.take_spin());
        assert!(fsm.acknowledge_award());
        assert!(fsm.begin());

        assert!(fsm.take_spin());
        assert_eq!(fsm.remaining(), 1);
        assert!(!fsm.finish_if_exhausted());
        assert!(fsm.take_spin());
        assert!(!fsm.take_spin());
        assert_eq!(fsm.spins_played(), 2);

        assert!(fsm.finish_if_exhausted());
        assert_eq!(fsm.state(), FreeSpinState::Ended);
        assert!(!fsm.state().allows_paid_spin());
        assert!(fsm.acknowledge_end());
        assert_eq!(fsm.state(), FreeSpinState::Idle);
        assert!(!fsm.acknowledge_end());
    }

    #[test]
    fn test_restore_spin() {
        let mut fsm = active();
        assert!(!fsm.restore_spin());
        assert!(fsm.take_spin());
        assert!(fsm.restore_spin());
        assert_eq!(fsm.remaining(), 8);
        assert_eq!(fsm.spins_played(), 0);
    }
}
