//! Outbound events for the front end
//!
//! The core never touches presentation; it reports through a [`SlotObserver`].
//! [`ChannelObserver`] turns those callbacks into a [`SlotEvent`] queue that a
//! UI thread can drain at its own pace.

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};

use crate::evaluator::ScatterCounts;
use crate::free_spins::FreeSpinState;
use crate::grid::Column;
use crate::payout::LineWin;
use crate::symbols::SymbolId;

/// Event raised by the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotEvent {
    /// A reel stopped on its final column
    ReelSettled {
        reel: usize,
        symbols: Vec<SymbolId>,
        interrupted: bool,
    },
    /// All reels stopped and the grid was evaluated
    SpinResolved {
        lines: Vec<LineWin>,
        #[serde(with = "serde_scatter_counts")]
        scatter_counts: ScatterCounts,
        total_payout: f64,
    },
    /// Bonus state or remaining count changed
    FreeSpinStateChanged {
        state: FreeSpinState,
        remaining: u32,
    },
}

/// Scatter counts as `[id, count]` pairs. Tagged enums buffer their content,
/// which turns numeric map keys into strings that no longer read back.
mod serde_scatter_counts {
    use serde::{Deserialize, Deserializer, Serialize as _, Serializer};

    use crate::evaluator::ScatterCounts;
    use crate::symbols::SymbolId;

    pub fn serialize<S>(counts: &ScatterCounts, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let pairs: Vec<(SymbolId, u32)> = counts.iter().map(|(&id, &n)| (id, n)).collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ScatterCounts, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(SymbolId, u32)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

/// Receives core callbacks. All methods default to no-ops.
pub trait SlotObserver: Send + Sync {
    fn on_reel_settled(&self, _reel: usize, _symbols: &Column, _interrupted: bool) {}

    fn on_spin_resolved(
        &self,
        _lines: &[LineWin],
        _scatter_counts: &ScatterCounts,
        _total_payout: f64,
    ) {
    }

    fn on_free_spin_state_changed(&self, _state: FreeSpinState, _remaining: u32) {}
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SlotObserver for NullObserver {}

/// Forwards every callback into a channel
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: Sender<SlotEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its queue
    pub fn new() -> (Self, Receiver<SlotEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    pub fn from_sender(tx: Sender<SlotEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: SlotEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("Event receiver dropped");
        }
    }
}

impl SlotObserver for ChannelObserver {
    fn on_reel_settled(&self, reel: usize, symbols: &Column, interrupted: bool) {
        self.send(SlotEvent::ReelSettled {
            reel,
            symbols: symbols.to_vec(),
            interrupted,
        });
    }

    fn on_spin_resolved(
        &self,
        lines: &[LineWin],
        scatter_counts: &ScatterCounts,
        total_payout: f64,
    ) {
        self.send(SlotEvent::SpinResolved {
            lines: lines.to_vec(),
            scatter_counts: scatter_counts.clone(),
            total_payout,
        });
    }

    fn on_free_spin_state_changed(&self, state: FreeSpinState, remaining: u32) {
        self.send(SlotEvent::FreeSpinStateChanged { state, remaining });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_observer_queues_events() {
        let (observer, rx) = ChannelObserver::new();
        observer.on_reel_settled(2, &[SymbolId(1), SymbolId(2), SymbolId(3)], false);
        observer.on_free_spin_state_changed(FreeSpinState::Awarded, 8);

        let events: Vec<SlotEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            SlotEvent::ReelSettled {
                reel: 2,
                symbols: vec![SymbolId(1), SymbolId(2), SymbolId(3)],
                interrupted: false,
            }
        );
        assert_eq!(
            events[1],
            SlotEvent::FreeSpinStateChanged {
                state: FreeSpinState::Awarded,
                remaining: 8
            }
        );
    }

    #[test]
    fn test_dropped_receiver_is_harmless() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        observer.on_spin_resolved(&[], &ScatterCounts::new(), 0.0);
    }

    #[test]
    fn test_event_json_shape() {
        let event = SlotEvent::FreeSpinStateChanged {
            state: FreeSpinState::Active,
            remaining: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "free_spin_state_changed");
        assert_eq!(json["state"], "Active");
        assert_eq!(json["remaining"], 3);
    }

    #[test]
    fn test_spin_resolved_reads_back_from_json() {
        let event = SlotEvent::SpinResolved {
            lines: Vec::new(),
            scatter_counts: [(SymbolId(9), 3), (SymbolId(10), 1)].into_iter().collect(),
            total_payout: 0.0,
        };
        let json = serde_json::to_string(&event).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["scatter_counts"], serde_json::json!([[9, 3], [10, 1]]));

        let back: SlotEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
