//! End-to-end spin flow: reels, barrier, evaluation, free spins

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use rf_reel_core::{
    ChannelObserver, Column, FreeSpinState, LineWin, REELS, ScatterCounts, SlotConfig, SlotEvent,
    SlotMachine, SlotObserver, SpinTiming, SymbolDefinition,
};

/// Records settle/resolve ordering
#[derive(Default)]
struct OrderObserver {
    settled: Mutex<Vec<usize>>,
    resolved_after: Mutex<Vec<usize>>,
}

impl SlotObserver for OrderObserver {
    fn on_reel_settled(&self, reel: usize, _symbols: &Column, _interrupted: bool) {
        self.settled.lock().push(reel);
    }

    fn on_spin_resolved(&self, _lines: &[LineWin], _scatter_counts: &ScatterCounts, _total: f64) {
        let settled = self.settled.lock().len();
        self.resolved_after.lock().push(settled);
    }
}

fn random_timing(rng: &mut ChaCha8Rng) -> SpinTiming {
    SpinTiming {
        spin_duration_ms: rng.random_range(0..400),
        tick_interval_ms: rng.random_range(1..60),
        reel_stagger_ms: rng.random_range(0..150),
        ..SpinTiming::instant()
    }
}

#[tokio::test(start_paused = true)]
async fn test_evaluation_waits_for_every_reel() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    for round in 0..40u64 {
        let observer = Arc::new(OrderObserver::default());
        let config = SlotConfig::default()
            .with_timing(random_timing(&mut rng))
            .with_seed(round);
        let machine = Arc::new(SlotMachine::new(config, observer.clone()).unwrap());

        // Every other round is cut short at a random point
        let interrupt_at =
            (round % 2 == 1).then(|| Duration::from_millis(rng.random_range(0..500)));
        let spin = {
            let machine = Arc::clone(&machine);
            tokio::spawn(async move { machine.start_spin(1.0).await })
        };
        if let Some(at) = interrupt_at {
            tokio::time::sleep(at).await;
            machine.interrupt();
        }

        let report = spin.await.unwrap().unwrap();
        assert!(report.is_some(), "round {round}");

        let mut settled = observer.settled.lock().clone();
        settled.sort_unstable();
        assert_eq!(settled, (0..REELS).collect::<Vec<_>>(), "round {round}");
        assert_eq!(*observer.resolved_after.lock(), vec![REELS], "round {round}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_reels_start_in_stagger_order() {
    let (observer, rx) = ChannelObserver::new();
    let config = SlotConfig::default()
        .with_seed(8)
        .with_timing(SpinTiming {
            spin_duration_ms: 100,
            reel_stagger_ms: 200,
            ..SpinTiming::normal()
        });
    let machine = SlotMachine::new(config, Arc::new(observer)).unwrap();
    machine.spin().await.unwrap().unwrap();

    // Equal durations plus a stagger longer than a spin: reels settle strictly in order
    let order: Vec<usize> = rx
        .try_iter()
        .filter_map(|e| match e {
            SlotEvent::ReelSettled { reel, .. } => Some(reel),
            _ => None,
        })
        .collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_start_is_a_no_op() {
    let machine = Arc::new(SlotMachine::headless(SlotConfig::default().with_seed(3)).unwrap());
    let first = {
        let machine = Arc::clone(&machine);
        tokio::spawn(async move { machine.start_spin(1.0).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stats_before = machine.stats();
    assert!(machine.start_spin(1.0).await.unwrap().is_none());
    assert_eq!(machine.stats(), stats_before);

    assert!(first.await.unwrap().unwrap().is_some());
    assert_eq!(machine.stats().paid_spins, 1);
}

#[tokio::test(start_paused = true)]
async fn test_free_spin_events_in_order() {
    let (observer, rx) = ChannelObserver::new();
    let mut config = SlotConfig::instant()
        .with_seed(11)
        .with_symbols(vec![SymbolDefinition::free_spin(9, "FREE_SPIN", 1.0, 0.0)]);
    config.free_spins.initial_spins = 2;
    config.free_spins.retrigger_spins = 0;
    let machine = SlotMachine::new(config, Arc::new(observer)).unwrap();

    machine.spin().await.unwrap().unwrap();
    machine.acknowledge_award();
    let summary = machine.run_free_spins().await.unwrap().unwrap();
    machine.acknowledge_end();
    assert_eq!(summary.spins_played, 2);

    let states: Vec<(FreeSpinState, u32)> = rx
        .try_iter()
        .filter_map(|e| match e {
            SlotEvent::FreeSpinStateChanged { state, remaining } => Some((state, remaining)),
            _ => None,
        })
        .collect();

    use FreeSpinState::*;
    assert_eq!(
        states,
        vec![
            (Awarded, 2),
            (WaitingToStart, 2),
            (Active, 2),
            // spin 1: taken, then a zero-spin retrigger
            (Active, 1),
            (Active, 1),
            // spin 2
            (Active, 0),
            (Active, 0),
            (Ended, 0),
            (Idle, 0),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_free_spins_are_paced() {
    let mut config = SlotConfig::default()
        .with_seed(12)
        .with_symbols(vec![SymbolDefinition::free_spin(9, "FREE_SPIN", 1.0, 0.0)]);
    config.free_spins.initial_spins = 3;
    config.free_spins.retrigger_spins = 0;
    config.timing.spin_duration_ms = 0;
    config.timing.reel_stagger_ms = 0;
    let machine = SlotMachine::headless(config).unwrap();

    machine.spin().await.unwrap().unwrap();
    machine.acknowledge_award();
    let start = tokio::time::Instant::now();
    machine.run_free_spins().await.unwrap().unwrap();

    // One pause between each pair of spins, none after the last
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(2000));
    assert!(elapsed < Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn test_config_file_round_trip() {
    let path = std::env::temp_dir().join(format!("rf-reel-core-{}.yaml", std::process::id()));
    std::fs::write(
        &path,
        "name: File Game\nbet: 2\nseed: 99\ntiming:\n  spin_duration_ms: 0\n  reel_stagger_ms: 0\n",
    )
    .unwrap();

    let config = SlotConfig::from_path(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(config.name, "File Game");

    let machine = SlotMachine::headless(config).unwrap();
    let report = machine.spin().await.unwrap().unwrap();
    assert_eq!(report.spin.bet, 2.0);
    assert_eq!(machine.stats().total_bet, 2.0);
}
