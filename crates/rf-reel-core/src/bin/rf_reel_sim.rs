//! Reel Simulator
//!
//! Usage:
//!   rf-reel-sim --spins 100 --seed 42          - Run 100 seeded spins
//!   rf-reel-sim --config game.yaml --turbo     - Load a game, turbo timing
//!   rf-reel-sim --instant --events             - Also print every core event

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::Receiver;

use rf_reel_core::{ChannelObserver, FreeSpinState, SlotConfig, SlotEvent, SlotMachine, SpinTiming};

#[derive(Parser)]
#[command(name = "rf-reel-sim", about = "Run slot spins and print results as JSON")]
struct Cli {
    /// Game config (.json, .yaml or .yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of paid spins
    #[arg(short, long, default_value_t = 10)]
    spins: u32,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Bet per paid spin (defaults to the config's bet)
    #[arg(short, long)]
    bet: Option<f64>,

    /// Turbo timing
    #[arg(long, conflicts_with = "instant")]
    turbo: bool,

    /// No reel animation time at all
    #[arg(long)]
    instant: bool,

    /// Print observer events as they are raised
    #[arg(long)]
    events: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SlotConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SlotConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if cli.turbo {
        config.timing = SpinTiming::turbo();
    } else if cli.instant {
        config.timing = SpinTiming::instant();
    }
    let bet = cli.bet.unwrap_or(config.bet);

    let (observer, events) = ChannelObserver::new();
    let machine = SlotMachine::new(config, Arc::new(observer)).context("invalid game config")?;

    for _ in 0..cli.spins {
        let Some(report) = machine.start_spin(bet).await? else {
            continue;
        };
        println!("{}", serde_json::to_string(&report)?);
        print_events(&events, cli.events)?;

        if report.free_spin_state == FreeSpinState::Awarded {
            machine.acknowledge_award();
            let summary = machine
                .run_free_spins_with(|free| {
                    if let Ok(line) = serde_json::to_string(free) {
                        println!("{line}");
                    }
                })
                .await?;
            if let Some(summary) = summary {
                println!("{}", serde_json::to_string(&summary)?);
            }
            machine.acknowledge_end();
            print_events(&events, cli.events)?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&machine.stats())?);
    log::info!("RTP {:.2}%, hit rate {:.2}%", machine.stats().rtp(), machine.stats().hit_rate());
    Ok(())
}

fn print_events(events: &Receiver<SlotEvent>, enabled: bool) -> Result<()> {
    for event in events.try_iter() {
        if enabled {
            println!("{}", serde_json::to_string(&event)?);
        }
    }
    Ok(())
}
