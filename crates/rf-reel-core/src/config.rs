//! Session configuration: symbols, timing, free spins, bet

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};
use crate::symbols::{SymbolDefinition, SymbolTable, classic_symbols};

/// Timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingProfile {
    /// Normal gameplay timing
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// Zero-length spins (tests, simulation)
    Instant,
    /// Scaled from another profile
    Custom,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::Normal
    }
}

/// Reel timing in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinTiming {
    /// Profile type
    pub profile: TimingProfile,

    /// How long each reel rolls before settling (ms)
    pub spin_duration_ms: u64,

    /// Interval between cosmetic re-samples while rolling (ms)
    pub tick_interval_ms: u64,

    /// Delay between reel starts (ms)
    pub reel_stagger_ms: u64,

    /// Poll interval while waiting for the coordinator to go idle (ms)
    pub idle_poll_ms: u64,

    /// Pause between automatic free spins (ms)
    pub free_spin_interval_ms: u64,
}

impl SpinTiming {
    /// Normal gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            spin_duration_ms: 2000,
            tick_interval_ms: 50,
            reel_stagger_ms: 200,
            idle_poll_ms: 100,
            free_spin_interval_ms: 1000,
        }
    }

    /// Turbo mode (roughly 3x faster)
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            spin_duration_ms: 600,
            tick_interval_ms: 30,
            reel_stagger_ms: 60,
            idle_poll_ms: 20,
            free_spin_interval_ms: 300,
        }
    }

    /// Reels settle on the first poll
    pub fn instant() -> Self {
        Self {
            profile: TimingProfile::Instant,
            spin_duration_ms: 0,
            tick_interval_ms: 1,
            reel_stagger_ms: 0,
            idle_poll_ms: 1,
            free_spin_interval_ms: 0,
        }
    }

    /// Scale all timings by a factor. Intervals never drop below 1 ms.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |ms: u64| (ms as f64 * factor.max(0.0)).round() as u64;
        Self {
            profile: TimingProfile::Custom,
            spin_duration_ms: scale(self.spin_duration_ms),
            tick_interval_ms: scale(self.tick_interval_ms).max(1),
            reel_stagger_ms: scale(self.reel_stagger_ms),
            idle_poll_ms: scale(self.idle_poll_ms).max(1),
            free_spin_interval_ms: scale(self.free_spin_interval_ms),
        }
    }

    pub fn spin_duration(&self) -> Duration {
        Duration::from_millis(self.spin_duration_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn reel_stagger(&self) -> Duration {
        Duration::from_millis(self.reel_stagger_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn free_spin_interval(&self) -> Duration {
        Duration::from_millis(self.free_spin_interval_ms)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(ReelError::config("tick interval must be at least 1 ms"));
        }
        if self.idle_poll_ms == 0 {
            return Err(ReelError::config("idle poll interval must be at least 1 ms"));
        }
        Ok(())
    }
}

impl Default for SpinTiming {
    fn default() -> Self {
        Self::normal()
    }
}

/// Free spin award rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeSpinConfig {
    /// Spins awarded on trigger
    pub initial_spins: u32,
    /// Extra spins per retrigger
    pub retrigger_spins: u32,
    /// Scatters needed to trigger from idle
    pub trigger_count: u32,
    /// Scatters needed to retrigger while active
    pub retrigger_count: u32,
}

impl Default for FreeSpinConfig {
    fn default() -> Self {
        Self {
            initial_spins: 8,
            retrigger_spins: 5,
            trigger_count: 3,
            retrigger_count: 2,
        }
    }
}

impl FreeSpinConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if self.trigger_count == 0 || self.retrigger_count == 0 {
            return Err(ReelError::config("free spin scatter counts must be at least 1"));
        }
        if self.initial_spins == 0 {
            return Err(ReelError::config("free spin award must be at least 1 spin"));
        }
        Ok(())
    }
}

fn default_name() -> String {
    "Classic 5x3".to_string()
}

fn default_bet() -> f64 {
    100.0
}

/// Complete session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Game name
    #[serde(default = "default_name")]
    pub name: String,
    /// Symbol catalog in sampling order
    #[serde(default = "classic_symbols")]
    pub symbols: Vec<SymbolDefinition>,
    /// Reel timing
    #[serde(default)]
    pub timing: SpinTiming,
    /// Free spin rules
    #[serde(default)]
    pub free_spins: FreeSpinConfig,
    /// Default bet per spin
    #[serde(default = "default_bet")]
    pub bet: f64,
    /// RNG seed; `None` seeds from the OS
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbols: classic_symbols(),
            timing: SpinTiming::normal(),
            free_spins: FreeSpinConfig::default(),
            bet: default_bet(),
            seed: None,
        }
    }
}

impl SlotConfig {
    /// Instant timing, for tests and simulation
    pub fn instant() -> Self {
        Self {
            timing: SpinTiming::instant(),
            ..Default::default()
        }
    }

    /// Builder: set timing
    pub fn with_timing(mut self, timing: SpinTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Builder: set symbols
    pub fn with_symbols(mut self, symbols: Vec<SymbolDefinition>) -> Self {
        self.symbols = symbols;
        self
    }

    /// Builder: set bet
    pub fn with_bet(mut self, bet: f64) -> Self {
        self.bet = bet;
        self
    }

    /// Builder: set RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> ReelResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ReelError::Parse(format!("JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from YAML
    pub fn from_yaml(yaml: &str) -> ReelResult<Self> {
        let config: Self =
            serde_yml::from_str(yaml).map_err(|e| ReelError::Parse(format!("YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            Some("yaml") | Some("yml") => Self::from_yaml(&text),
            other => Err(ReelError::Parse(format!(
                "unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> ReelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReelError::Parse(e.to_string()))
    }

    /// Build the validated symbol table
    pub fn symbol_table(&self) -> ReelResult<SymbolTable> {
        SymbolTable::new(self.symbols.clone())
    }

    /// Check everything a spin depends on
    pub fn validate(&self) -> ReelResult<()> {
        self.symbol_table()?;
        self.timing.validate()?;
        self.free_spins.validate()?;
        if !self.bet.is_finite() || self.bet <= 0.0 {
            return Err(ReelError::config(format!("bet must be positive, got {}", self.bet)));
        }
        Ok(())
    }
}
