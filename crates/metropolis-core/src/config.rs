//! Simulation configuration loaded from `metropolis-config.yaml`.
//!
//! Every section and field has a default, so an empty file (or a file that
//! only overrides a few knobs) is a valid configuration. Subsystem sections
//! reuse the config structs of the crates that own them.

use std::path::{Path, PathBuf};

use metropolis_agents::{GovernanceConfig, JusticeConfig, MovementConfig};
use metropolis_economy::EconomyConfig;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Tick loop, seed and snapshots.
    pub engine: EngineConfig,
    /// Simulated clock.
    pub time: TimeConfig,
    /// Power and water grid.
    pub grid: GridConfig,
    /// Resident movement.
    pub movement: MovementConfig,
    /// Rent enforcement durations.
    pub justice: JusticeConfig,
    /// Election durations.
    pub governance: GovernanceConfig,
    /// Taxes, demand and finance.
    pub economy: EconomyConfig,
    /// The starting city created on a fresh run.
    pub city: CityConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.justice.ticks_per_day = config.time.ticks_per_day();
        Ok(config)
    }
}

/// Tick loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Wall-clock milliseconds between ticks (default: 100).
    pub tick_interval_ms: u64,
    /// Seed for every probabilistic simulator (default: 42).
    pub seed: u64,
    /// Where snapshots are written. `None` disables them.
    pub snapshot_path: Option<PathBuf>,
    /// Ticks between snapshots (default: 600, one in-game hour).
    pub snapshot_interval_ticks: u64,
    /// Stop after this tick (default: 0, run until stopped).
    pub max_ticks: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            seed: 42,
            snapshot_path: Some(PathBuf::from("data/metropolis-snapshot.json")),
            snapshot_interval_ticks: 600,
            max_ticks: 0,
        }
    }
}

/// Simulated clock settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Ticks per in-game minute (default: 10).
    pub ticks_per_minute: u64,
    /// Minutes per hour (default: 60).
    pub minutes_per_hour: u64,
    /// Hours per day (default: 24).
    pub hours_per_day: u64,
    /// Days per year (default: 365).
    pub days_per_year: u64,
    /// Hour of day at tick 0 (default: 8).
    pub start_hour: u64,
    /// Hour that starts the day (default: 6).
    pub day_start_hour: u32,
    /// Hour that starts the night (default: 20).
    pub night_start_hour: u32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            ticks_per_minute: 10,
            minutes_per_hour: 60,
            hours_per_day: 24,
            days_per_year: 365,
            start_hour: 8,
            day_start_hour: 6,
            night_start_hour: 20,
        }
    }
}

impl TimeConfig {
    /// Ticks in one in-game hour.
    pub const fn ticks_per_hour(&self) -> u64 {
        self.ticks_per_minute.saturating_mul(self.minutes_per_hour)
    }

    /// Ticks in one in-game day.
    pub const fn ticks_per_day(&self) -> u64 {
        self.ticks_per_hour().saturating_mul(self.hours_per_day)
    }
}

/// Resource grid settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Ticks between grid recomputations (default: 10).
    pub resource_interval_ticks: u64,
    /// Power units per completed plant (default: 10000).
    pub power_per_plant: u64,
    /// Water units per completed tower (default: 1000).
    pub water_per_tower: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resource_interval_ticks: 10,
            power_per_plant: 10_000,
            water_per_tower: 1_000,
        }
    }
}

/// The starting city.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CityConfig {
    /// Display name (default: "Metropolis").
    pub name: String,
    /// Grid width in tiles (default: 32).
    pub width: i32,
    /// Grid height in tiles (default: 24).
    pub height: i32,
    /// Opening treasury (default: 100000).
    pub treasury: Decimal,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            name: String::from("Metropolis"),
            width: 32,
            height: 24,
            treasury: Decimal::from(100_000),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (default: "info").
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            json: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = SimulationConfig::parse("{}").unwrap();
        assert_eq!(config.engine.tick_interval_ms, 100);
        assert_eq!(config.time.ticks_per_hour(), 600);
        assert_eq!(config.time.ticks_per_day(), 14_400);
        assert_eq!(config.grid.resource_interval_ticks, 10);
        assert_eq!(config.governance.poll_interval_ticks, 100);
        assert_eq!(config.justice.ticks_per_day, 14_400);
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let yaml = "
time:
  ticks_per_minute: 1
engine:
  seed: 7
  snapshot_path: null
city:
  name: Testville
  treasury: 2500.50
economy:
  tax:
    exodus_threshold: 14
justice:
  jail_days: 2
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.time.ticks_per_hour(), 60);
        assert_eq!(config.time.start_hour, 8);
        assert_eq!(config.justice.ticks_per_day, 1_440);
        assert_eq!(config.justice.jail_days, 2);
        assert_eq!(config.engine.seed, 7);
        assert!(config.engine.snapshot_path.is_none());
        assert_eq!(config.city.name, "Testville");
        assert_eq!(config.city.treasury, dec!(2500.50));
        assert_eq!(config.economy.tax.exodus_threshold, dec!(14));
        assert_eq!(config.economy.tax.max_rate, dec!(20));
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped =
            SimulationConfig::parse(include_str!("../../../metropolis-config.yaml")).unwrap();
        assert_eq!(shipped, SimulationConfig::parse("{}").unwrap());
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let err = SimulationConfig::parse("time: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SimulationConfig::from_file(Path::new("/nonexistent/metropolis.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
