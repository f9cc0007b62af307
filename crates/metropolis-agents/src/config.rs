//! Tunable parameters for residents, rent enforcement and elections.
//!
//! Each struct deserializes from its section of `metropolis-config.yaml`
//! with every field optional; missing fields take the defaults below.

use serde::Deserialize;

/// Movement speeds, in tiles per tick.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// How far a resident walks per tick (default: 0.5).
    pub walk_speed: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self { walk_speed: 0.5 }
    }
}

/// Rent and justice pipeline durations, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JusticeConfig {
    /// Days covered by one rent payment (default: 30).
    pub rent_period_days: u64,
    /// Days between a warning and its due date (default: 3).
    pub warning_grace_days: u64,
    /// Days between escalation and the hearing (default: 1).
    pub hearing_delay_days: u64,
    /// Days of jail after a guilty verdict (default: 7).
    pub jail_days: u64,
    /// Ticks per simulated day; set from the clock, not from YAML.
    #[serde(skip)]
    pub ticks_per_day: u64,
}

impl Default for JusticeConfig {
    fn default() -> Self {
        Self {
            rent_period_days: 30,
            warning_grace_days: 3,
            hearing_delay_days: 1,
            jail_days: 7,
            ticks_per_day: 14_400,
        }
    }
}

impl JusticeConfig {
    /// Convert a day count into ticks.
    pub const fn days(&self, days: u64) -> u64 {
        days.saturating_mul(self.ticks_per_day)
    }

    /// Ticks covered by one rent payment.
    pub const fn rent_period_ticks(&self) -> u64 {
        self.days(self.rent_period_days)
    }
}

/// Election phase durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Hours the nomination phase lasts (default: 72).
    pub nomination_hours: u32,
    /// Hours the voting phase lasts (default: 48).
    pub voting_hours: u32,
    /// Ticks between deadline polls (default: 100).
    pub poll_interval_ticks: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            nomination_hours: 72,
            voting_hours: 48,
            poll_interval_ticks: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn justice_days_scale_with_clock() {
        let cfg = JusticeConfig {
            ticks_per_day: 100,
            ..JusticeConfig::default()
        };
        assert_eq!(cfg.rent_period_ticks(), 3_000);
        assert_eq!(cfg.days(cfg.jail_days), 700);
    }
}
