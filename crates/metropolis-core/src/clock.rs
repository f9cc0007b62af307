//! Simulated clock.
//!
//! The tick counter is the only stored state; minute, hour, day and year are
//! derived from it and the [`TimeConfig`]. Tick 0 sits at `start_hour` of
//! day 1, year 1. The absolute day counts whole days since midnight before
//! tick 0, so it is the period key for every once-a-day gate.
//!
//! Day and night notifications come from two [`PeriodGate`]s keyed on the
//! absolute day. They fire on the first tick at or past their hour, so a
//! tick cadence that skips the exact boundary still fires exactly once.

use metropolis_types::{GameTime, PeriodGate};

use crate::config::TimeConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid time configuration (e.g. zero ticks per minute).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// What one call to [`SimulationClock::advance`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    /// The new tick number.
    pub tick: u64,
    /// In-game time at that tick.
    pub time: GameTime,
    /// Absolute day at that tick.
    pub absolute_day: u64,
    /// The day-start hour was reached for the first time today.
    pub day_started: bool,
    /// The night-start hour was reached for the first time today.
    pub night_started: bool,
}

/// Clock mapping ticks onto in-game time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationClock {
    tick: u64,
    config: TimeConfig,
    day_gate: PeriodGate,
    night_gate: PeriodGate,
}

impl SimulationClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if any unit is zero or the
    /// configured hours fall outside the day.
    pub fn new(config: TimeConfig) -> Result<Self, ClockError> {
        Self::at_tick(config, 0)
    }

    /// Create a clock resuming at `tick`.
    ///
    /// Day and night gates are seeded so that boundaries already passed on
    /// the current day do not fire again.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] for an invalid configuration.
    pub fn at_tick(config: TimeConfig, tick: u64) -> Result<Self, ClockError> {
        validate(&config)?;
        let mut clock = Self {
            tick,
            config,
            day_gate: PeriodGate::new(),
            night_gate: PeriodGate::new(),
        };
        let day = clock.absolute_day(tick);
        let hour = clock.hour(tick);
        if hour >= config.day_start_hour {
            clock.day_gate = PeriodGate::seeded(Some(day));
        }
        if hour >= config.night_start_hour {
            clock.night_gate = PeriodGate::seeded(Some(day));
        }
        Ok(clock)
    }

    /// The current tick.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The configuration in use.
    pub const fn config(&self) -> &TimeConfig {
        &self.config
    }

    /// Advance by one tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] at `u64::MAX`.
    pub fn advance(&mut self) -> Result<ClockTick, ClockError> {
        let tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        self.tick = tick;

        let absolute_day = self.absolute_day(tick);
        let hour = self.hour(tick);
        let day_started =
            hour >= self.config.day_start_hour && self.day_gate.try_fire(absolute_day);
        let night_started =
            hour >= self.config.night_start_hour && self.night_gate.try_fire(absolute_day);

        Ok(ClockTick {
            tick,
            time: self.time_at(tick),
            absolute_day,
            day_started,
            night_started,
        })
    }

    /// Whole hours elapsed since midnight before tick 0.
    fn total_hours(&self, tick: u64) -> u64 {
        let per_hour = self.config.ticks_per_hour().max(1);
        self.config
            .start_hour
            .saturating_add(tick.checked_div(per_hour).unwrap_or(0))
    }

    /// Hour of day at `tick`.
    pub fn hour(&self, tick: u64) -> u32 {
        let hours = self
            .total_hours(tick)
            .checked_rem(self.config.hours_per_day)
            .unwrap_or(0);
        u32::try_from(hours).unwrap_or(0)
    }

    /// Absolute day at `tick`, starting from 0.
    pub fn absolute_day(&self, tick: u64) -> u64 {
        self.total_hours(tick)
            .checked_div(self.config.hours_per_day)
            .unwrap_or(0)
    }

    /// Full in-game time at `tick`.
    pub fn time_at(&self, tick: u64) -> GameTime {
        let minutes = tick
            .checked_div(self.config.ticks_per_minute)
            .unwrap_or(0)
            .checked_rem(self.config.minutes_per_hour)
            .unwrap_or(0);
        let absolute_day = self.absolute_day(tick);
        let day_of_year = absolute_day
            .checked_rem(self.config.days_per_year)
            .unwrap_or(0)
            .saturating_add(1);
        let year = absolute_day
            .checked_div(self.config.days_per_year)
            .unwrap_or(0)
            .saturating_add(1);
        GameTime {
            tick,
            minute: u32::try_from(minutes).unwrap_or(0),
            hour: self.hour(tick),
            day: u32::try_from(day_of_year).unwrap_or(u32::MAX),
            year: u32::try_from(year).unwrap_or(u32::MAX),
        }
    }

    /// In-game time at the current tick.
    pub fn now(&self) -> GameTime {
        self.time_at(self.tick)
    }
}

fn validate(config: &TimeConfig) -> Result<(), ClockError> {
    let units = [
        ("ticks_per_minute", config.ticks_per_minute),
        ("minutes_per_hour", config.minutes_per_hour),
        ("hours_per_day", config.hours_per_day),
        ("days_per_year", config.days_per_year),
    ];
    for (name, value) in units {
        if value == 0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("{name} must be at least 1"),
            });
        }
    }
    let hours = [
        ("start_hour", config.start_hour),
        ("day_start_hour", u64::from(config.day_start_hour)),
        ("night_start_hour", u64::from(config.night_start_hour)),
    ];
    for (name, value) in hours {
        if value >= config.hours_per_day {
            return Err(ClockError::InvalidConfig {
                reason: format!("{name} must be below hours_per_day ({})", config.hours_per_day),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    const HOUR: u64 = 600;
    const DAY: u64 = HOUR * 24;

    fn clock() -> SimulationClock {
        SimulationClock::new(TimeConfig::default()).unwrap()
    }

    #[test]
    fn hour_follows_tick_count() {
        let c = clock();
        for n in [0, 1, 599, 600, 5_999, 9_600, 14_399, 14_400, 100_000, 1_000_003] {
            let expected = u32::try_from((8 + n / 600) % 24).unwrap();
            assert_eq!(c.hour(n), expected, "tick {n}");
        }
    }

    #[test]
    fn minute_and_day_rollover() {
        let c = clock();
        let t = c.time_at(0);
        assert_eq!((t.minute, t.hour, t.day, t.year), (0, 8, 1, 1));
        assert_eq!(c.time_at(15).minute, 1);
        // Midnight is 16 hours after the 08:00 start.
        let midnight = 16 * HOUR;
        assert_eq!(c.time_at(midnight - 1).day, 1);
        let t = c.time_at(midnight);
        assert_eq!((t.hour, t.day), (0, 2));
    }

    #[test]
    fn day_increments_once_per_24_hours() {
        let c = clock();
        let mut changes = 0;
        let mut last = c.time_at(0).day;
        for n in (0..3 * DAY).step_by(60) {
            let day = c.time_at(n).day;
            if day != last {
                changes += 1;
                last = day;
            }
        }
        assert_eq!(changes, 3);
    }

    #[test]
    fn year_wraps_after_day_365() {
        let c = clock();
        let last_day = 16 * HOUR + 363 * DAY;
        let t = c.time_at(last_day);
        assert_eq!((t.day, t.year), (365, 1));
        let t = c.time_at(last_day + DAY);
        assert_eq!((t.day, t.year), (1, 2));
    }

    #[test]
    fn day_and_night_fire_once_per_day() {
        let mut c = clock();
        let mut days = Vec::new();
        let mut nights = Vec::new();
        for _ in 0..2 * DAY {
            let t = c.advance().unwrap();
            if t.day_started {
                days.push((t.absolute_day, t.time.hour));
            }
            if t.night_started {
                nights.push((t.absolute_day, t.time.hour));
            }
        }
        // Started at 08:00 on day 0, so the first morning is day 1.
        assert_eq!(days, vec![(1, 6), (2, 6)]);
        assert_eq!(nights, vec![(0, 20), (1, 20)]);
    }

    #[test]
    fn resumed_clock_does_not_refire_passed_boundaries() {
        // 21:00 on day 0: night already started.
        let mut c = SimulationClock::at_tick(TimeConfig::default(), 13 * HOUR).unwrap();
        let t = c.advance().unwrap();
        assert!(!t.night_started);
        assert!(!t.day_started);
    }

    #[test]
    fn zero_units_are_rejected() {
        let config = TimeConfig {
            ticks_per_minute: 0,
            ..TimeConfig::default()
        };
        assert!(matches!(
            SimulationClock::new(config),
            Err(ClockError::InvalidConfig { .. })
        ));
        let config = TimeConfig {
            start_hour: 24,
            ..TimeConfig::default()
        };
        assert!(SimulationClock::new(config).is_err());
    }

    #[test]
    fn overflow_is_an_error() {
        let mut c = SimulationClock::at_tick(TimeConfig::default(), u64::MAX).unwrap();
        assert!(matches!(c.advance(), Err(ClockError::TickOverflow)));
    }
}
