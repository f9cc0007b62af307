//! Engine subscriber that writes notifications to the tracing log.
//!
//! Every simulation event is logged as one structured line carrying the
//! event as JSON. Quiet ticks produce a periodic heartbeat instead.

use metropolis_core::EngineSubscriber;
use metropolis_types::{EngineNotification, TickEvent};
use tracing::{debug, info};

/// Logs engine notifications.
#[derive(Debug, Clone)]
pub struct LogSubscriber {
    heartbeat_every: u64,
}

impl LogSubscriber {
    /// Log a heartbeat every `heartbeat_every` ticks (0 disables it).
    pub const fn new(heartbeat_every: u64) -> Self {
        Self { heartbeat_every }
    }

    fn log_tick(&self, tick: &TickEvent) {
        for event in &tick.events {
            let payload = serde_json::to_string(event).unwrap_or_default();
            info!(tick = tick.tick, event = %payload, "simulation event");
        }
        if self.heartbeat_every > 0 && tick.tick.checked_rem(self.heartbeat_every) == Some(0) {
            debug!(
                tick = tick.tick,
                year = tick.time.year,
                day = tick.time.day,
                hour = tick.time.hour,
                minute = tick.time.minute,
                "heartbeat"
            );
        }
    }
}

impl EngineSubscriber for LogSubscriber {
    fn notify(&mut self, notification: &EngineNotification) {
        match notification {
            EngineNotification::Tick(tick) => self.log_tick(tick),
            EngineNotification::Started { tick } => info!(tick, "tick loop started"),
            EngineNotification::Stopped { tick } => info!(tick, "tick loop stopped"),
            EngineNotification::DayStarted { day } => info!(day, "morning"),
            EngineNotification::NightStarted { day } => info!(day, "evening"),
        }
    }
}
