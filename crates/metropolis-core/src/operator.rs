//! Operator controls shared between the tick loop and whoever drives it.
//!
//! All fields are atomics (plus one [`Notify`]) so the runner can read them
//! every tick without taking a lock. Stopping lets an in-flight tick finish
//! and cancels the next one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Notify;

/// Shortest tick interval the operator may set.
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Why the tick loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulationEndReason {
    /// The configured tick limit was reached.
    MaxTicksReached,
    /// An operator asked the loop to stop.
    OperatorStop,
}

/// Shared operator control state.
///
/// Wrap in an `Arc` and hand clones to the runner and the control surface.
#[derive(Debug)]
pub struct OperatorState {
    paused: AtomicBool,
    resume_notify: Notify,
    stop_requested: AtomicBool,
    tick_interval_ms: AtomicU64,
    /// Last tick to run (0 = unlimited).
    max_ticks: u64,
    started_at: DateTime<Utc>,
}

impl OperatorState {
    /// Create operator state with a tick interval and an optional tick
    /// limit (0 = unlimited).
    pub fn new(tick_interval_ms: u64, max_ticks: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms.max(MIN_TICK_INTERVAL_MS)),
            max_ticks,
            started_at: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause before the next tick.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
        tracing::info!("operator paused simulation");
    }

    /// Resume and wake the loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
        tracing::info!("operator resumed simulation");
    }

    /// Wait while paused. A stop request also ends the wait.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Ask the loop to stop after the current tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume_notify.notify_one();
        tracing::info!("operator requested stop");
    }

    /// Whether a stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Tick speed
    // -----------------------------------------------------------------------

    /// Current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the tick interval.
    ///
    /// Returns the previous interval, or `None` if `ms` is below
    /// [`MIN_TICK_INTERVAL_MS`].
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        let prev = self.tick_interval_ms.swap(ms, Ordering::AcqRel);
        tracing::info!(from = prev, to = ms, "operator changed tick interval");
        Some(prev)
    }

    // -----------------------------------------------------------------------
    // Bounds
    // -----------------------------------------------------------------------

    /// Configured tick limit (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Whether `tick` has reached the tick limit.
    pub const fn tick_limit_reached(&self, tick: u64) -> bool {
        self.max_ticks > 0 && tick >= self.max_ticks
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Snapshot of the controls for display.
    pub fn status(&self, tick: u64) -> OperatorStatus {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        OperatorStatus {
            tick,
            paused: self.is_paused(),
            stop_requested: self.is_stop_requested(),
            tick_interval_ms: self.tick_interval_ms(),
            elapsed_seconds: u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX),
            max_ticks: self.max_ticks,
        }
    }
}

/// Serializable view of the operator controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorStatus {
    /// Last completed tick.
    pub tick: u64,
    /// Whether the loop is paused.
    pub paused: bool,
    /// Whether a stop was requested.
    pub stop_requested: bool,
    /// Current tick interval.
    pub tick_interval_ms: u64,
    /// Wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// Tick limit (0 = unlimited).
    pub max_ticks: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn initial_state_is_running() {
        let state = OperatorState::new(100, 0);
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
        assert!(!state.tick_limit_reached(1_000_000));
    }

    #[test]
    fn pause_and_resume() {
        let state = OperatorState::new(100, 0);
        state.pause();
        assert!(state.is_paused());
        state.resume();
        assert!(!state.is_paused());
    }

    #[test]
    fn tick_interval_changes_are_bounded() {
        let state = OperatorState::new(100, 0);
        assert_eq!(state.set_tick_interval_ms(250), Some(100));
        assert_eq!(state.tick_interval_ms(), 250);
        assert_eq!(state.set_tick_interval_ms(1), None);
        assert_eq!(state.tick_interval_ms(), 250);
    }

    #[test]
    fn tick_limit() {
        let state = OperatorState::new(100, 10);
        assert!(!state.tick_limit_reached(9));
        assert!(state.tick_limit_reached(10));
        assert_eq!(state.status(4).max_ticks, 10);
    }

    #[tokio::test]
    async fn resume_wakes_waiter() {
        let state = Arc::new(OperatorState::new(100, 0));
        state.pause();
        let waiter = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.wait_if_paused().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        state.resume();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn stop_ends_pause() {
        let state = OperatorState::new(100, 0);
        state.pause();
        state.request_stop();
        tokio::time::timeout(Duration::from_secs(1), state.wait_if_paused())
            .await
            .unwrap();
    }
}
