//! Async tick loop.
//!
//! The engine sits behind one `tokio::sync::Mutex`. Each tick locks it, runs
//! the whole synchronous tick, and releases it, so anything else holding
//! the same lock (API handlers) serializes against ticks. Ticks are paced
//! by a `tokio::time::interval` with [`MissedTickBehavior::Delay`], so a slow
//! tick pushes the schedule back instead of bursting to catch up.
//!
//! A stop request cancels the next tick; a tick already running finishes.
//! A tick error stops the loop and is returned: recovery is a restart from
//! the last snapshot.

use std::sync::Arc;
use std::time::Duration;

use metropolis_db::{MemoryStore, SnapshotStore, Store, StoreError};
use metropolis_types::TickEvent;
use tokio::sync::Mutex;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{error, info};

use crate::engine::{Engine, TickError};
use crate::operator::{OperatorState, SimulationEndReason};

/// Errors that stop the tick loop.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick failed.
    #[error("tick failed: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// Persisting a snapshot failed.
    #[error("snapshot failed: {source}")]
    Snapshot {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    /// Why the loop ended.
    pub end_reason: SimulationEndReason,
    /// Ticks executed during this run.
    pub ticks_run: u64,
    /// Last completed tick.
    pub last_tick: u64,
}

/// Called with the engine still locked after every tick and once on stop.
pub trait TickHook<S>: Send {
    /// After a tick completed.
    fn after_tick(&mut self, engine: &Engine<S>, event: &TickEvent) -> Result<(), StoreError>;

    /// After the loop stopped, whatever the reason.
    fn on_stop(&mut self, _engine: &Engine<S>) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHook;

impl<S> TickHook<S> for NoOpHook {
    fn after_tick(&mut self, _engine: &Engine<S>, _event: &TickEvent) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Saves a snapshot every `interval_ticks` ticks and once more on stop.
#[derive(Debug, Clone)]
pub struct SnapshotHook {
    snapshots: SnapshotStore,
    interval_ticks: u64,
}

impl SnapshotHook {
    /// Create a hook writing to `snapshots`.
    pub const fn new(snapshots: SnapshotStore, interval_ticks: u64) -> Self {
        Self {
            snapshots,
            interval_ticks,
        }
    }
}

impl TickHook<MemoryStore> for SnapshotHook {
    fn after_tick(
        &mut self,
        engine: &Engine<MemoryStore>,
        event: &TickEvent,
    ) -> Result<(), StoreError> {
        if self.interval_ticks > 0 && event.tick.checked_rem(self.interval_ticks) == Some(0) {
            engine.save_snapshot(&self.snapshots)?;
        }
        Ok(())
    }

    fn on_stop(&mut self, engine: &Engine<MemoryStore>) -> Result<(), StoreError> {
        engine.save_snapshot(&self.snapshots)?;
        info!(
            tick = engine.current_tick(),
            path = %self.snapshots.path().display(),
            "final snapshot saved"
        );
        Ok(())
    }
}

fn pacing(ms: u64) -> Interval {
    let mut interval = tokio::time::interval(Duration::from_millis(ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Run the tick loop until the operator stops it or the tick limit is hit.
///
/// # Errors
///
/// Returns [`RunnerError::Tick`] when a tick fails and
/// [`RunnerError::Snapshot`] when the hook cannot persist.
pub async fn run_engine<S>(
    engine: Arc<Mutex<Engine<S>>>,
    operator: &OperatorState,
    hook: &mut dyn TickHook<S>,
) -> Result<SimulationResult, RunnerError>
where
    S: Store + Send,
{
    let mut period = operator.tick_interval_ms();
    let mut interval = pacing(period);
    let mut ticks_run: u64 = 0;

    engine.lock().await.start();
    info!(
        tick_interval_ms = period,
        max_ticks = operator.max_ticks(),
        "simulation loop starting"
    );

    let end_reason = loop {
        if operator.is_paused() {
            info!("simulation paused, waiting for resume");
            operator.wait_if_paused().await;
            interval.reset();
            info!("simulation resumed");
        }

        let wanted = operator.tick_interval_ms();
        if wanted != period {
            period = wanted;
            interval = pacing(period);
        }

        if operator.is_stop_requested() {
            break SimulationEndReason::OperatorStop;
        }
        interval.tick().await;
        if operator.is_stop_requested() {
            break SimulationEndReason::OperatorStop;
        }

        let mut guard = engine.lock().await;
        let event = match guard.tick() {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, tick = guard.current_tick(), "tick failed, stopping");
                guard.stop();
                return Err(e.into());
            }
        };
        hook.after_tick(&guard, &event)?;
        drop(guard);

        ticks_run = ticks_run.saturating_add(1);
        if operator.tick_limit_reached(event.tick) {
            break SimulationEndReason::MaxTicksReached;
        }
    };

    let mut guard = engine.lock().await;
    guard.stop();
    hook.on_stop(&guard)?;
    let result = SimulationResult {
        end_reason,
        ticks_run,
        last_tick: guard.current_tick(),
    };
    drop(guard);
    log_simulation_end(&result);
    Ok(result)
}

/// Log a summary of a completed run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        end_reason = ?result.end_reason,
        ticks_run = result.ticks_run,
        last_tick = result.last_tick,
        "simulation ended"
    );
}
