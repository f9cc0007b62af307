//! Engine core for the Metropolis simulation.
//!
//! This crate ties the simulators together into one tick:
//!
//! - [`clock`] maps ticks onto in-game minutes, hours, days and years.
//! - [`config`] loads `metropolis-config.yaml`.
//! - [`engine`] owns the store and runs the ordered tick.
//! - [`publisher`] delivers notifications to registered subscribers.
//! - [`operator`] holds pause, resume, speed and stop controls.
//! - [`runner`] paces ticks on a tokio interval.

pub mod clock;
pub mod config;
pub mod engine;
pub mod operator;
pub mod publisher;
pub mod runner;

pub use clock::{ClockError, ClockTick, SimulationClock};
pub use config::{ConfigError, SimulationConfig};
pub use engine::{Engine, TickError};
pub use metropolis_types::PeriodGate;
pub use operator::{OperatorState, SimulationEndReason};
pub use publisher::{BroadcastSubscriber, EngineSubscriber, Publisher, SubscriberId};
pub use runner::{NoOpHook, RunnerError, SimulationResult, SnapshotHook, TickHook, run_engine};
