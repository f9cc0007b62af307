//! Storage layer for the Metropolis simulation.
//!
//! Simulators never touch a concrete database. They talk to the
//! repository traits in [`repository`]; the engine holds one [`Store`]
//! implementation for the whole run.
//!
//! # Architecture
//!
//! ```text
//! Tick Execution
//!     |
//!     +-- Read/write via repository traits --> MemoryStore
//!     |
//!     +-- Every N ticks -------------------> SnapshotStore (JSON file)
//!     |
//!     +-- Notable transitions -------------> ActivityLogger
//! ```
//!
//! # Modules
//!
//! - [`repository`] -- Per-entity repository traits and the [`Store`] union
//! - [`memory`] -- `BTreeMap`-backed implementation of every repository
//! - [`snapshot_store`] -- Atomic JSON snapshots for restart/resume
//! - [`activity`] -- Activity-feed sink and implementations
//! - [`error`] -- Shared error types

pub mod activity;
pub mod error;
pub mod memory;
pub mod repository;
pub mod snapshot_store;

// Re-export primary types for convenience.
pub use activity::{ActivityLogger, RecordingActivityLogger, TracingActivityLogger};
pub use error::{StoreError, StoreResultExt};
pub use memory::MemoryStore;
pub use repository::{
    AgentRepository, BuildingRepository, CityRepository, ElectionRepository, JusticeRepository,
    ParcelRepository, RentalRepository, RoadRepository, Store, VehicleRepository,
};
pub use snapshot_store::{SNAPSHOT_FORMAT_VERSION, Snapshot, SnapshotStore};
