//! Residents, vehicles and civic processes for the Metropolis simulation.
//!
//! - [`movement`]: resident walking and the daily commute
//! - [`vehicles`]: vehicle movement and road traffic loads
//! - [`justice`]: the daily rent, court and jail pipeline
//! - [`governance`]: mayoral elections
//!
//! Simulators read and write through the repository traits of
//! `metropolis-db` and return the [`SimEvent`](metropolis_types::SimEvent)s
//! they produced. Scheduling (which tick, which day) is the engine's job.

pub mod config;
pub mod error;
pub mod governance;
pub mod justice;
pub mod movement;
pub mod vehicles;

pub use config::{GovernanceConfig, JusticeConfig, MovementConfig};
pub use error::{AgentError, GovernanceError};
pub use governance::ElectionService;
pub use justice::{JusticeStore, RentEnforcementSimulator, record_rent_payment};
pub use movement::{Advance, AgentSimulator, advance_along, building_tile, route};
pub use vehicles::{VehicleSimulator, dispatch_vehicle};
