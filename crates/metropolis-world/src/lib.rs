//! City grid, utilities, routing and construction for the Metropolis
//! simulation.
//!
//! This crate models the physical city: the canonical building catalog, the
//! binary power/water grid, A* routing for cars over roads and for
//! pedestrians over the open grid, construction progress, and the default
//! starting layout.
//!
//! # Modules
//!
//! - [`catalog`] -- Cost, build time and utility draw per building type.
//! - [`construction`] -- [`ConstructionSimulator`] and building placement.
//! - [`error`] -- Error types for world operations.
//! - [`resource_grid`] -- [`ResourceGridSimulator`]: all-or-nothing rationing.
//! - [`road_path`] -- [`RoadPathfinder`]: traffic-aware road routing.
//! - [`walk_path`] -- [`WalkingPathfinder`]: 8-directional walking routes.
//! - [`starting_city`] -- Default starting city for a fresh run.

pub mod catalog;
pub mod construction;
pub mod error;
pub mod resource_grid;
pub mod road_path;
pub mod starting_city;
pub mod walk_path;

// Re-export primary types at crate root.
pub use catalog::{BuildingSpec, spec};
pub use construction::{ConstructionSimulator, place_building, place_road};
pub use error::WorldError;
pub use resource_grid::{GridReport, ResourceGridSimulator};
pub use road_path::RoadPathfinder;
pub use starting_city::{StartingCity, create_starting_city};
pub use walk_path::WalkingPathfinder;
