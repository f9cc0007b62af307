//! Error types for the `metropolis-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use metropolis_db::StoreError;
use metropolis_types::{BuildingType, CityId, Coordinate, ParcelId, Terrain, Zoning};

/// Errors that can occur during world operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The storage layer failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// A city was not found.
    #[error("city not found: {0}")]
    CityNotFound(CityId),

    /// A parcel was not found.
    #[error("parcel not found: {0}")]
    ParcelNotFound(ParcelId),

    /// A coordinate lies outside the city grid.
    #[error("coordinate {0} is outside the grid")]
    OutOfBounds(Coordinate),

    /// The parcel already carries a building.
    #[error("parcel {0} is already built on")]
    ParcelOccupied(ParcelId),

    /// The building type is not allowed under the parcel's zoning.
    #[error("{building_type:?} is not allowed on {zoning:?} zoning")]
    ZoningMismatch {
        /// The rejected building type.
        building_type: BuildingType,
        /// The parcel's zoning.
        zoning: Option<Zoning>,
    },

    /// Nothing can be built on this terrain.
    #[error("cannot build on {0:?} terrain")]
    UnbuildableTerrain(Terrain),

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
