//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the city has a strongly-typed ID so that a building ID
//! can never be passed where an agent ID is expected. All IDs use UUID v7
//! (time-ordered), which keeps `BTreeMap` iteration in creation order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a city (one simulated world).
    CityId
}

define_id! {
    /// Unique identifier for a land parcel (one grid tile).
    ParcelId
}

define_id! {
    /// Unique identifier for a building placed on a parcel.
    BuildingId
}

define_id! {
    /// Unique identifier for a simulated resident.
    AgentId
}

define_id! {
    /// Unique identifier for a simulated vehicle.
    VehicleId
}

define_id! {
    /// Unique identifier for a human player (landowner, candidate, voter).
    UserId
}

define_id! {
    /// Unique identifier for a rentable unit inside a building.
    RentalUnitId
}

define_id! {
    /// Unique identifier for an unpaid-rent warning.
    WarningId
}

define_id! {
    /// Unique identifier for a court case.
    CaseId
}

define_id! {
    /// Unique identifier for a jail record.
    InmateId
}

define_id! {
    /// Unique identifier for a mayoral election.
    ElectionId
}

define_id! {
    /// Unique identifier for a candidate registration.
    CandidateId
}

define_id! {
    /// Unique identifier for a municipal bond.
    BondId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let agent = AgentId::new();
        let building = BuildingId::new();
        assert_ne!(agent.into_inner(), Uuid::nil());
        assert_ne!(building.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = CityId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<CityId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }
}
