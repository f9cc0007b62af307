//! Shared type definitions for the Metropolis simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Metropolis workspace. Types that a client renders flow downstream to
//! `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (terrain, zoning, buildings, states)
//! - [`structs`] -- Core entity structs (city, parcels, agents, justice, elections)
//! - [`events`] -- Tick events and subscriber notifications
//! - [`gate`] -- The once-per-period gate behind every daily pipeline

pub mod enums;
pub mod events;
pub mod gate;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    ActivityKind, AgentState, BuildingType, CaseStatus, CreditRating, DailyPipeline, Density,
    ElectionStatus, InmateStatus, RoadDirection, Sector, Sentence, Terrain, UnitStatus, Verdict,
    WarningStatus, Zoning,
};
pub use events::{EngineNotification, SimEvent, TickEvent};
pub use gate::PeriodGate;
pub use ids::{
    AgentId, BondId, BuildingId, CandidateId, CaseId, CityId, ElectionId, InmateId, ParcelId,
    RentalUnitId, UserId, VehicleId, WarningId,
};
pub use structs::{
    ActivityEntry, Agent, Bond, Building, Candidate, City, CityEconomy, Coordinate, CourtCase,
    DepartmentFunding, Election, GameTime, JailInmate, Parcel, Position, RentWarning, RentalUnit,
    Road, Schedule, Vehicle, Vote, Watermarks,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to the `bindings/` directory relative to the
        // crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::CityId::export_all();
        let _ = crate::ids::ParcelId::export_all();
        let _ = crate::ids::BuildingId::export_all();
        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::VehicleId::export_all();
        let _ = crate::ids::UserId::export_all();
        let _ = crate::ids::RentalUnitId::export_all();
        let _ = crate::ids::WarningId::export_all();
        let _ = crate::ids::CaseId::export_all();
        let _ = crate::ids::InmateId::export_all();
        let _ = crate::ids::ElectionId::export_all();
        let _ = crate::ids::CandidateId::export_all();
        let _ = crate::ids::BondId::export_all();

        // Enums
        let _ = crate::enums::Terrain::export_all();
        let _ = crate::enums::Zoning::export_all();
        let _ = crate::enums::BuildingType::export_all();
        let _ = crate::enums::Sector::export_all();
        let _ = crate::enums::Density::export_all();
        let _ = crate::enums::RoadDirection::export_all();
        let _ = crate::enums::AgentState::export_all();
        let _ = crate::enums::UnitStatus::export_all();
        let _ = crate::enums::WarningStatus::export_all();
        let _ = crate::enums::CaseStatus::export_all();
        let _ = crate::enums::Verdict::export_all();
        let _ = crate::enums::Sentence::export_all();
        let _ = crate::enums::InmateStatus::export_all();
        let _ = crate::enums::ElectionStatus::export_all();
        let _ = crate::enums::CreditRating::export_all();
        let _ = crate::enums::ActivityKind::export_all();

        // Structs and events
        let _ = crate::structs::Coordinate::export_all();
        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::GameTime::export_all();
        let _ = crate::events::SimEvent::export_all();
        let _ = crate::events::TickEvent::export_all();
        let _ = crate::events::EngineNotification::export_all();
    }
}
