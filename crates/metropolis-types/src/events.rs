//! Events produced by one simulation tick and the notifications delivered
//! to engine subscribers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{CreditRating, ElectionStatus, Verdict};
use crate::ids::{
    AgentId, BuildingId, CaseId, CityId, ElectionId, RentalUnitId, UserId, VehicleId, WarningId,
};
use crate::structs::{Coordinate, GameTime, Position};

/// A state change observed during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SimEvent {
    /// An agent reached an intermediate waypoint.
    AgentMoved {
        /// The agent.
        agent_id: AgentId,
        /// Position after the move.
        position: Position,
    },
    /// An agent reached the end of its path.
    AgentArrived {
        /// The agent.
        agent_id: AgentId,
        /// Tile arrived at.
        destination: Coordinate,
    },
    /// A vehicle reached an intermediate waypoint.
    VehicleMoved {
        /// The vehicle.
        vehicle_id: VehicleId,
        /// Position after the move.
        position: Position,
    },
    /// A vehicle reached the end of its path.
    VehicleArrived {
        /// The vehicle.
        vehicle_id: VehicleId,
        /// Tile arrived at.
        destination: Coordinate,
    },
    /// A building reached 100% construction progress.
    ConstructionCompleted {
        /// The building.
        building_id: BuildingId,
    },
    /// The utility grids were recomputed.
    GridUpdated {
        /// Power capacity.
        power_capacity: u64,
        /// Power demand.
        power_demand: u64,
        /// Water capacity.
        water_capacity: u64,
        /// Water demand.
        water_demand: u64,
        /// Buildings whose flags changed.
        changed: u32,
    },
    /// Residents left the city because of high residential tax.
    ResidentsLeft {
        /// Number of residents removed.
        count: u32,
    },
    /// Office salaries were cut because of high commercial tax.
    SalariesCut {
        /// Number of residents affected.
        count: u32,
    },
    /// An industrial building was demolished because of high industrial tax.
    BuildingDestroyed {
        /// The building.
        building_id: BuildingId,
    },
    /// A tenant was warned about unpaid rent.
    RentWarningIssued {
        /// The warning.
        warning_id: WarningId,
        /// The unit.
        unit_id: RentalUnitId,
        /// The tenant.
        tenant_id: AgentId,
    },
    /// An overdue warning became a court case.
    CourtCaseOpened {
        /// The case.
        case_id: CaseId,
        /// The defendant.
        defendant_id: AgentId,
    },
    /// A court case was decided.
    CaseAdjudicated {
        /// The case.
        case_id: CaseId,
        /// The outcome.
        verdict: Verdict,
    },
    /// A tenant was evicted and jailed.
    TenantJailed {
        /// The agent.
        agent_id: AgentId,
        /// Tick of release.
        release_date: u64,
    },
    /// An inmate was released.
    InmateReleased {
        /// The agent.
        agent_id: AgentId,
    },
    /// An election moved to a new phase.
    ElectionPhaseChanged {
        /// The election.
        election_id: ElectionId,
        /// The new phase.
        status: ElectionStatus,
    },
    /// An election finished with a winner who is now mayor.
    MayorElected {
        /// The city.
        city_id: CityId,
        /// The new mayor.
        user_id: UserId,
    },
    /// The city's credit rating changed.
    CreditRatingChanged {
        /// Previous rating.
        from: CreditRating,
        /// New rating.
        to: CreditRating,
    },
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TickEvent {
    /// The tick number.
    pub tick: u64,
    /// In-game time after the tick.
    pub time: GameTime,
    /// Events in the order they occurred.
    pub events: Vec<SimEvent>,
}

/// Notification delivered to engine subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EngineNotification {
    /// The tick loop started.
    Started {
        /// Tick the loop resumed from.
        tick: u64,
    },
    /// A tick completed.
    Tick(TickEvent),
    /// The clock reached morning on a new day.
    DayStarted {
        /// Absolute day number.
        day: u64,
    },
    /// The clock reached evening.
    NightStarted {
        /// Absolute day number.
        day: u64,
    },
    /// The tick loop stopped.
    Stopped {
        /// Last completed tick.
        tick: u64,
    },
}
