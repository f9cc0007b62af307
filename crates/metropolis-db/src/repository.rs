//! Repository traits: the storage interface every simulator talks to.
//!
//! Calls are synchronous. Getters return `Ok(None)` for a missing entity;
//! mutators return [`StoreError::NotFound`] when their target has vanished.
//! [`Store`] is the union of every repository and is what the engine holds.

use metropolis_types::{
    Agent, AgentId, Building, BuildingId, Candidate, CandidateId, CaseId, City, CityEconomy,
    CityId, Coordinate, CourtCase, DailyPipeline, Election, ElectionId, GameTime, InmateId,
    InmateStatus, JailInmate, Parcel, ParcelId, RentWarning, RentalUnit, RentalUnitId, Road,
    UserId, Vehicle, VehicleId, Vote, WarningId, WarningStatus, Watermarks,
};
use rust_decimal::Decimal;

use crate::error::StoreError;

/// Cities and their per-city state.
pub trait CityRepository {
    /// Fetch one city.
    fn get_city(&self, id: CityId) -> Result<Option<City>, StoreError>;

    /// All cities, in creation order.
    fn list_cities(&self) -> Result<Vec<City>, StoreError>;

    /// Insert a new city. Fails with a conflict if the id exists.
    fn insert_city(&mut self, city: City) -> Result<(), StoreError>;

    /// Persist the city's in-game time.
    fn update_city_time(&mut self, id: CityId, time: GameTime) -> Result<(), StoreError>;

    /// Persist the daily pipeline watermarks.
    fn set_watermarks(&mut self, id: CityId, watermarks: Watermarks) -> Result<(), StoreError>;

    /// Replace the city's economy settings.
    fn update_economy(&mut self, id: CityId, economy: CityEconomy) -> Result<(), StoreError>;

    /// Add `delta` (possibly negative) to the treasury and return the new
    /// balance.
    fn adjust_treasury(&mut self, id: CityId, delta: Decimal) -> Result<Decimal, StoreError>;

    /// Appoint (or clear) the city's mayor.
    fn set_mayor(&mut self, id: CityId, mayor: Option<UserId>) -> Result<(), StoreError>;

    /// Persist `day` as the watermark of `pipeline` before the pipeline runs.
    ///
    /// Returns `false` if that day already ran or the city is gone.
    fn claim_day(
        &mut self,
        id: CityId,
        pipeline: DailyPipeline,
        day: u64,
    ) -> Result<bool, StoreError> {
        let Some(city) = self.get_city(id)? else {
            return Ok(false);
        };
        let mut watermarks = city.watermarks;
        if !watermarks.claim(pipeline, day) {
            return Ok(false);
        }
        self.set_watermarks(id, watermarks)?;
        Ok(true)
    }
}

/// Land parcels.
pub trait ParcelRepository {
    /// Fetch one parcel.
    fn get_parcel(&self, id: ParcelId) -> Result<Option<Parcel>, StoreError>;

    /// The parcel at a coordinate, if any.
    fn parcel_at(&self, city: CityId, at: Coordinate) -> Result<Option<Parcel>, StoreError>;

    /// All parcels of a city.
    fn list_parcels(&self, city: CityId) -> Result<Vec<Parcel>, StoreError>;

    /// Insert a parcel. Fails with a conflict if the coordinate is taken.
    fn insert_parcel(&mut self, parcel: Parcel) -> Result<(), StoreError>;
}

/// Buildings.
pub trait BuildingRepository {
    /// Fetch one building.
    fn get_building(&self, id: BuildingId) -> Result<Option<Building>, StoreError>;

    /// All buildings of a city.
    fn list_buildings(&self, city: CityId) -> Result<Vec<Building>, StoreError>;

    /// Buildings of a city with progress below 100.
    fn list_incomplete_buildings(&self, city: CityId) -> Result<Vec<Building>, StoreError>;

    /// Insert a building.
    fn insert_building(&mut self, building: Building) -> Result<(), StoreError>;

    /// Write the grid supply flags.
    fn set_utilities(
        &mut self,
        id: BuildingId,
        powered: bool,
        has_water: bool,
    ) -> Result<(), StoreError>;

    /// Write construction progress.
    fn set_construction_progress(&mut self, id: BuildingId, progress: u8)
    -> Result<(), StoreError>;

    /// Remove a building.
    fn delete_building(&mut self, id: BuildingId) -> Result<(), StoreError>;
}

/// Road tiles.
pub trait RoadRepository {
    /// Fetch the road on a parcel.
    fn get_road(&self, parcel: ParcelId) -> Result<Option<Road>, StoreError>;

    /// All roads of a city.
    fn list_roads(&self, city: CityId) -> Result<Vec<Road>, StoreError>;

    /// Insert a road. Fails with a conflict if the parcel already has one.
    fn insert_road(&mut self, road: Road) -> Result<(), StoreError>;

    /// Write a road's traffic load.
    fn set_traffic_load(&mut self, parcel: ParcelId, load: f64) -> Result<(), StoreError>;
}

/// Residents.
pub trait AgentRepository {
    /// Fetch one agent.
    fn get_agent(&self, id: AgentId) -> Result<Option<Agent>, StoreError>;

    /// All agents of a city.
    fn list_agents(&self, city: CityId) -> Result<Vec<Agent>, StoreError>;

    /// Agents employed at a building.
    fn list_agents_working_at(&self, building: BuildingId) -> Result<Vec<Agent>, StoreError>;

    /// Insert an agent.
    fn insert_agent(&mut self, agent: Agent) -> Result<(), StoreError>;

    /// Replace an existing agent row.
    fn update_agent(&mut self, agent: &Agent) -> Result<(), StoreError>;

    /// Remove an agent.
    fn delete_agent(&mut self, id: AgentId) -> Result<(), StoreError>;
}

/// Vehicles.
pub trait VehicleRepository {
    /// All vehicles of a city.
    fn list_vehicles(&self, city: CityId) -> Result<Vec<Vehicle>, StoreError>;

    /// Insert a vehicle.
    fn insert_vehicle(&mut self, vehicle: Vehicle) -> Result<(), StoreError>;

    /// Replace an existing vehicle row.
    fn update_vehicle(&mut self, vehicle: &Vehicle) -> Result<(), StoreError>;

    /// Remove a vehicle.
    fn delete_vehicle(&mut self, id: VehicleId) -> Result<(), StoreError>;
}

/// Rental units and rent warnings.
pub trait RentalRepository {
    /// Fetch one unit.
    fn get_unit(&self, id: RentalUnitId) -> Result<Option<RentalUnit>, StoreError>;

    /// Units of a city that currently have a tenant.
    fn list_occupied_units(&self, city: CityId) -> Result<Vec<RentalUnit>, StoreError>;

    /// Insert a unit.
    fn insert_unit(&mut self, unit: RentalUnit) -> Result<(), StoreError>;

    /// Replace an existing unit row.
    fn update_unit(&mut self, unit: &RentalUnit) -> Result<(), StoreError>;

    /// Fetch one warning.
    fn get_warning(&self, id: WarningId) -> Result<Option<RentWarning>, StoreError>;

    /// Pending or escalated warnings for this unit and tenant.
    fn list_open_warnings(
        &self,
        unit: RentalUnitId,
        tenant: AgentId,
    ) -> Result<Vec<RentWarning>, StoreError>;

    /// Pending warnings of a city whose due date is at or before `now`.
    fn list_due_warnings(&self, city: CityId, now: u64) -> Result<Vec<RentWarning>, StoreError>;

    /// Insert a warning.
    fn insert_warning(&mut self, warning: RentWarning) -> Result<(), StoreError>;

    /// Change a warning's status.
    fn set_warning_status(&mut self, id: WarningId, status: WarningStatus)
    -> Result<(), StoreError>;
}

/// Court cases and jail records.
pub trait JusticeRepository {
    /// Fetch one case.
    fn get_case(&self, id: CaseId) -> Result<Option<CourtCase>, StoreError>;

    /// Pending cases of a city whose hearing is at or before `now`.
    fn list_due_cases(&self, city: CityId, now: u64) -> Result<Vec<CourtCase>, StoreError>;

    /// Insert a case.
    fn insert_case(&mut self, case: CourtCase) -> Result<(), StoreError>;

    /// Replace an existing case row.
    fn update_case(&mut self, case: &CourtCase) -> Result<(), StoreError>;

    /// Incarcerated inmates of a city whose release is at or before `now`.
    fn list_due_inmates(&self, city: CityId, now: u64) -> Result<Vec<JailInmate>, StoreError>;

    /// Insert a jail record.
    fn insert_inmate(&mut self, inmate: JailInmate) -> Result<(), StoreError>;

    /// Change a jail record's status.
    fn set_inmate_status(&mut self, id: InmateId, status: InmateStatus) -> Result<(), StoreError>;
}

/// Elections, candidates and ballots.
pub trait ElectionRepository {
    /// Fetch one election.
    fn get_election(&self, id: ElectionId) -> Result<Option<Election>, StoreError>;

    /// The city's election in nomination or voting, if any.
    fn active_election(&self, city: CityId) -> Result<Option<Election>, StoreError>;

    /// Every election in nomination or voting, across cities.
    fn list_active_elections(&self) -> Result<Vec<Election>, StoreError>;

    /// Insert an election. Fails with a conflict if the city already has an
    /// active one.
    fn insert_election(&mut self, election: Election) -> Result<(), StoreError>;

    /// Replace an existing election row.
    fn update_election(&mut self, election: &Election) -> Result<(), StoreError>;

    /// Fetch one candidate.
    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError>;

    /// Candidates of an election in registration order.
    fn list_candidates(&self, election: ElectionId) -> Result<Vec<Candidate>, StoreError>;

    /// Register a candidate. Fails with a conflict if the user already
    /// stands in this election.
    fn insert_candidate(&mut self, candidate: Candidate) -> Result<(), StoreError>;

    /// Whether `voter` has cast a ballot in `election`.
    fn has_voted(&self, election: ElectionId, voter: UserId) -> Result<bool, StoreError>;

    /// Ballots of an election.
    fn list_votes(&self, election: ElectionId) -> Result<Vec<Vote>, StoreError>;

    /// Record a ballot. Fails with a conflict on a second ballot from the
    /// same voter.
    fn insert_vote(&mut self, vote: Vote) -> Result<(), StoreError>;
}

/// The full storage interface.
pub trait Store:
    CityRepository
    + ParcelRepository
    + BuildingRepository
    + RoadRepository
    + AgentRepository
    + VehicleRepository
    + RentalRepository
    + JusticeRepository
    + ElectionRepository
{
}

impl<T> Store for T where
    T: CityRepository
        + ParcelRepository
        + BuildingRepository
        + RoadRepository
        + AgentRepository
        + VehicleRepository
        + RentalRepository
        + JusticeRepository
        + ElectionRepository
{
}
