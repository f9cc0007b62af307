//! In-memory implementation of every repository.
//!
//! [`MemoryStore`] keeps each table in a `BTreeMap` keyed by its UUID v7
//! id, so iteration follows creation order. The whole store serializes to
//! JSON, which is how [`crate::snapshot_store`] persists it between runs.

use std::collections::BTreeMap;

use metropolis_types::{
    Agent, AgentId, Building, BuildingId, Candidate, CandidateId, CaseId, CaseStatus, City,
    CityEconomy, CityId, Coordinate, CourtCase, Election, ElectionId, GameTime, InmateId,
    InmateStatus, JailInmate, Parcel, ParcelId, RentWarning, RentalUnit, RentalUnitId, Road,
    UserId, Vehicle, VehicleId, Vote, WarningId, WarningStatus, Watermarks,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::repository::{
    AgentRepository, BuildingRepository, CityRepository, ElectionRepository, JusticeRepository,
    ParcelRepository, RentalRepository, RoadRepository, VehicleRepository,
};

/// Every table of the simulation, held in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    cities: BTreeMap<CityId, City>,
    parcels: BTreeMap<ParcelId, Parcel>,
    buildings: BTreeMap<BuildingId, Building>,
    roads: BTreeMap<ParcelId, Road>,
    agents: BTreeMap<AgentId, Agent>,
    vehicles: BTreeMap<VehicleId, Vehicle>,
    units: BTreeMap<RentalUnitId, RentalUnit>,
    warnings: BTreeMap<WarningId, RentWarning>,
    cases: BTreeMap<CaseId, CourtCase>,
    inmates: BTreeMap<InmateId, JailInmate>,
    elections: BTreeMap<ElectionId, Election>,
    candidates: BTreeMap<CandidateId, Candidate>,
    votes: Vec<Vote>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn city_mut(&mut self, id: CityId) -> Result<&mut City, StoreError> {
        self.cities
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("city", id))
    }

    fn building_mut(&mut self, id: BuildingId) -> Result<&mut Building, StoreError> {
        self.buildings
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("building", id))
    }
}

/// Replace `slot` with `value`, or report the entity as missing.
fn replace<T: Clone>(
    slot: Option<&mut T>,
    value: &T,
    entity: &'static str,
    id: impl ToString,
) -> Result<(), StoreError> {
    let slot = slot.ok_or_else(|| StoreError::not_found(entity, id))?;
    slot.clone_from(value);
    Ok(())
}

impl CityRepository for MemoryStore {
    fn get_city(&self, id: CityId) -> Result<Option<City>, StoreError> {
        Ok(self.cities.get(&id).cloned())
    }

    fn list_cities(&self) -> Result<Vec<City>, StoreError> {
        Ok(self.cities.values().cloned().collect())
    }

    fn insert_city(&mut self, city: City) -> Result<(), StoreError> {
        if self.cities.contains_key(&city.id) {
            return Err(StoreError::conflict("city", format!("{} exists", city.id)));
        }
        self.cities.insert(city.id, city);
        Ok(())
    }

    fn update_city_time(&mut self, id: CityId, time: GameTime) -> Result<(), StoreError> {
        self.city_mut(id)?.time = time;
        Ok(())
    }

    fn set_watermarks(&mut self, id: CityId, watermarks: Watermarks) -> Result<(), StoreError> {
        self.city_mut(id)?.watermarks = watermarks;
        Ok(())
    }

    fn update_economy(&mut self, id: CityId, economy: CityEconomy) -> Result<(), StoreError> {
        self.city_mut(id)?.economy = economy;
        Ok(())
    }

    fn adjust_treasury(&mut self, id: CityId, delta: Decimal) -> Result<Decimal, StoreError> {
        let city = self.city_mut(id)?;
        let balance = city
            .treasury
            .checked_add(delta)
            .ok_or_else(|| StoreError::conflict("city", "treasury overflow"))?;
        city.treasury = balance;
        Ok(balance)
    }

    fn set_mayor(&mut self, id: CityId, mayor: Option<UserId>) -> Result<(), StoreError> {
        self.city_mut(id)?.mayor_id = mayor;
        Ok(())
    }
}

impl ParcelRepository for MemoryStore {
    fn get_parcel(&self, id: ParcelId) -> Result<Option<Parcel>, StoreError> {
        Ok(self.parcels.get(&id).cloned())
    }

    fn parcel_at(&self, city: CityId, at: Coordinate) -> Result<Option<Parcel>, StoreError> {
        Ok(self
            .parcels
            .values()
            .find(|p| p.city_id == city && p.coordinate == at)
            .cloned())
    }

    fn list_parcels(&self, city: CityId) -> Result<Vec<Parcel>, StoreError> {
        Ok(self
            .parcels
            .values()
            .filter(|p| p.city_id == city)
            .cloned()
            .collect())
    }

    fn insert_parcel(&mut self, parcel: Parcel) -> Result<(), StoreError> {
        if self.parcel_at(parcel.city_id, parcel.coordinate)?.is_some() {
            return Err(StoreError::conflict(
                "parcel",
                format!("coordinate {} taken", parcel.coordinate),
            ));
        }
        self.parcels.insert(parcel.id, parcel);
        Ok(())
    }
}

impl BuildingRepository for MemoryStore {
    fn get_building(&self, id: BuildingId) -> Result<Option<Building>, StoreError> {
        Ok(self.buildings.get(&id).cloned())
    }

    fn list_buildings(&self, city: CityId) -> Result<Vec<Building>, StoreError> {
        Ok(self
            .buildings
            .values()
            .filter(|b| b.city_id == city)
            .cloned()
            .collect())
    }

    fn list_incomplete_buildings(&self, city: CityId) -> Result<Vec<Building>, StoreError> {
        Ok(self
            .buildings
            .values()
            .filter(|b| b.city_id == city && !b.is_complete())
            .cloned()
            .collect())
    }

    fn insert_building(&mut self, building: Building) -> Result<(), StoreError> {
        self.buildings.insert(building.id, building);
        Ok(())
    }

    fn set_utilities(
        &mut self,
        id: BuildingId,
        powered: bool,
        has_water: bool,
    ) -> Result<(), StoreError> {
        let building = self.building_mut(id)?;
        building.powered = powered;
        building.has_water = has_water;
        Ok(())
    }

    fn set_construction_progress(
        &mut self,
        id: BuildingId,
        progress: u8,
    ) -> Result<(), StoreError> {
        self.building_mut(id)?.construction_progress = progress.min(100);
        Ok(())
    }

    fn delete_building(&mut self, id: BuildingId) -> Result<(), StoreError> {
        self.buildings
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("building", id))
    }
}

impl RoadRepository for MemoryStore {
    fn get_road(&self, parcel: ParcelId) -> Result<Option<Road>, StoreError> {
        Ok(self.roads.get(&parcel).cloned())
    }

    fn list_roads(&self, city: CityId) -> Result<Vec<Road>, StoreError> {
        Ok(self
            .roads
            .values()
            .filter(|r| r.city_id == city)
            .cloned()
            .collect())
    }

    fn insert_road(&mut self, road: Road) -> Result<(), StoreError> {
        if self.roads.contains_key(&road.parcel_id) {
            return Err(StoreError::conflict(
                "road",
                format!("parcel {} already has a road", road.parcel_id),
            ));
        }
        self.roads.insert(road.parcel_id, road);
        Ok(())
    }

    fn set_traffic_load(&mut self, parcel: ParcelId, load: f64) -> Result<(), StoreError> {
        let road = self
            .roads
            .get_mut(&parcel)
            .ok_or_else(|| StoreError::not_found("road", parcel))?;
        road.traffic_load = load.clamp(0.0, 1.0);
        Ok(())
    }
}

impl AgentRepository for MemoryStore {
    fn get_agent(&self, id: AgentId) -> Result<Option<Agent>, StoreError> {
        Ok(self.agents.get(&id).cloned())
    }

    fn list_agents(&self, city: CityId) -> Result<Vec<Agent>, StoreError> {
        Ok(self
            .agents
            .values()
            .filter(|a| a.city_id == city)
            .cloned()
            .collect())
    }

    fn list_agents_working_at(&self, building: BuildingId) -> Result<Vec<Agent>, StoreError> {
        Ok(self
            .agents
            .values()
            .filter(|a| a.work_building_id == Some(building))
            .cloned()
            .collect())
    }

    fn insert_agent(&mut self, agent: Agent) -> Result<(), StoreError> {
        self.agents.insert(agent.id, agent);
        Ok(())
    }

    fn update_agent(&mut self, agent: &Agent) -> Result<(), StoreError> {
        replace(self.agents.get_mut(&agent.id), agent, "agent", agent.id)
    }

    fn delete_agent(&mut self, id: AgentId) -> Result<(), StoreError> {
        self.agents
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("agent", id))
    }
}

impl VehicleRepository for MemoryStore {
    fn list_vehicles(&self, city: CityId) -> Result<Vec<Vehicle>, StoreError> {
        Ok(self
            .vehicles
            .values()
            .filter(|v| v.city_id == city)
            .cloned()
            .collect())
    }

    fn insert_vehicle(&mut self, vehicle: Vehicle) -> Result<(), StoreError> {
        self.vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }

    fn update_vehicle(&mut self, vehicle: &Vehicle) -> Result<(), StoreError> {
        replace(
            self.vehicles.get_mut(&vehicle.id),
            vehicle,
            "vehicle",
            vehicle.id,
        )
    }

    fn delete_vehicle(&mut self, id: VehicleId) -> Result<(), StoreError> {
        self.vehicles
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("vehicle", id))
    }
}

impl RentalRepository for MemoryStore {
    fn get_unit(&self, id: RentalUnitId) -> Result<Option<RentalUnit>, StoreError> {
        Ok(self.units.get(&id).cloned())
    }

    fn list_occupied_units(&self, city: CityId) -> Result<Vec<RentalUnit>, StoreError> {
        Ok(self
            .units
            .values()
            .filter(|u| u.city_id == city && u.tenant_id.is_some())
            .cloned()
            .collect())
    }

    fn insert_unit(&mut self, unit: RentalUnit) -> Result<(), StoreError> {
        self.units.insert(unit.id, unit);
        Ok(())
    }

    fn update_unit(&mut self, unit: &RentalUnit) -> Result<(), StoreError> {
        replace(self.units.get_mut(&unit.id), unit, "rental unit", unit.id)
    }

    fn get_warning(&self, id: WarningId) -> Result<Option<RentWarning>, StoreError> {
        Ok(self.warnings.get(&id).cloned())
    }

    fn list_open_warnings(
        &self,
        unit: RentalUnitId,
        tenant: AgentId,
    ) -> Result<Vec<RentWarning>, StoreError> {
        Ok(self
            .warnings
            .values()
            .filter(|w| {
                w.unit_id == unit
                    && w.tenant_id == tenant
                    && matches!(w.status, WarningStatus::Pending | WarningStatus::Escalated)
            })
            .cloned()
            .collect())
    }

    fn list_due_warnings(&self, city: CityId, now: u64) -> Result<Vec<RentWarning>, StoreError> {
        Ok(self
            .warnings
            .values()
            .filter(|w| w.city_id == city && w.status == WarningStatus::Pending && w.due_date <= now)
            .cloned()
            .collect())
    }

    fn insert_warning(&mut self, warning: RentWarning) -> Result<(), StoreError> {
        self.warnings.insert(warning.id, warning);
        Ok(())
    }

    fn set_warning_status(
        &mut self,
        id: WarningId,
        status: WarningStatus,
    ) -> Result<(), StoreError> {
        let warning = self
            .warnings
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("rent warning", id))?;
        warning.status = status;
        Ok(())
    }
}

impl JusticeRepository for MemoryStore {
    fn get_case(&self, id: CaseId) -> Result<Option<CourtCase>, StoreError> {
        Ok(self.cases.get(&id).cloned())
    }

    fn list_due_cases(&self, city: CityId, now: u64) -> Result<Vec<CourtCase>, StoreError> {
        Ok(self
            .cases
            .values()
            .filter(|c| {
                c.city_id == city
                    && c.status == CaseStatus::Pending
                    && c.hearing_date.is_some_and(|h| h <= now)
            })
            .cloned()
            .collect())
    }

    fn insert_case(&mut self, case: CourtCase) -> Result<(), StoreError> {
        self.cases.insert(case.id, case);
        Ok(())
    }

    fn update_case(&mut self, case: &CourtCase) -> Result<(), StoreError> {
        replace(self.cases.get_mut(&case.id), case, "court case", case.id)
    }

    fn list_due_inmates(&self, city: CityId, now: u64) -> Result<Vec<JailInmate>, StoreError> {
        Ok(self
            .inmates
            .values()
            .filter(|i| {
                i.city_id == city
                    && i.status == InmateStatus::Incarcerated
                    && i.release_date <= now
            })
            .cloned()
            .collect())
    }

    fn insert_inmate(&mut self, inmate: JailInmate) -> Result<(), StoreError> {
        self.inmates.insert(inmate.id, inmate);
        Ok(())
    }

    fn set_inmate_status(&mut self, id: InmateId, status: InmateStatus) -> Result<(), StoreError> {
        let inmate = self
            .inmates
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("inmate", id))?;
        inmate.status = status;
        Ok(())
    }
}

impl ElectionRepository for MemoryStore {
    fn get_election(&self, id: ElectionId) -> Result<Option<Election>, StoreError> {
        Ok(self.elections.get(&id).cloned())
    }

    fn active_election(&self, city: CityId) -> Result<Option<Election>, StoreError> {
        Ok(self
            .elections
            .values()
            .find(|e| e.city_id == city && e.status.is_active())
            .cloned())
    }

    fn list_active_elections(&self) -> Result<Vec<Election>, StoreError> {
        Ok(self
            .elections
            .values()
            .filter(|e| e.status.is_active())
            .cloned()
            .collect())
    }

    fn insert_election(&mut self, election: Election) -> Result<(), StoreError> {
        if self.active_election(election.city_id)?.is_some() {
            return Err(StoreError::conflict(
                "election",
                format!("city {} already has an active election", election.city_id),
            ));
        }
        self.elections.insert(election.id, election);
        Ok(())
    }

    fn update_election(&mut self, election: &Election) -> Result<(), StoreError> {
        replace(
            self.elections.get_mut(&election.id),
            election,
            "election",
            election.id,
        )
    }

    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        Ok(self.candidates.get(&id).cloned())
    }

    fn list_candidates(&self, election: ElectionId) -> Result<Vec<Candidate>, StoreError> {
        let mut candidates: Vec<Candidate> = self
            .candidates
            .values()
            .filter(|c| c.election_id == election)
            .cloned()
            .collect();
        candidates.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(candidates)
    }

    fn insert_candidate(&mut self, candidate: Candidate) -> Result<(), StoreError> {
        let duplicate = self
            .candidates
            .values()
            .any(|c| c.election_id == candidate.election_id && c.user_id == candidate.user_id);
        if duplicate {
            return Err(StoreError::conflict(
                "candidate",
                format!("user {} already registered", candidate.user_id),
            ));
        }
        self.candidates.insert(candidate.id, candidate);
        Ok(())
    }

    fn has_voted(&self, election: ElectionId, voter: UserId) -> Result<bool, StoreError> {
        Ok(self
            .votes
            .iter()
            .any(|v| v.election_id == election && v.voter_id == voter))
    }

    fn list_votes(&self, election: ElectionId) -> Result<Vec<Vote>, StoreError> {
        Ok(self
            .votes
            .iter()
            .filter(|v| v.election_id == election)
            .cloned()
            .collect())
    }

    fn insert_vote(&mut self, vote: Vote) -> Result<(), StoreError> {
        if self.has_voted(vote.election_id, vote.voter_id)? {
            return Err(StoreError::conflict(
                "vote",
                format!("voter {} already voted", vote.voter_id),
            ));
        }
        self.votes.push(vote);
        Ok(())
    }
}
