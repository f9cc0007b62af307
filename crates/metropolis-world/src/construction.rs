//! Construction progress and building placement.
//!
//! Progress is a pure function of elapsed ticks:
//! `floor((tick - started_at) / construction_time_ticks * 100)`, clamped to
//! [0, 100] and never lower than what is already stored. Buildings with no
//! start tick are waiting on something outside the engine and are skipped.

use metropolis_db::{
    ActivityLogger, BuildingRepository, ParcelRepository, RoadRepository, StoreResultExt,
};
use metropolis_types::{
    ActivityKind, Building, BuildingId, BuildingType, CityId, Density, ParcelId, Road,
    RoadDirection, SimEvent,
};

use crate::catalog;
use crate::error::WorldError;

/// Advances construction of every unfinished building.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstructionSimulator;

impl ConstructionSimulator {
    /// Create the simulator.
    pub const fn new() -> Self {
        Self
    }

    /// The progress `building` should show at `tick`, or `None` if it has
    /// not started. Zero build time is complete whether started or not.
    pub fn progress_at(building: &Building, tick: u64) -> Option<u8> {
        if building.construction_time_ticks == 0 {
            return Some(100);
        }
        let started = building.construction_started_at?;
        let elapsed = tick.saturating_sub(started);
        let pct = elapsed
            .checked_mul(100)
            .and_then(|scaled| scaled.checked_div(building.construction_time_ticks))
            .unwrap_or(100)
            .min(100);
        let pct = u8::try_from(pct).unwrap_or(100);
        Some(pct.max(building.construction_progress))
    }

    /// Advance every incomplete building of `city` to its progress at
    /// `tick`. Returns one event per building that completed on this call.
    pub fn run<S>(
        &self,
        store: &mut S,
        city: CityId,
        tick: u64,
        activity: &mut dyn ActivityLogger,
    ) -> Result<Vec<SimEvent>, WorldError>
    where
        S: BuildingRepository + ?Sized,
    {
        let mut events = Vec::new();
        for building in store.list_incomplete_buildings(city)? {
            let Some(progress) = Self::progress_at(&building, tick) else {
                continue;
            };
            if progress == building.construction_progress {
                continue;
            }
            if store
                .set_construction_progress(building.id, progress)
                .skip_missing()?
                .is_none()
            {
                continue;
            }
            if progress >= 100 {
                tracing::info!(
                    tick,
                    building_id = %building.id,
                    building_type = ?building.building_type,
                    "construction complete"
                );
                activity.log(
                    ActivityKind::ConstructionComplete,
                    &format!("{:?} finished construction", building.building_type),
                    serde_json::json!({
                        "building_id": building.id,
                        "tick": tick,
                    }),
                );
                events.push(SimEvent::ConstructionCompleted {
                    building_id: building.id,
                });
            }
        }
        Ok(events)
    }
}

/// Place a new building on a parcel and start construction at `tick`.
///
/// Validates the parcel exists, its terrain is buildable, its zoning
/// admits the type, and it carries no other building. Roads also get a
/// road row. Funds are the caller's concern.
pub fn place_building<S>(
    store: &mut S,
    parcel_id: ParcelId,
    building_type: BuildingType,
    density: Density,
    tick: u64,
) -> Result<Building, WorldError>
where
    S: ParcelRepository + BuildingRepository + RoadRepository + ?Sized,
{
    place(
        store,
        parcel_id,
        building_type,
        density,
        RoadDirection::Intersection,
        tick,
    )
}

/// Place a one-lane road tile with the given orientation.
pub fn place_road<S>(
    store: &mut S,
    parcel_id: ParcelId,
    direction: RoadDirection,
    tick: u64,
) -> Result<Building, WorldError>
where
    S: ParcelRepository + BuildingRepository + RoadRepository + ?Sized,
{
    place(
        store,
        parcel_id,
        BuildingType::Road,
        Density::Low,
        direction,
        tick,
    )
}

fn place<S>(
    store: &mut S,
    parcel_id: ParcelId,
    building_type: BuildingType,
    density: Density,
    direction: RoadDirection,
    tick: u64,
) -> Result<Building, WorldError>
where
    S: ParcelRepository + BuildingRepository + RoadRepository + ?Sized,
{
    let parcel = store
        .get_parcel(parcel_id)?
        .ok_or(WorldError::ParcelNotFound(parcel_id))?;
    if !catalog::is_buildable(parcel.terrain) {
        return Err(WorldError::UnbuildableTerrain(parcel.terrain));
    }
    let spec = catalog::spec(building_type);
    if !spec.allowed_on(parcel.zoning) {
        return Err(WorldError::ZoningMismatch {
            building_type,
            zoning: parcel.zoning,
        });
    }
    let occupied = store
        .list_buildings(parcel.city_id)?
        .iter()
        .any(|b| b.parcel_id == parcel_id);
    if occupied {
        return Err(WorldError::ParcelOccupied(parcel_id));
    }

    let building = Building {
        id: BuildingId::new(),
        city_id: parcel.city_id,
        parcel_id,
        building_type,
        floors: spec.floors,
        power_required: spec.power_required,
        water_required: spec.water_required,
        powered: false,
        has_water: false,
        construction_progress: 0,
        construction_started_at: Some(tick),
        construction_time_ticks: spec.construction_time_ticks,
        density,
    };
    store.insert_building(building.clone())?;

    if building_type == BuildingType::Road {
        store.insert_road(Road {
            parcel_id,
            city_id: parcel.city_id,
            direction,
            lanes: 1,
            traffic_load: 0.0,
        })?;
    }

    tracing::debug!(
        tick,
        building_id = %building.id,
        ?building_type,
        at = %parcel.coordinate,
        "construction started"
    );
    Ok(building)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use metropolis_db::{MemoryStore, RecordingActivityLogger};
    use metropolis_types::{Coordinate, Parcel, Terrain, Zoning};
    use rust_decimal_macros::dec;

    use super::*;

    fn parcel(city: CityId, zoning: Option<Zoning>, terrain: Terrain) -> Parcel {
        Parcel {
            id: ParcelId::new(),
            city_id: city,
            coordinate: Coordinate::new(3, 3),
            terrain,
            zoning,
            owner_id: None,
            land_value: dec!(100),
        }
    }

    fn building(time: u64, started: Option<u64>) -> Building {
        Building {
            id: BuildingId::new(),
            city_id: CityId::new(),
            parcel_id: ParcelId::new(),
            building_type: BuildingType::House,
            floors: 1,
            power_required: 5,
            water_required: 2,
            powered: false,
            has_water: false,
            construction_progress: 0,
            construction_started_at: started,
            construction_time_ticks: time,
            density: Density::Low,
        }
    }

    #[test]
    fn progress_formula() {
        let b = building(200, Some(100));
        assert_eq!(ConstructionSimulator::progress_at(&b, 100), Some(0));
        assert_eq!(ConstructionSimulator::progress_at(&b, 199), Some(49));
        assert_eq!(ConstructionSimulator::progress_at(&b, 300), Some(100));
        assert_eq!(ConstructionSimulator::progress_at(&b, 9_999), Some(100));
    }

    #[test]
    fn progress_never_regresses() {
        let mut b = building(200, Some(100));
        b.construction_progress = 60;
        assert_eq!(ConstructionSimulator::progress_at(&b, 150), Some(60));
    }

    #[test]
    fn instant_types_complete_immediately() {
        let b = building(0, Some(5));
        assert_eq!(ConstructionSimulator::progress_at(&b, 5), Some(100));
    }

    #[test]
    fn instant_types_complete_without_a_start_tick() {
        assert_eq!(ConstructionSimulator::progress_at(&building(0, None), 0), Some(100));
    }

    #[test]
    fn unstarted_is_skipped() {
        assert_eq!(ConstructionSimulator::progress_at(&building(10, None), 50), None);
    }

    #[test]
    fn completion_event_fires_once() {
        let mut store = MemoryStore::new();
        let b = building(10, Some(0));
        let city = b.city_id;
        store.insert_building(b).unwrap();
        let mut log = RecordingActivityLogger::new();
        let sim = ConstructionSimulator::new();

        assert!(sim.run(&mut store, city, 5, &mut log).unwrap().is_empty());
        assert_eq!(sim.run(&mut store, city, 10, &mut log).unwrap().len(), 1);
        assert!(sim.run(&mut store, city, 11, &mut log).unwrap().is_empty());
        assert_eq!(log.count(ActivityKind::ConstructionComplete), 1);
    }

    #[test]
    fn place_road_creates_road_row() {
        let mut store = MemoryStore::new();
        let city = CityId::new();
        let p = parcel(city, None, Terrain::Land);
        let pid = p.id;
        store.insert_parcel(p).unwrap();
        let b = place_building(&mut store, pid, BuildingType::Road, Density::Low, 7).unwrap();
        assert_eq!(b.construction_time_ticks, 0);
        assert!(store.get_road(pid).unwrap().is_some());
        assert!(matches!(
            place_building(&mut store, pid, BuildingType::Road, Density::Low, 8),
            Err(WorldError::ParcelOccupied(_))
        ));
    }

    #[test]
    fn placement_respects_zoning_and_terrain() {
        let mut store = MemoryStore::new();
        let city = CityId::new();
        let p = parcel(city, Some(Zoning::Industrial), Terrain::Land);
        let pid = p.id;
        store.insert_parcel(p).unwrap();
        assert!(matches!(
            place_building(&mut store, pid, BuildingType::House, Density::Low, 0),
            Err(WorldError::ZoningMismatch { .. })
        ));

        let mut lake = parcel(city, None, Terrain::Water);
        lake.coordinate = Coordinate::new(9, 9);
        let lake_id = lake.id;
        store.insert_parcel(lake).unwrap();
        assert!(matches!(
            place_building(&mut store, lake_id, BuildingType::Park, Density::Low, 0),
            Err(WorldError::UnbuildableTerrain(Terrain::Water))
        ));
    }
}
