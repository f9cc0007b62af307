//! Vehicle movement and road traffic feedback.
//!
//! Vehicles follow their paths like residents, at their own speed. After
//! moving, every road's load is recomputed as `min(vehicles on tile / lanes, 1)`
//! and fed back into the road pathfinder so later routes avoid congestion.

use std::collections::{BTreeMap, VecDeque};

use metropolis_db::{ParcelRepository, RoadRepository, StoreResultExt, VehicleRepository};
use metropolis_types::{CityId, Coordinate, SimEvent, Vehicle};
use metropolis_world::RoadPathfinder;

use crate::error::AgentError;
use crate::movement::{Advance, advance_along};

/// Moves vehicles and maintains road traffic loads.
#[derive(Debug, Clone, Copy, Default)]
pub struct VehicleSimulator;

impl VehicleSimulator {
    /// Create the simulator.
    pub const fn new() -> Self {
        Self
    }

    /// Advance every vehicle of `city` by one tick, then refresh traffic.
    pub fn run<S>(
        &self,
        store: &mut S,
        city: CityId,
        roads: &mut RoadPathfinder,
    ) -> Result<Vec<SimEvent>, AgentError>
    where
        S: VehicleRepository + RoadRepository + ParcelRepository + ?Sized,
    {
        let mut events = Vec::new();
        let mut vehicles = store.list_vehicles(city)?;
        for vehicle in &mut vehicles {
            let Some(step) = advance_along(&mut vehicle.position, &mut vehicle.path, vehicle.speed)
            else {
                continue;
            };
            match step {
                Advance::Moved => {}
                Advance::Waypoint => events.push(SimEvent::VehicleMoved {
                    vehicle_id: vehicle.id,
                    position: vehicle.position,
                }),
                Advance::Arrived(destination) => events.push(SimEvent::VehicleArrived {
                    vehicle_id: vehicle.id,
                    destination,
                }),
            }
            store.update_vehicle(vehicle).skip_missing()?;
        }

        Self::refresh_traffic(store, city, &vehicles, roads)?;
        Ok(events)
    }

    fn refresh_traffic<S>(
        store: &mut S,
        city: CityId,
        vehicles: &[Vehicle],
        roads: &mut RoadPathfinder,
    ) -> Result<(), AgentError>
    where
        S: RoadRepository + ParcelRepository + ?Sized,
    {
        let mut counts: BTreeMap<Coordinate, u32> = BTreeMap::new();
        for v in vehicles {
            let slot = counts.entry(v.position.nearest_tile()).or_default();
            *slot = slot.saturating_add(1);
        }

        let tiles: BTreeMap<_, _> = store
            .list_parcels(city)?
            .into_iter()
            .map(|p| (p.id, p.coordinate))
            .collect();

        let mut changed = 0_u32;
        for road in store.list_roads(city)? {
            let Some(&at) = tiles.get(&road.parcel_id) else {
                continue;
            };
            let count = counts.get(&at).copied().unwrap_or(0);
            let load = (f64::from(count) / f64::from(road.lanes.max(1))).min(1.0);
            if (load - road.traffic_load).abs() > f64::EPSILON {
                store.set_traffic_load(road.parcel_id, load).skip_missing()?;
                changed = changed.saturating_add(1);
            }
            roads.set_traffic_load(at, load);
        }
        if changed > 0 {
            tracing::debug!(%city, changed, "traffic loads updated");
        }
        Ok(())
    }
}

/// Send a vehicle along the road network to `goal`.
///
/// Returns `false`, leaving the vehicle untouched, when there is no road
/// route from its current tile.
pub fn dispatch_vehicle<S>(
    store: &mut S,
    vehicle: &mut Vehicle,
    goal: Coordinate,
    roads: &RoadPathfinder,
) -> Result<bool, AgentError>
where
    S: VehicleRepository + ?Sized,
{
    let from = vehicle.position.nearest_tile();
    let mut path = VecDeque::from(roads.find_path(from, goal));
    if path.is_empty() {
        return Ok(false);
    }
    if path.len() > 1 {
        path.pop_front();
    }
    vehicle.path = path;
    store.update_vehicle(vehicle)?;
    Ok(true)
}
