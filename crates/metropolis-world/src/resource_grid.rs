//! Power and water rationing.
//!
//! The grid is global and binary: when total capacity covers total demand
//! every consumer is supplied, otherwise none is. Power plants and water
//! towers are providers; they are always supplied and their own draw never
//! counts toward demand. Only completed providers contribute capacity.

use metropolis_db::{BuildingRepository, StoreResultExt};
use metropolis_types::{Building, BuildingType, CityId};

use crate::error::WorldError;

/// Capacity added by one completed power plant.
pub const DEFAULT_POWER_PER_PLANT: u64 = 10_000;

/// Capacity added by one completed water tower.
pub const DEFAULT_WATER_PER_TOWER: u64 = 1_000;

/// Totals computed by one grid pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridReport {
    /// Total power capacity.
    pub power_capacity: u64,
    /// Total power demand.
    pub power_demand: u64,
    /// Total water capacity.
    pub water_capacity: u64,
    /// Total water demand.
    pub water_demand: u64,
    /// Buildings whose supply flags changed.
    pub changed: u32,
}

impl GridReport {
    /// Whether consumers receive power.
    pub const fn power_supplied(&self) -> bool {
        self.power_capacity >= self.power_demand
    }

    /// Whether consumers receive water.
    pub const fn water_supplied(&self) -> bool {
        self.water_capacity >= self.water_demand
    }
}

/// Recomputes utility supply every `interval_ticks`.
#[derive(Debug, Clone, Copy)]
pub struct ResourceGridSimulator {
    interval_ticks: u64,
    power_per_plant: u64,
    water_per_tower: u64,
}

impl Default for ResourceGridSimulator {
    fn default() -> Self {
        Self::new(10, DEFAULT_POWER_PER_PLANT, DEFAULT_WATER_PER_TOWER)
    }
}

impl ResourceGridSimulator {
    /// Create a simulator. An interval of 0 is treated as 1.
    pub const fn new(interval_ticks: u64, power_per_plant: u64, water_per_tower: u64) -> Self {
        Self {
            interval_ticks: if interval_ticks == 0 { 1 } else { interval_ticks },
            power_per_plant,
            water_per_tower,
        }
    }

    /// Whether `tick` is a resource tick.
    pub fn is_resource_tick(&self, tick: u64) -> bool {
        tick.checked_rem(self.interval_ticks).is_some_and(|r| r == 0)
    }

    /// Sum capacity and demand over a set of buildings.
    pub fn totals(&self, buildings: &[Building]) -> Result<GridReport, WorldError> {
        let mut report = GridReport::default();
        for b in buildings {
            if b.building_type.is_provider() {
                if !b.is_complete() {
                    continue;
                }
                match b.building_type {
                    BuildingType::PowerPlant => {
                        report.power_capacity = report
                            .power_capacity
                            .checked_add(self.power_per_plant)
                            .ok_or(WorldError::ArithmeticOverflow)?;
                    }
                    BuildingType::WaterTower => {
                        report.water_capacity = report
                            .water_capacity
                            .checked_add(self.water_per_tower)
                            .ok_or(WorldError::ArithmeticOverflow)?;
                    }
                    _ => {}
                }
            } else {
                report.power_demand = report
                    .power_demand
                    .checked_add(u64::from(b.power_required))
                    .ok_or(WorldError::ArithmeticOverflow)?;
                report.water_demand = report
                    .water_demand
                    .checked_add(u64::from(b.water_required))
                    .ok_or(WorldError::ArithmeticOverflow)?;
            }
        }
        Ok(report)
    }

    /// Recompute and persist supply flags for every building in the city.
    ///
    /// Only buildings whose flags change are written.
    pub fn run<S>(&self, store: &mut S, city: CityId) -> Result<GridReport, WorldError>
    where
        S: BuildingRepository + ?Sized,
    {
        let buildings = store.list_buildings(city)?;
        let mut report = self.totals(&buildings)?;
        let powered = report.power_supplied();
        let watered = report.water_supplied();

        for b in &buildings {
            let (want_power, want_water) = if b.building_type.is_provider() {
                (true, true)
            } else {
                (powered, watered)
            };
            if b.powered == want_power && b.has_water == want_water {
                continue;
            }
            if store
                .set_utilities(b.id, want_power, want_water)
                .skip_missing()?
                .is_some()
            {
                report.changed = report.changed.saturating_add(1);
            }
        }

        tracing::debug!(
            %city,
            power_capacity = report.power_capacity,
            power_demand = report.power_demand,
            water_capacity = report.water_capacity,
            water_demand = report.water_demand,
            changed = report.changed,
            "resource grid updated"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use metropolis_db::MemoryStore;
    use metropolis_types::{BuildingId, Density, ParcelId};

    use super::*;

    fn building(city: CityId, bt: BuildingType, power: u32, water: u32) -> Building {
        Building {
            id: BuildingId::new(),
            city_id: city,
            parcel_id: ParcelId::new(),
            building_type: bt,
            floors: 1,
            power_required: power,
            water_required: water,
            powered: false,
            has_water: false,
            construction_progress: 100,
            construction_started_at: Some(0),
            construction_time_ticks: 0,
            density: Density::Low,
        }
    }

    fn seed(demand: u32) -> (MemoryStore, CityId) {
        let mut store = MemoryStore::new();
        let city = CityId::new();
        store
            .insert_building(building(city, BuildingType::PowerPlant, 0, 0))
            .unwrap();
        store
            .insert_building(building(city, BuildingType::WaterTower, 0, 0))
            .unwrap();
        store
            .insert_building(building(city, BuildingType::Factory, demand, 0))
            .unwrap();
        (store, city)
    }

    fn consumers_powered(store: &MemoryStore, city: CityId) -> usize {
        store
            .list_buildings(city)
            .unwrap()
            .iter()
            .filter(|b| !b.building_type.is_provider() && b.powered)
            .count()
    }

    #[test]
    fn demand_equal_to_capacity_powers_everything() {
        let (mut store, city) = seed(10_000);
        let report = ResourceGridSimulator::default().run(&mut store, city).unwrap();
        assert_eq!(report.power_capacity, 10_000);
        assert_eq!(report.power_demand, 10_000);
        assert_eq!(consumers_powered(&store, city), 1);
    }

    #[test]
    fn demand_one_over_capacity_powers_nothing() {
        let (mut store, city) = seed(10_001);
        ResourceGridSimulator::default().run(&mut store, city).unwrap();
        assert_eq!(consumers_powered(&store, city), 0);
        // Providers stay powered regardless.
        let providers = store
            .list_buildings(city)
            .unwrap()
            .into_iter()
            .filter(|b| b.building_type.is_provider())
            .all(|b| b.powered && b.has_water);
        assert!(providers);
    }

    #[test]
    fn unfinished_plants_add_no_capacity() {
        let mut store = MemoryStore::new();
        let city = CityId::new();
        let mut plant = building(city, BuildingType::PowerPlant, 0, 0);
        plant.construction_progress = 50;
        store.insert_building(plant).unwrap();
        store
            .insert_building(building(city, BuildingType::House, 1, 0))
            .unwrap();
        let report = ResourceGridSimulator::default().run(&mut store, city).unwrap();
        assert_eq!(report.power_capacity, 0);
        assert_eq!(consumers_powered(&store, city), 0);
    }

    #[test]
    fn unchanged_flags_are_not_rewritten() {
        let (mut store, city) = seed(100);
        let sim = ResourceGridSimulator::default();
        let first = sim.run(&mut store, city).unwrap();
        assert_eq!(first.changed, 3);
        let second = sim.run(&mut store, city).unwrap();
        assert_eq!(second.changed, 0);
    }

    #[test]
    fn resource_ticks_follow_interval() {
        let sim = ResourceGridSimulator::default();
        assert!(sim.is_resource_tick(0));
        assert!(!sim.is_resource_tick(5));
        assert!(sim.is_resource_tick(20));
    }
}
