//! Default starting city for a fresh run.
//!
//! Lays out a land grid with a river near the east edge, one east-west
//! avenue and one north-south street, a zoned downtown with homes, an
//! apartment block, an office, a shop, a factory, and one power plant and
//! water tower. Everything is already built. Six residents commute between
//! home and work; two of them rent apartment units and own a car.

use std::collections::VecDeque;

use metropolis_db::Store;
use metropolis_types::{
    Agent, AgentId, AgentState, BuildingId, BuildingType, City, CityEconomy, CityId, Coordinate,
    Density, GameTime, Parcel, ParcelId, Position, RentalUnit, RentalUnitId, RoadDirection,
    Schedule, Terrain, UnitStatus, Vehicle, VehicleId, Watermarks, Zoning,
};
use rust_decimal::Decimal;

use crate::construction::{place_building, place_road};
use crate::error::WorldError;

/// Smallest grid the layout fits in.
pub const MIN_WIDTH: i32 = 16;
/// Smallest grid the layout fits in.
pub const MIN_HEIGHT: i32 = 12;

/// Row of the east-west avenue.
const AVENUE_ROW: i32 = 8;
/// Column of the north-south street.
const STREET_COL: i32 = 8;

const RESIDENT_NAMES: [&str; 6] = ["Ada", "Bram", "Chiara", "Dev", "Elif", "Femi"];

/// Identifiers of the notable buildings and residents of the starting city.
#[derive(Debug, Clone)]
pub struct StartingCity {
    /// The new city.
    pub city_id: CityId,
    /// Grid width.
    pub width: i32,
    /// Grid height.
    pub height: i32,
    /// The power plant.
    pub power_plant: BuildingId,
    /// The water tower.
    pub water_tower: BuildingId,
    /// Detached houses.
    pub houses: Vec<BuildingId>,
    /// The apartment block.
    pub apartment: BuildingId,
    /// The office tower.
    pub office: BuildingId,
    /// The shop.
    pub shop: BuildingId,
    /// The factory.
    pub factory: BuildingId,
    /// Residents, in creation order.
    pub residents: Vec<AgentId>,
    /// Apartment units.
    pub units: Vec<RentalUnitId>,
}

fn zoning_for(c: Coordinate) -> Option<Zoning> {
    match (c.x, c.y) {
        (1..=6, 7) => Some(Zoning::Residential),
        (10..=11, 7) => Some(Zoning::Commercial),
        (10..=11, 9) => Some(Zoning::Industrial),
        (1..=2, 9) => Some(Zoning::Civic),
        _ => None,
    }
}

/// Place a building and mark it finished.
fn build_complete<S>(
    store: &mut S,
    parcel_id: ParcelId,
    building_type: BuildingType,
) -> Result<BuildingId, WorldError>
where
    S: Store + ?Sized,
{
    let building = place_building(store, parcel_id, building_type, Density::Low, 0)?;
    store.set_construction_progress(building.id, 100)?;
    Ok(building.id)
}

/// Place a road and mark it finished.
fn road_complete<S>(
    store: &mut S,
    parcel_id: ParcelId,
    direction: RoadDirection,
) -> Result<(), WorldError>
where
    S: Store + ?Sized,
{
    let road = place_road(store, parcel_id, direction, 0)?;
    store.set_construction_progress(road.id, 100)?;
    Ok(())
}

/// Create the starting city in `store`.
///
/// Returns [`WorldError::OutOfBounds`] when the grid is smaller than
/// [`MIN_WIDTH`] x [`MIN_HEIGHT`].
#[allow(clippy::too_many_lines)]
pub fn create_starting_city<S>(
    store: &mut S,
    name: &str,
    width: i32,
    height: i32,
    treasury: Decimal,
) -> Result<StartingCity, WorldError>
where
    S: Store + ?Sized,
{
    if width < MIN_WIDTH || height < MIN_HEIGHT {
        return Err(WorldError::OutOfBounds(Coordinate::new(width, height)));
    }

    let city_id = CityId::new();
    store.insert_city(City {
        id: city_id,
        name: name.to_owned(),
        time: GameTime {
            tick: 0,
            minute: 0,
            hour: 8,
            day: 1,
            year: 1,
        },
        treasury,
        economy: CityEconomy::default(),
        mayor_id: None,
        watermarks: Watermarks::default(),
    })?;

    // ---------------------------------------------------------------
    // Land
    // ---------------------------------------------------------------

    let river = width.saturating_sub(2);
    let mut parcel_ids = std::collections::BTreeMap::new();
    for y in 0..height {
        for x in 0..width {
            let at = Coordinate::new(x, y);
            let id = ParcelId::new();
            store.insert_parcel(Parcel {
                id,
                city_id,
                coordinate: at,
                terrain: if x == river {
                    Terrain::Water
                } else {
                    Terrain::Land
                },
                zoning: zoning_for(at),
                owner_id: None,
                land_value: Decimal::from(100),
            })?;
            parcel_ids.insert(at, id);
        }
    }
    let parcel = |x: i32, y: i32| -> Result<ParcelId, WorldError> {
        let at = Coordinate::new(x, y);
        parcel_ids
            .get(&at)
            .copied()
            .ok_or(WorldError::OutOfBounds(at))
    };

    // ---------------------------------------------------------------
    // Roads
    // ---------------------------------------------------------------

    for x in 0..river {
        let direction = if x == STREET_COL {
            RoadDirection::Intersection
        } else {
            RoadDirection::EastWest
        };
        road_complete(store, parcel(x, AVENUE_ROW)?, direction)?;
    }
    for y in (0..height).filter(|&y| y != AVENUE_ROW) {
        road_complete(store, parcel(STREET_COL, y)?, RoadDirection::NorthSouth)?;
    }

    // ---------------------------------------------------------------
    // Buildings (all complete)
    // ---------------------------------------------------------------

    let power_plant = build_complete(store, parcel(1, 9)?, BuildingType::PowerPlant)?;
    let water_tower = build_complete(store, parcel(2, 9)?, BuildingType::WaterTower)?;
    let mut houses = Vec::new();
    for x in 1..=4 {
        houses.push(build_complete(store, parcel(x, 7)?, BuildingType::House)?);
    }
    let apartment = build_complete(store, parcel(5, 7)?, BuildingType::Apartment)?;
    let office = build_complete(store, parcel(10, 7)?, BuildingType::Office)?;
    let shop = build_complete(store, parcel(11, 7)?, BuildingType::Shop)?;
    let factory = build_complete(store, parcel(10, 9)?, BuildingType::Factory)?;

    // ---------------------------------------------------------------
    // Rental units
    // ---------------------------------------------------------------

    let mut units = Vec::new();
    for (floor, unit_number) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
        let id = RentalUnitId::new();
        store.insert_unit(RentalUnit {
            id,
            city_id,
            building_id: apartment,
            floor,
            unit_number,
            monthly_rent: Decimal::from(800),
            tenant_id: None,
            lease_start: None,
            paid_through: None,
            status: UnitStatus::Vacant,
        })?;
        units.push(id);
    }

    // ---------------------------------------------------------------
    // Residents
    // ---------------------------------------------------------------

    let homes: Vec<(BuildingId, Coordinate)> = houses
        .iter()
        .zip(1..)
        .map(|(&id, x)| (id, Coordinate::new(x, 7)))
        .chain([
            (apartment, Coordinate::new(5, 7)),
            (apartment, Coordinate::new(5, 7)),
        ])
        .collect();
    let mut residents = Vec::new();
    let jobs = [(office, Decimal::from(3200)), (factory, Decimal::from(2600))];
    for ((resident_name, (home, at)), &(work, salary)) in
        RESIDENT_NAMES.iter().zip(homes).zip(jobs.iter().cycle())
    {
        let agent_id = AgentId::new();
        store.insert_agent(Agent {
            id: agent_id,
            city_id,
            name: (*resident_name).to_owned(),
            position: Position::from(at),
            destination: None,
            path: VecDeque::new(),
            state: AgentState::Idle,
            schedule: Schedule::default(),
            wallet_balance: Decimal::from(1500),
            home_building_id: Some(home),
            work_building_id: Some(work),
            salary,
        })?;
        residents.push(agent_id);
    }

    // The last two residents rent apartment units and drive.
    for (&agent_id, &unit_id) in residents.iter().skip(4).zip(&units) {
        if let Some(mut unit) = store.get_unit(unit_id)? {
            unit.tenant_id = Some(agent_id);
            unit.lease_start = Some(0);
            unit.paid_through = Some(0);
            unit.status = UnitStatus::Occupied;
            store.update_unit(&unit)?;
        }
        store.insert_vehicle(Vehicle {
            id: VehicleId::new(),
            city_id,
            owner_id: agent_id,
            position: Position::from(Coordinate::new(STREET_COL, AVENUE_ROW)),
            path: VecDeque::new(),
            speed: 1.0,
        })?;
    }

    tracing::info!(
        %city_id,
        name,
        width,
        height,
        residents = residents.len(),
        "starting city created"
    );

    Ok(StartingCity {
        city_id,
        width,
        height,
        power_plant,
        water_tower,
        houses,
        apartment,
        office,
        shop,
        factory,
        residents,
        units,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use metropolis_db::{
        AgentRepository, BuildingRepository, MemoryStore, ParcelRepository, RentalRepository,
        RoadRepository, VehicleRepository,
    };
    use rust_decimal_macros::dec;

    use super::*;
    use crate::road_path::RoadPathfinder;

    #[test]
    fn layout_is_complete_and_connected() {
        let mut store = MemoryStore::new();
        let start = create_starting_city(&mut store, "Springfield", 20, 14, dec!(100000)).unwrap();

        assert_eq!(store.list_parcels(start.city_id).unwrap().len(), 20 * 14);
        assert!(
            store
                .list_incomplete_buildings(start.city_id)
                .unwrap()
                .is_empty()
        );
        assert_eq!(store.list_agents(start.city_id).unwrap().len(), 6);
        assert_eq!(store.list_vehicles(start.city_id).unwrap().len(), 2);
        assert_eq!(store.list_occupied_units(start.city_id).unwrap().len(), 2);

        let roads = RoadPathfinder::from_store(&store, start.city_id).unwrap();
        assert_eq!(roads.len(), store.list_roads(start.city_id).unwrap().len());
        let path = roads.find_path(Coordinate::new(0, AVENUE_ROW), Coordinate::new(STREET_COL, 0));
        assert!(!path.is_empty());
    }

    #[test]
    fn too_small_grid_is_rejected() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            create_starting_city(&mut store, "Tiny", 4, 4, dec!(0)),
            Err(WorldError::OutOfBounds(_))
        ));
    }
}
