//! The building catalog: cost, build time and utility draw per type.
//!
//! This is the one canonical table. Placement, construction and the grid
//! all read from [`spec`]; nothing else hardcodes per-type numbers.

use metropolis_types::{BuildingType, Sector, Terrain, Zoning};
use rust_decimal::Decimal;

/// Ticks in one in-game hour at the default clock rate.
const HOUR: u64 = 600;

/// Static properties of one building type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingSpec {
    /// The type described.
    pub building_type: BuildingType,
    /// Purchase price.
    pub cost: Decimal,
    /// Ticks from start to completion; 0 completes on the next tick.
    pub construction_time_ticks: u64,
    /// Electricity draw once placed.
    pub power_required: u32,
    /// Water draw once placed.
    pub water_required: u32,
    /// Default floor count.
    pub floors: u32,
    /// Jobs offered when complete.
    pub jobs: u32,
    /// Zoning the type requires; `None` means any parcel.
    pub zoning: Option<Zoning>,
}

/// Shorthand constructor used by the table below.
#[allow(clippy::too_many_arguments)]
const fn entry(
    building_type: BuildingType,
    cost: u32,
    hours: u64,
    power_required: u32,
    water_required: u32,
    floors: u32,
    jobs: u32,
    zoning: Option<Zoning>,
) -> BuildingSpec {
    BuildingSpec {
        building_type,
        cost: Decimal::from_parts(cost, 0, 0, false, 0),
        construction_time_ticks: hours.saturating_mul(HOUR),
        power_required,
        water_required,
        floors,
        jobs,
        zoning,
    }
}

/// Return the canonical spec for a building type.
pub const fn spec(building_type: BuildingType) -> BuildingSpec {
    use BuildingType as B;
    use Zoning as Z;
    match building_type {
        // ---- Residential ----
        B::House => entry(B::House, 5_000, 10, 5, 2, 1, 0, Some(Z::Residential)),
        B::Apartment => entry(B::Apartment, 25_000, 24, 40, 15, 4, 0, Some(Z::Residential)),
        // ---- Commercial ----
        B::Office => entry(B::Office, 40_000, 24, 60, 10, 6, 40, Some(Z::Commercial)),
        B::Shop => entry(B::Shop, 8_000, 10, 15, 4, 1, 6, Some(Z::Commercial)),
        // ---- Industrial ----
        B::Factory => entry(B::Factory, 50_000, 24, 120, 40, 2, 60, Some(Z::Industrial)),
        B::Warehouse => entry(B::Warehouse, 15_000, 12, 30, 5, 1, 10, Some(Z::Industrial)),
        // ---- Utilities ----
        B::PowerPlant => entry(B::PowerPlant, 100_000, 48, 0, 0, 2, 20, Some(Z::Civic)),
        B::WaterTower => entry(B::WaterTower, 30_000, 24, 0, 0, 1, 5, Some(Z::Civic)),
        // ---- Infrastructure ----
        B::Road => entry(B::Road, 500, 0, 0, 0, 0, 0, None),
        B::Park => entry(B::Park, 2_000, 5, 0, 5, 0, 2, None),
        // ---- Public services ----
        B::PoliceStation => entry(B::PoliceStation, 30_000, 24, 25, 6, 2, 15, Some(Z::Civic)),
        B::FireStation => entry(B::FireStation, 30_000, 24, 25, 20, 2, 15, Some(Z::Civic)),
        B::Hospital => entry(B::Hospital, 80_000, 48, 80, 30, 4, 50, Some(Z::Civic)),
        B::School => entry(B::School, 35_000, 24, 40, 12, 2, 25, Some(Z::Civic)),
        B::CityHall => entry(B::CityHall, 60_000, 48, 50, 10, 3, 30, Some(Z::Civic)),
    }
}

impl BuildingSpec {
    /// Whether this type may be placed on a parcel with the given zoning.
    pub const fn allowed_on(&self, zoning: Option<Zoning>) -> bool {
        match (self.zoning, zoning) {
            (None, _) => true,
            (Some(required), Some(actual)) => required as u8 == actual as u8,
            (Some(_), None) => false,
        }
    }
}

/// Whether anything can be built on this terrain.
pub const fn is_buildable(terrain: Terrain) -> bool {
    !matches!(terrain, Terrain::Water)
}

/// Demand sector a building type counts toward, if any.
pub const fn sector(building_type: BuildingType) -> Option<Sector> {
    match building_type {
        BuildingType::House | BuildingType::Apartment => Some(Sector::Residential),
        BuildingType::Office | BuildingType::Shop => Some(Sector::Office),
        BuildingType::Factory | BuildingType::Warehouse => Some(Sector::Industrial),
        _ => None,
    }
}

/// Whether a completed building of this type blocks pedestrians.
pub const fn blocks_walking(building_type: BuildingType) -> bool {
    !matches!(building_type, BuildingType::Road | BuildingType::Park)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn roads_build_instantly() {
        assert_eq!(spec(BuildingType::Road).construction_time_ticks, 0);
    }

    #[test]
    fn providers_draw_nothing() {
        for bt in [BuildingType::PowerPlant, BuildingType::WaterTower] {
            let s = spec(bt);
            assert_eq!(s.power_required, 0);
            assert_eq!(s.water_required, 0);
        }
    }

    #[test]
    fn costs_are_exact() {
        assert_eq!(spec(BuildingType::House).cost, dec!(5000));
        assert_eq!(spec(BuildingType::PowerPlant).cost, dec!(100000));
    }

    #[test]
    fn sectors_cover_zoned_types() {
        assert_eq!(sector(BuildingType::Apartment), Some(Sector::Residential));
        assert_eq!(sector(BuildingType::Shop), Some(Sector::Office));
        assert_eq!(sector(BuildingType::Warehouse), Some(Sector::Industrial));
        assert_eq!(sector(BuildingType::Park), None);
    }

    #[test]
    fn zoning_rules() {
        let house = spec(BuildingType::House);
        assert!(house.allowed_on(Some(Zoning::Residential)));
        assert!(!house.allowed_on(Some(Zoning::Industrial)));
        assert!(!house.allowed_on(None));
        assert!(spec(BuildingType::Road).allowed_on(None));
    }

    #[test]
    fn water_is_not_buildable() {
        assert!(!is_buildable(Terrain::Water));
        assert!(is_buildable(Terrain::Hill));
    }
}
