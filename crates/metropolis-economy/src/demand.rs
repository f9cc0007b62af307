//! R/O/I demand.
//!
//! For each sector:
//!
//! ```text
//! demand = (ideal share - current share)
//!        + (neutral rate - sector tax rate) * sensitivity
//!        + sum of enacted ordinance effects
//!        - department penalties
//! ```
//!
//! clamped to [-1, 1]. Only completed buildings count. A department funded
//! below half its budget costs its sectors a fixed penalty: police and
//! health hit residential, education and transit hit office, fire hits
//! industrial.

use metropolis_types::{Building, CityEconomy, Sector};
use metropolis_world::catalog;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::config::{DemandConfig, TaxPolicy};

/// Funding level below which a department is underfunded.
const UNDERFUNDED_BELOW: u8 = 50;

/// Demand per sector, each in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Demand {
    /// Residential demand.
    pub residential: f64,
    /// Office demand.
    pub office: f64,
    /// Industrial demand.
    pub industrial: f64,
}

impl Demand {
    /// Demand for one sector.
    pub const fn get(&self, sector: Sector) -> f64 {
        match sector {
            Sector::Residential => self.residential,
            Sector::Office => self.office,
            Sector::Industrial => self.industrial,
        }
    }

    fn add(&mut self, sector: Sector, delta: f64) {
        let slot = match sector {
            Sector::Residential => &mut self.residential,
            Sector::Office => &mut self.office,
            Sector::Industrial => &mut self.industrial,
        };
        *slot += delta;
    }

    fn clamped(self) -> Self {
        Self {
            residential: self.residential.clamp(-1.0, 1.0),
            office: self.office.clamp(-1.0, 1.0),
            industrial: self.industrial.clamp(-1.0, 1.0),
        }
    }
}

const SECTORS: [Sector; 3] = [Sector::Residential, Sector::Office, Sector::Industrial];

fn percent(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Pure demand model over a city's economy and buildings.
#[derive(Debug, Clone)]
pub struct DemandCalculator {
    config: DemandConfig,
    neutral_rate: Decimal,
}

impl DemandCalculator {
    /// Create a calculator.
    pub fn new(config: DemandConfig, tax: &TaxPolicy) -> Self {
        Self {
            config,
            neutral_rate: tax.neutral_rate,
        }
    }

    fn ideal(&self, sector: Sector) -> f64 {
        match sector {
            Sector::Residential => self.config.ideal_residential,
            Sector::Office => self.config.ideal_office,
            Sector::Industrial => self.config.ideal_industrial,
        }
    }

    const fn rate(economy: &CityEconomy, sector: Sector) -> Decimal {
        match sector {
            Sector::Residential => economy.tax_rate_residential,
            Sector::Office => economy.tax_rate_commercial,
            Sector::Industrial => economy.tax_rate_industrial,
        }
    }

    /// Compute demand for a city.
    pub fn calculate(&self, economy: &CityEconomy, buildings: &[Building]) -> Demand {
        let mut counts = [0_u32; 3];
        for b in buildings.iter().filter(|b| b.is_complete()) {
            let slot = match catalog::sector(b.building_type) {
                Some(Sector::Residential) => counts.get_mut(0),
                Some(Sector::Office) => counts.get_mut(1),
                Some(Sector::Industrial) => counts.get_mut(2),
                None => None,
            };
            if let Some(n) = slot {
                *n = n.saturating_add(1);
            }
        }
        let total: u32 = counts.iter().fold(0, |acc, n| acc.saturating_add(*n));

        let mut demand = Demand::default();
        for (sector, count) in SECTORS.into_iter().zip(counts) {
            let share = if total == 0 {
                0.0
            } else {
                f64::from(count) / f64::from(total)
            };
            demand.add(sector, self.ideal(sector) - share);

            let gap = self.neutral_rate.checked_sub(Self::rate(economy, sector));
            demand.add(sector, gap.map_or(0.0, percent) * self.config.sensitivity);
        }

        for name in &economy.ordinances {
            if let Some(effect) = self.config.ordinances.get(name) {
                demand.add(Sector::Residential, effect.residential);
                demand.add(Sector::Office, effect.office);
                demand.add(Sector::Industrial, effect.industrial);
            }
        }

        let funding = &economy.department_funding;
        let underfunded = [
            (funding.police, Sector::Residential),
            (funding.health, Sector::Residential),
            (funding.education, Sector::Office),
            (funding.transit, Sector::Office),
            (funding.fire, Sector::Industrial),
        ];
        for (level, sector) in underfunded {
            if level < UNDERFUNDED_BELOW {
                demand.add(sector, -self.config.department_penalty);
            }
        }

        demand.clamped()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use metropolis_types::{BuildingId, BuildingType, CityId, Density, ParcelId};
    use rust_decimal_macros::dec;

    use super::*;

    fn building(bt: BuildingType, progress: u8) -> Building {
        Building {
            id: BuildingId::new(),
            city_id: CityId::new(),
            parcel_id: ParcelId::new(),
            building_type: bt,
            floors: 1,
            power_required: 0,
            water_required: 0,
            powered: true,
            has_water: true,
            construction_progress: progress,
            construction_started_at: Some(0),
            construction_time_ticks: 10,
            density: Density::Low,
        }
    }

    fn calculator() -> DemandCalculator {
        DemandCalculator::new(DemandConfig::default(), &TaxPolicy::default())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_city_wants_its_ideal_mix() {
        let d = calculator().calculate(&CityEconomy::default(), &[]);
        assert!(close(d.residential, 0.5));
        assert!(close(d.office, 0.3));
        assert!(close(d.industrial, 0.2));
    }

    #[test]
    fn only_completed_buildings_count() {
        let buildings = [
            building(BuildingType::House, 100),
            building(BuildingType::Factory, 40),
        ];
        let d = calculator().calculate(&CityEconomy::default(), &buildings);
        // One complete house: residential share 1.0.
        assert!(close(d.residential, -0.5));
        assert!(close(d.industrial, 0.2));
    }

    #[test]
    fn low_taxes_raise_demand_high_taxes_lower_it() {
        let calc = calculator();
        let mut economy = CityEconomy::default();
        economy.tax_rate_residential = dec!(5);
        economy.tax_rate_commercial = dec!(13);
        let d = calc.calculate(&economy, &[]);
        assert!(close(d.residential, 0.5 + 4.0 * 0.05));
        assert!(close(d.office, 0.3 - 4.0 * 0.05));
    }

    #[test]
    fn ordinances_and_underfunding_apply() {
        let calc = calculator();
        let mut economy = CityEconomy::default();
        economy.ordinances.insert(String::from("pollution_controls"));
        economy.ordinances.insert(String::from("unknown_ordinance"));
        economy.department_funding.fire = 49;
        economy.department_funding.police = 50;
        let d = calc.calculate(&economy, &[]);
        assert!(close(d.residential, 0.6));
        assert!(close(d.industrial, 0.2 - 0.15 - 0.2));
    }

    #[test]
    fn results_are_clamped() {
        let calc = calculator();
        let mut economy = CityEconomy::default();
        economy.tax_rate_industrial = dec!(0);
        economy.tax_rate_residential = dec!(60);
        let d = calc.calculate(&economy, &[]);
        assert!(close(d.get(Sector::Residential), -1.0));
        assert!(d.industrial <= 1.0);
        for sector in SECTORS {
            assert!((-1.0..=1.0).contains(&d.get(sector)));
        }
    }
}
