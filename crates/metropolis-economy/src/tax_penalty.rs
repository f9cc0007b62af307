//! Daily consequences of punitive tax rates.
//!
//! Three independent effects, each keyed to one sector's rate:
//!
//! - residential above `exodus_threshold`: `floor(excess * exodus_rate)`
//!   randomly chosen residents leave the city
//! - commercial above `salary_cut_threshold`: everyone employed in an
//!   office-sector building takes a pay cut of `excess * cut_per_percent`,
//!   never below the minimum wage
//! - industrial above `destruction_threshold`: each completed industrial
//!   building is demolished with probability
//!   `excess * destroy_chance_per_percent`
//!
//! Randomness comes from the caller so runs are reproducible from a seed.
//! Each run first claims its day on the city's tax watermark, so a second
//! call for the same day is a no-op whoever makes it.

use metropolis_db::{
    ActivityLogger, AgentRepository, BuildingRepository, CityRepository, RentalRepository,
    StoreResultExt, VehicleRepository,
};
use metropolis_types::{
    ActivityKind, Agent, AgentState, BuildingId, CityId, DailyPipeline, Sector, SimEvent,
    UnitStatus,
};
use metropolis_world::catalog;
use rand::Rng;
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::config::TaxPolicy;
use crate::error::EconomyError;

/// Every repository the penalty run touches.
pub trait TaxPenaltyStore:
    CityRepository + AgentRepository + BuildingRepository + RentalRepository + VehicleRepository
{
}

impl<T> TaxPenaltyStore for T where
    T: CityRepository
        + AgentRepository
        + BuildingRepository
        + RentalRepository
        + VehicleRepository
        + ?Sized
{
}

/// Amount by which `rate` exceeds `threshold`, if it does.
fn excess(rate: Decimal, threshold: Decimal) -> Option<Decimal> {
    rate.checked_sub(threshold).filter(|e| *e > Decimal::ZERO)
}

/// Applies tax penalties once per day.
#[derive(Debug, Clone, Default)]
pub struct TaxPenaltySimulator {
    policy: TaxPolicy,
}

impl TaxPenaltySimulator {
    /// Create a simulator.
    pub const fn new(policy: TaxPolicy) -> Self {
        Self { policy }
    }

    /// Hour of day the engine should run this simulator.
    pub const fn penalty_hour(&self) -> u32 {
        self.policy.penalty_hour
    }

    /// Apply every penalty for `city` on absolute day `day`.
    ///
    /// Does nothing if `day` was already processed.
    pub fn run<S, R>(
        &self,
        store: &mut S,
        city: CityId,
        day: u64,
        rng: &mut R,
        activity: &mut dyn ActivityLogger,
    ) -> Result<Vec<SimEvent>, EconomyError>
    where
        S: TaxPenaltyStore + ?Sized,
        R: Rng + ?Sized,
    {
        if !store.claim_day(city, DailyPipeline::Tax, day)? {
            tracing::debug!(%city, day, "tax penalties already applied for day");
            return Ok(Vec::new());
        }
        let Some(c) = store.get_city(city)? else {
            tracing::warn!(%city, "city vanished, tax penalties skipped");
            return Ok(Vec::new());
        };
        let economy = &c.economy;
        let mut events = Vec::new();

        if let Some(e) = excess(economy.tax_rate_residential, self.policy.exodus_threshold) {
            let left = self.exodus(store, city, e, rng)?;
            if left > 0 {
                activity.log(
                    ActivityKind::ResidentExodus,
                    &format!("{left} residents left over high residential tax"),
                    serde_json::json!({ "count": left, "rate": economy.tax_rate_residential }),
                );
                events.push(SimEvent::ResidentsLeft { count: left });
            }
        }

        if let Some(e) = excess(economy.tax_rate_commercial, self.policy.salary_cut_threshold) {
            let cut = self.cut_salaries(store, city, e)?;
            if cut > 0 {
                activity.log(
                    ActivityKind::SalaryCut,
                    &format!("{cut} office salaries cut over high commercial tax"),
                    serde_json::json!({ "count": cut, "rate": economy.tax_rate_commercial }),
                );
                events.push(SimEvent::SalariesCut { count: cut });
            }
        }

        if let Some(e) = excess(economy.tax_rate_industrial, self.policy.destruction_threshold) {
            for building_id in self.demolish(store, city, e, rng)? {
                activity.log(
                    ActivityKind::BuildingDestroyed,
                    "industrial building closed over high industrial tax",
                    serde_json::json!({
                        "building_id": building_id,
                        "rate": economy.tax_rate_industrial,
                    }),
                );
                events.push(SimEvent::BuildingDestroyed { building_id });
            }
        }

        tracing::info!(%city, day, events = events.len(), "tax penalties applied");
        Ok(events)
    }

    fn exodus<S, R>(
        &self,
        store: &mut S,
        city: CityId,
        excess: Decimal,
        rng: &mut R,
    ) -> Result<u32, EconomyError>
    where
        S: TaxPenaltyStore + ?Sized,
        R: Rng + ?Sized,
    {
        let wanted = excess
            .checked_mul(self.policy.exodus_rate)
            .and_then(|n| n.floor().to_usize())
            .unwrap_or(0);
        if wanted == 0 {
            return Ok(0);
        }
        let residents: Vec<Agent> = store
            .list_agents(city)?
            .into_iter()
            .filter(|a| a.state != AgentState::InJail)
            .collect();
        let leaving: Vec<Agent> = residents.choose_multiple(rng, wanted).cloned().collect();

        let mut left = 0_u32;
        for mut agent in leaving {
            agent.work_building_id = None;
            if store.update_agent(&agent).skip_missing()?.is_none() {
                continue;
            }
            for mut unit in store.list_occupied_units(city)? {
                if unit.tenant_id != Some(agent.id) {
                    continue;
                }
                unit.tenant_id = None;
                unit.lease_start = None;
                unit.paid_through = None;
                unit.status = UnitStatus::Vacant;
                store.update_unit(&unit).skip_missing()?;
            }
            for vehicle in store.list_vehicles(city)? {
                if vehicle.owner_id == agent.id {
                    store.delete_vehicle(vehicle.id).skip_missing()?;
                }
            }
            if store.delete_agent(agent.id).skip_missing()?.is_some() {
                left = left.saturating_add(1);
            }
        }
        Ok(left)
    }

    fn cut_salaries<S>(&self, store: &mut S, city: CityId, excess: Decimal) -> Result<u32, EconomyError>
    where
        S: TaxPenaltyStore + ?Sized,
    {
        let factor = excess
            .checked_mul(self.policy.cut_per_percent)
            .and_then(|cut| Decimal::ONE.checked_sub(cut))
            .ok_or(EconomyError::ArithmeticOverflow {
                context: "salary cut factor",
            })?;

        let mut cut = 0_u32;
        for building in store.list_buildings(city)? {
            if catalog::sector(building.building_type) != Some(Sector::Office) {
                continue;
            }
            for mut agent in store.list_agents_working_at(building.id)? {
                let reduced = agent
                    .salary
                    .checked_mul(factor)
                    .ok_or(EconomyError::ArithmeticOverflow {
                        context: "salary cut",
                    })?
                    .round_dp(2)
                    .max(self.policy.minimum_wage)
                    .min(agent.salary);
                if reduced == agent.salary {
                    continue;
                }
                agent.salary = reduced;
                if store.update_agent(&agent).skip_missing()?.is_some() {
                    cut = cut.saturating_add(1);
                }
            }
        }
        Ok(cut)
    }

    fn demolish<S, R>(
        &self,
        store: &mut S,
        city: CityId,
        excess: Decimal,
        rng: &mut R,
    ) -> Result<Vec<BuildingId>, EconomyError>
    where
        S: TaxPenaltyStore + ?Sized,
        R: Rng + ?Sized,
    {
        let chance = excess
            .checked_mul(self.policy.destroy_chance_per_percent)
            .and_then(|p| p.to_f64())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);

        let mut destroyed = Vec::new();
        for building in store.list_buildings(city)? {
            if !building.is_complete()
                || catalog::sector(building.building_type) != Some(Sector::Industrial)
            {
                continue;
            }
            if !rng.random_bool(chance) {
                continue;
            }
            for mut worker in store.list_agents_working_at(building.id)? {
                worker.work_building_id = None;
                if worker.state == AgentState::Working {
                    worker.state = AgentState::Idle;
                }
                store.update_agent(&worker).skip_missing()?;
            }
            if store.delete_building(building.id).skip_missing()?.is_some() {
                tracing::info!(building_id = %building.id, "industrial building demolished");
                destroyed.push(building.id);
            }
        }
        Ok(destroyed)
    }
}

/// Set one sector's tax rate, rejecting rates outside the policy band.
pub fn set_tax_rate<S>(
    store: &mut S,
    city: CityId,
    sector: Sector,
    rate: Decimal,
    policy: &TaxPolicy,
) -> Result<(), EconomyError>
where
    S: CityRepository + ?Sized,
{
    if rate < policy.min_rate || rate > policy.max_rate {
        return Err(EconomyError::TaxRateOutOfRange {
            rate,
            min: policy.min_rate,
            max: policy.max_rate,
        });
    }
    let mut economy = store
        .get_city(city)?
        .ok_or(EconomyError::CityNotFound(city))?
        .economy;
    match sector {
        Sector::Residential => economy.tax_rate_residential = rate,
        Sector::Office => economy.tax_rate_commercial = rate,
        Sector::Industrial => economy.tax_rate_industrial = rate,
    }
    store.update_economy(city, economy)?;
    tracing::info!(%city, ?sector, %rate, "tax rate changed");
    Ok(())
}
