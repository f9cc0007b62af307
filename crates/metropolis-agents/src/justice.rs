//! Rent enforcement: warnings, court cases, jail.
//!
//! [`RentEnforcementSimulator::run`] is the daily pass. It claims the day on
//! the city's rent watermark, then runs the stages from the end of the
//! pipeline backwards so that nothing created today is acted on today:
//!
//! ```text
//! release inmates -> adjudicate cases -> escalate warnings -> issue warnings
//! ```
//!
//! [`RentEnforcementSimulator::run_deadlines`] runs the first three stages
//! alone. They only act on deadlines that have passed, so the engine calls
//! it on every other tick and each deadline is met on its exact tick.
//!
//! Rent falls due every rent period counted from `paid_through`. Every
//! deadline is anchored on the tick rent fell due, not on the tick the
//! daily pass noticed it: the warning is due `grace` after that, the hearing
//! is `hearing_delay` after the warning's due date, and release is
//! `jail_days` after the hearing. A tenant with an open warning is not
//! warned again. At the hearing a paid warning is dismissed and anything
//! else ends in eviction and jail.

use metropolis_db::{
    ActivityLogger, AgentRepository, BuildingRepository, CityRepository, JusticeRepository,
    ParcelRepository, RentalRepository, StoreResultExt,
};
use metropolis_types::{
    ActivityKind, AgentState, CaseId, CaseStatus, CityId, CourtCase, DailyPipeline, InmateId,
    InmateStatus, JailInmate, RentWarning, RentalUnitId, Sentence, SimEvent, UnitStatus, UserId,
    Verdict, WarningId, WarningStatus,
};

use crate::config::JusticeConfig;
use crate::error::AgentError;

/// Every repository the rent pipeline touches.
pub trait JusticeStore:
    CityRepository
    + RentalRepository
    + JusticeRepository
    + AgentRepository
    + BuildingRepository
    + ParcelRepository
{
}

impl<T> JusticeStore for T where
    T: CityRepository
        + RentalRepository
        + JusticeRepository
        + AgentRepository
        + BuildingRepository
        + ParcelRepository
        + ?Sized
{
}

fn add_ticks(now: u64, ticks: u64) -> Result<u64, AgentError> {
    now.checked_add(ticks)
        .ok_or(AgentError::ArithmeticOverflow {
            context: "justice deadline",
        })
}

/// Drives the daily rent and justice pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct RentEnforcementSimulator {
    config: JusticeConfig,
}

impl RentEnforcementSimulator {
    /// Create a simulator.
    pub const fn new(config: JusticeConfig) -> Self {
        Self { config }
    }

    /// The durations in use.
    pub const fn config(&self) -> &JusticeConfig {
        &self.config
    }

    /// Daily pass for absolute day `day` at tick `now`: every stage,
    /// including new warnings.
    ///
    /// Does nothing if `day` was already processed.
    pub fn run<S>(
        &self,
        store: &mut S,
        city: CityId,
        now: u64,
        day: u64,
        activity: &mut dyn ActivityLogger,
    ) -> Result<Vec<SimEvent>, AgentError>
    where
        S: JusticeStore + ?Sized,
    {
        if !store.claim_day(city, DailyPipeline::Rent, day)? {
            tracing::debug!(%city, day, "rent enforcement already ran for day");
            return Ok(Vec::new());
        }
        let mut events = self.run_deadlines(store, city, now, activity)?;
        self.issue_warnings(store, city, now, activity, &mut events)?;
        tracing::info!(%city, now, day, events = events.len(), "rent enforcement ran");
        Ok(events)
    }

    /// Release, adjudicate and escalate whatever fell due by tick `now`.
    pub fn run_deadlines<S>(
        &self,
        store: &mut S,
        city: CityId,
        now: u64,
        activity: &mut dyn ActivityLogger,
    ) -> Result<Vec<SimEvent>, AgentError>
    where
        S: JusticeStore + ?Sized,
    {
        let mut events = Vec::new();
        self.release_inmates(store, city, now, activity, &mut events)?;
        self.adjudicate_cases(store, city, now, activity, &mut events)?;
        self.escalate_warnings(store, city, now, activity, &mut events)?;
        Ok(events)
    }

    fn release_inmates<S>(
        &self,
        store: &mut S,
        city: CityId,
        now: u64,
        activity: &mut dyn ActivityLogger,
        events: &mut Vec<SimEvent>,
    ) -> Result<(), AgentError>
    where
        S: JusticeStore + ?Sized,
    {
        for inmate in store.list_due_inmates(city, now)? {
            if store
                .set_inmate_status(inmate.id, InmateStatus::Released)
                .skip_missing()?
                .is_none()
            {
                continue;
            }
            if let Some(mut agent) = store.get_agent(inmate.agent_id)? {
                agent.state = AgentState::Idle;
                store.update_agent(&agent).skip_missing()?;
            }
            activity.log(
                ActivityKind::Released,
                "resident released from jail",
                serde_json::json!({ "agent_id": inmate.agent_id, "tick": now }),
            );
            events.push(SimEvent::InmateReleased {
                agent_id: inmate.agent_id,
            });
        }
        Ok(())
    }

    fn adjudicate_cases<S>(
        &self,
        store: &mut S,
        city: CityId,
        now: u64,
        activity: &mut dyn ActivityLogger,
        events: &mut Vec<SimEvent>,
    ) -> Result<(), AgentError>
    where
        S: JusticeStore + ?Sized,
    {
        for mut case in store.list_due_cases(city, now)? {
            let paid = match case.warning_id {
                Some(id) => store
                    .get_warning(id)?
                    .is_some_and(|w| w.status == WarningStatus::Paid),
                None => false,
            };
            let verdict = if paid {
                Verdict::Dismissed
            } else {
                Verdict::Guilty
            };
            case.verdict = Some(verdict);
            case.sentence = (verdict == Verdict::Guilty).then_some(Sentence::Jail);
            case.status = CaseStatus::Closed;
            if store.update_case(&case).skip_missing()?.is_none() {
                continue;
            }
            tracing::info!(case_id = %case.id, ?verdict, "case adjudicated");
            activity.log(
                ActivityKind::CourtVerdict,
                &format!("court case decided: {verdict:?}"),
                serde_json::json!({
                    "case_id": case.id,
                    "defendant_id": case.defendant_id,
                    "tick": now,
                }),
            );
            events.push(SimEvent::CaseAdjudicated {
                case_id: case.id,
                verdict,
            });

            if verdict == Verdict::Guilty {
                self.evict_and_jail(store, &case, now, activity, events)?;
            }
        }
        Ok(())
    }

    fn evict_and_jail<S>(
        &self,
        store: &mut S,
        case: &CourtCase,
        now: u64,
        activity: &mut dyn ActivityLogger,
        events: &mut Vec<SimEvent>,
    ) -> Result<(), AgentError>
    where
        S: JusticeStore + ?Sized,
    {
        let unit = match case.unit_id {
            Some(id) => store.get_unit(id)?,
            None => None,
        };
        if let Some(mut unit) = unit {
            unit.tenant_id = None;
            unit.lease_start = None;
            unit.paid_through = None;
            unit.status = UnitStatus::Vacant;
            store.update_unit(&unit).skip_missing()?;
        }

        let Some(mut agent) = store.get_agent(case.defendant_id)? else {
            tracing::warn!(agent_id = %case.defendant_id, "defendant vanished, not jailed");
            return Ok(());
        };
        let hearing = case.hearing_date.unwrap_or(now);
        let release_date = add_ticks(hearing, self.config.days(self.config.jail_days))?;
        store.insert_inmate(JailInmate {
            id: InmateId::new(),
            city_id: case.city_id,
            agent_id: agent.id,
            case_id: Some(case.id),
            check_in: now,
            release_date,
            status: InmateStatus::Incarcerated,
        })?;
        agent.state = AgentState::InJail;
        agent.path.clear();
        agent.destination = None;
        store.update_agent(&agent).skip_missing()?;

        activity.log(
            ActivityKind::Jailed,
            &format!("{} evicted and jailed", agent.name),
            serde_json::json!({
                "agent_id": agent.id,
                "release_date": release_date,
                "tick": now,
            }),
        );
        events.push(SimEvent::TenantJailed {
            agent_id: agent.id,
            release_date,
        });
        Ok(())
    }

    fn landlord<S>(store: &S, unit: RentalUnitId) -> Result<Option<UserId>, AgentError>
    where
        S: JusticeStore + ?Sized,
    {
        let Some(unit) = store.get_unit(unit)? else {
            return Ok(None);
        };
        let Some(building) = store.get_building(unit.building_id)? else {
            return Ok(None);
        };
        Ok(store
            .get_parcel(building.parcel_id)?
            .and_then(|p| p.owner_id))
    }

    fn escalate_warnings<S>(
        &self,
        store: &mut S,
        city: CityId,
        now: u64,
        activity: &mut dyn ActivityLogger,
        events: &mut Vec<SimEvent>,
    ) -> Result<(), AgentError>
    where
        S: JusticeStore + ?Sized,
    {
        for warning in store.list_due_warnings(city, now)? {
            if store
                .set_warning_status(warning.id, WarningStatus::Escalated)
                .skip_missing()?
                .is_none()
            {
                continue;
            }
            let case = CourtCase {
                id: CaseId::new(),
                city_id: city,
                warning_id: Some(warning.id),
                unit_id: Some(warning.unit_id),
                defendant_id: warning.tenant_id,
                plaintiff_id: Self::landlord(&*store, warning.unit_id)?,
                amount: warning.amount_owed,
                hearing_date: Some(add_ticks(
                    warning.due_date,
                    self.config.days(self.config.hearing_delay_days),
                )?),
                verdict: None,
                sentence: None,
                status: CaseStatus::Pending,
            };
            let (case_id, defendant_id) = (case.id, case.defendant_id);
            store.insert_case(case)?;
            activity.log(
                ActivityKind::CourtCaseOpened,
                "unpaid rent taken to court",
                serde_json::json!({
                    "case_id": case_id,
                    "warning_id": warning.id,
                    "amount": warning.amount_owed,
                    "tick": now,
                }),
            );
            events.push(SimEvent::CourtCaseOpened {
                case_id,
                defendant_id,
            });
        }
        Ok(())
    }

    fn issue_warnings<S>(
        &self,
        store: &mut S,
        city: CityId,
        now: u64,
        activity: &mut dyn ActivityLogger,
        events: &mut Vec<SimEvent>,
    ) -> Result<(), AgentError>
    where
        S: JusticeStore + ?Sized,
    {
        for unit in store.list_occupied_units(city)? {
            let Some(tenant) = unit.tenant_id else {
                continue;
            };
            let Some(paid_through) = unit.paid_through.or(unit.lease_start) else {
                continue;
            };
            let due_at = add_ticks(paid_through, self.config.rent_period_ticks())?;
            if now < due_at {
                continue;
            }
            if !store.list_open_warnings(unit.id, tenant)?.is_empty() {
                continue;
            }
            let warning = RentWarning {
                id: WarningId::new(),
                city_id: city,
                unit_id: unit.id,
                tenant_id: tenant,
                amount_owed: unit.monthly_rent,
                warning_date: now,
                due_date: add_ticks(due_at, self.config.days(self.config.warning_grace_days))?,
                status: WarningStatus::Pending,
            };
            let warning_id = warning.id;
            store.insert_warning(warning)?;
            activity.log(
                ActivityKind::RentWarning,
                "rent overdue, warning issued",
                serde_json::json!({
                    "warning_id": warning_id,
                    "unit_id": unit.id,
                    "tenant_id": tenant,
                    "amount": unit.monthly_rent,
                    "tick": now,
                }),
            );
            events.push(SimEvent::RentWarningIssued {
                warning_id,
                unit_id: unit.id,
                tenant_id: tenant,
            });
        }
        Ok(())
    }
}

/// Record one rent payment for a unit.
///
/// Deducts the rent from the tenant's wallet, advances `paid_through` by
/// one rent period and marks the tenant's open warnings on the unit paid.
/// Returns the new `paid_through` tick.
pub fn record_rent_payment<S>(
    store: &mut S,
    unit_id: RentalUnitId,
    config: &JusticeConfig,
) -> Result<u64, AgentError>
where
    S: RentalRepository + AgentRepository + ?Sized,
{
    let mut unit = store
        .get_unit(unit_id)?
        .ok_or(AgentError::UnitNotFound(unit_id))?;
    let tenant = unit.tenant_id.ok_or(AgentError::NoTenant(unit_id))?;
    let mut agent = store
        .get_agent(tenant)?
        .ok_or(AgentError::AgentNotFound(tenant))?;

    agent.wallet_balance = agent
        .wallet_balance
        .checked_sub(unit.monthly_rent)
        .ok_or(AgentError::ArithmeticOverflow {
            context: "tenant wallet",
        })?;
    let base = unit.paid_through.or(unit.lease_start).unwrap_or(0);
    let paid_through = add_ticks(base, config.rent_period_ticks())?;
    unit.paid_through = Some(paid_through);

    store.update_agent(&agent)?;
    store.update_unit(&unit)?;
    for warning in store.list_open_warnings(unit_id, tenant)? {
        store.set_warning_status(warning.id, WarningStatus::Paid)?;
    }

    tracing::info!(%unit_id, %tenant, paid_through, "rent paid");
    Ok(paid_through)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]
mod tests {
    use std::collections::VecDeque;

    use metropolis_db::{MemoryStore, RecordingActivityLogger};
    use metropolis_types::{
        Agent, AgentId, Building, BuildingId, BuildingType, City, CityEconomy, Coordinate,
        Density, GameTime, Parcel, ParcelId, Position, RentalUnit, Schedule, Terrain, Watermarks,
    };
    use rust_decimal_macros::dec;

    use super::*;

    const DAY: u64 = 100;

    fn config() -> JusticeConfig {
        JusticeConfig {
            ticks_per_day: DAY,
            ..JusticeConfig::default()
        }
    }

    struct Lease {
        store: MemoryStore,
        city: CityId,
        unit: RentalUnitId,
        tenant: AgentId,
        landlord: UserId,
    }

    fn lease() -> Lease {
        let mut store = MemoryStore::new();
        let city = CityId::new();
        let landlord = UserId::new();
        let parcel = Parcel {
            id: ParcelId::new(),
            city_id: city,
            coordinate: Coordinate::new(0, 0),
            terrain: Terrain::Land,
            zoning: None,
            owner_id: Some(landlord),
            land_value: dec!(10),
        };
        let building = Building {
            id: BuildingId::new(),
            city_id: city,
            parcel_id: parcel.id,
            building_type: BuildingType::Apartment,
            floors: 4,
            power_required: 0,
            water_required: 0,
            powered: true,
            has_water: true,
            construction_progress: 100,
            construction_started_at: Some(0),
            construction_time_ticks: 0,
            density: Density::Medium,
        };
        let tenant = Agent {
            id: AgentId::new(),
            city_id: city,
            name: String::from("Tenant"),
            position: Position::new(0.0, 0.0),
            destination: Some(Coordinate::new(3, 3)),
            path: VecDeque::from([Coordinate::new(1, 1)]),
            state: AgentState::Traveling,
            schedule: Schedule::default(),
            wallet_balance: dec!(2000),
            home_building_id: Some(building.id),
            work_building_id: None,
            salary: dec!(0),
        };
        let unit = RentalUnit {
            id: RentalUnitId::new(),
            city_id: city,
            building_id: building.id,
            floor: 1,
            unit_number: 1,
            monthly_rent: dec!(800),
            tenant_id: Some(tenant.id),
            lease_start: Some(0),
            paid_through: Some(0),
            status: UnitStatus::Occupied,
        };
        let (unit_id, tenant_id) = (unit.id, tenant.id);
        store
            .insert_city(City {
                id: city,
                name: String::from("Leaseton"),
                time: GameTime::default(),
                treasury: dec!(0),
                economy: CityEconomy::default(),
                mayor_id: None,
                watermarks: Watermarks::default(),
            })
            .unwrap();
        store.insert_parcel(parcel).unwrap();
        store.insert_building(building).unwrap();
        store.insert_agent(tenant).unwrap();
        store.insert_unit(unit).unwrap();
        Lease {
            store,
            city,
            unit: unit_id,
            tenant: tenant_id,
            landlord,
        }
    }

    fn day(sim: &RentEnforcementSimulator, l: &mut Lease, d: u64) -> Vec<SimEvent> {
        let mut log = RecordingActivityLogger::new();
        sim.run(&mut l.store, l.city, d * DAY, d, &mut log).unwrap()
    }

    fn at(sim: &RentEnforcementSimulator, l: &mut Lease, tick: u64) -> Vec<SimEvent> {
        let mut log = RecordingActivityLogger::new();
        sim.run_deadlines(&mut l.store, l.city, tick, &mut log).unwrap()
    }

    #[test]
    fn no_warning_before_rent_is_due() {
        let mut l = lease();
        let sim = RentEnforcementSimulator::new(config());
        assert!(day(&sim, &mut l, 29).is_empty());
        let events = day(&sim, &mut l, 30);
        assert!(matches!(events.as_slice(), [SimEvent::RentWarningIssued { .. }]));
    }

    #[test]
    fn open_warning_is_not_duplicated() {
        let mut l = lease();
        let sim = RentEnforcementSimulator::new(config());
        day(&sim, &mut l, 30);
        assert!(day(&sim, &mut l, 31).is_empty());
        assert_eq!(
            l.store.list_open_warnings(l.unit, l.tenant).unwrap().len(),
            1
        );
    }

    #[test]
    fn unpaid_rent_ends_in_jail_and_release() {
        let mut l = lease();
        let sim = RentEnforcementSimulator::new(config());
        day(&sim, &mut l, 30);

        // Due at day 33: escalated into a case with a hearing on day 34.
        let events = day(&sim, &mut l, 33);
        assert_eq!(events.len(), 1);
        let case_id = events
            .iter()
            .find_map(|e| match e {
                SimEvent::CourtCaseOpened { case_id, .. } => Some(*case_id),
                _ => None,
            })
            .unwrap();
        let case = l.store.get_case(case_id).unwrap().unwrap();
        assert_eq!(case.hearing_date, Some(34 * DAY));
        assert_eq!(case.plaintiff_id, Some(l.landlord));
        // A second pass on the same day changes nothing.
        assert!(day(&sim, &mut l, 33).is_empty());
        assert_eq!(
            l.store.get_city(l.city).unwrap().unwrap().watermarks.rent_day,
            Some(33)
        );

        let events = day(&sim, &mut l, 34);
        assert!(events.contains(&SimEvent::CaseAdjudicated {
            case_id,
            verdict: Verdict::Guilty
        }));
        assert!(events.contains(&SimEvent::TenantJailed {
            agent_id: l.tenant,
            release_date: 41 * DAY
        }));
        let agent = l.store.get_agent(l.tenant).unwrap().unwrap();
        assert_eq!(agent.state, AgentState::InJail);
        assert!(agent.path.is_empty());
        assert_eq!(agent.destination, None);
        let unit = l.store.get_unit(l.unit).unwrap().unwrap();
        assert_eq!(unit.status, UnitStatus::Vacant);
        assert_eq!(unit.tenant_id, None);

        assert!(day(&sim, &mut l, 40).is_empty());
        let events = day(&sim, &mut l, 41);
        assert_eq!(
            events,
            vec![SimEvent::InmateReleased { agent_id: l.tenant }]
        );
        let agent = l.store.get_agent(l.tenant).unwrap().unwrap();
        assert_eq!(agent.state, AgentState::Idle);
    }

    #[test]
    fn mid_day_lease_keeps_its_own_deadlines() {
        let mut l = lease();
        let mut unit = l.store.get_unit(l.unit).unwrap().unwrap();
        unit.lease_start = Some(50);
        unit.paid_through = None;
        l.store.update_unit(&unit).unwrap();
        let sim = RentEnforcementSimulator::new(config());
        let due = 50 + 30 * DAY;

        // Rent falls due mid-day 30; the next daily pass notices it.
        assert!(day(&sim, &mut l, 30).is_empty());
        assert_eq!(day(&sim, &mut l, 31).len(), 1);
        let warning = l.store.list_open_warnings(l.unit, l.tenant).unwrap();
        assert_eq!(warning.len(), 1);
        let due_date = due + 3 * DAY;
        assert_eq!(warning[0].due_date, due_date);

        assert!(at(&sim, &mut l, due_date - 1).is_empty());
        let events = at(&sim, &mut l, due_date);
        let case_id = events
            .iter()
            .find_map(|e| match e {
                SimEvent::CourtCaseOpened { case_id, .. } => Some(*case_id),
                _ => None,
            })
            .unwrap();
        let hearing = due_date + DAY;
        assert_eq!(
            l.store.get_case(case_id).unwrap().unwrap().hearing_date,
            Some(hearing)
        );

        assert!(at(&sim, &mut l, hearing - 1).is_empty());
        let release_date = hearing + 7 * DAY;
        assert!(at(&sim, &mut l, hearing).contains(&SimEvent::TenantJailed {
            agent_id: l.tenant,
            release_date
        }));

        assert!(at(&sim, &mut l, release_date - 1).is_empty());
        assert_eq!(
            at(&sim, &mut l, release_date),
            vec![SimEvent::InmateReleased { agent_id: l.tenant }]
        );
    }

    #[test]
    fn paying_after_escalation_dismisses_the_case() {
        let mut l = lease();
        let sim = RentEnforcementSimulator::new(config());
        day(&sim, &mut l, 30);
        day(&sim, &mut l, 33);

        let paid = record_rent_payment(&mut l.store, l.unit, &config()).unwrap();
        assert_eq!(paid, 30 * DAY);

        let events = day(&sim, &mut l, 34);
        assert!(events.iter().any(|e| matches!(
            e,
            SimEvent::CaseAdjudicated {
                verdict: Verdict::Dismissed,
                ..
            }
        )));
        assert!(!events
            .iter()
            .any(|e| matches!(e, SimEvent::TenantJailed { .. })));
        let agent = l.store.get_agent(l.tenant).unwrap().unwrap();
        assert_eq!(agent.wallet_balance, dec!(1200));
        assert_ne!(agent.state, AgentState::InJail);
    }

    #[test]
    fn payment_pushes_next_due_date() {
        let mut l = lease();
        let sim = RentEnforcementSimulator::new(config());
        record_rent_payment(&mut l.store, l.unit, &config()).unwrap();
        assert!(day(&sim, &mut l, 59).is_empty());
        assert_eq!(day(&sim, &mut l, 60).len(), 1);
    }

    #[test]
    fn payment_on_vacant_unit_is_rejected() {
        let mut l = lease();
        let mut unit = l.store.get_unit(l.unit).unwrap().unwrap();
        unit.tenant_id = None;
        unit.status = UnitStatus::Vacant;
        l.store.update_unit(&unit).unwrap();
        assert!(matches!(
            record_rent_payment(&mut l.store, l.unit, &config()),
            Err(AgentError::NoTenant(_))
        ));
    }

    #[test]
    fn stages_are_logged_to_the_activity_feed() {
        let mut l = lease();
        let sim = RentEnforcementSimulator::new(config());
        let mut log = RecordingActivityLogger::new();
        for d in [30, 33, 34] {
            sim.run(&mut l.store, l.city, d * DAY, d, &mut log).unwrap();
        }
        assert_eq!(log.count(ActivityKind::RentWarning), 1);
        assert_eq!(log.count(ActivityKind::CourtCaseOpened), 1);
        assert_eq!(log.count(ActivityKind::CourtVerdict), 1);
        assert_eq!(log.count(ActivityKind::Jailed), 1);
    }
}
