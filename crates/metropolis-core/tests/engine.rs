//! End-to-end tests for the engine over `MemoryStore`.
//!
//! The clock runs at one tick per minute (1440 ticks per day) and every
//! justice duration is one day, so a full rent cycle fits in five days.
//! Tick 0 is 08:00 on day 0.
//! Midnight of absolute day `d` is tick `(24 * d - 8) * 60`.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]

use chrono::{TimeDelta, Utc};
use metropolis_agents::{ElectionService, GovernanceConfig};
use metropolis_core::publisher::CollectingSubscriber;
use metropolis_core::{Engine, SimulationConfig};
use metropolis_db::{
    AgentRepository, CityRepository, MemoryStore, ParcelRepository, SnapshotStore,
};
use metropolis_economy::set_tax_rate;
use metropolis_types::{
    Coordinate, ElectionStatus, EngineNotification, RoadDirection, Sector, SimEvent, TickEvent,
    UserId,
};
use metropolis_world::{create_starting_city, place_road};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const DAY: u64 = 1440;

fn midnight(day: u64) -> u64 {
    (24 * day - 8) * 60
}

fn config() -> SimulationConfig {
    SimulationConfig::parse(
        "
time:
  ticks_per_minute: 1
justice:
  rent_period_days: 1
  warning_grace_days: 1
  hearing_delay_days: 1
  jail_days: 1
engine:
  snapshot_path: null
",
    )
    .unwrap()
}

fn engine() -> Engine<MemoryStore> {
    let mut store = MemoryStore::new();
    let city = create_starting_city(&mut store, "Integration", 20, 14, dec!(75000)).unwrap();
    Engine::new(store, city.city_id, &config()).unwrap()
}

fn run_to(engine: &mut Engine<MemoryStore>, tick: u64) -> Vec<TickEvent> {
    let mut out = Vec::new();
    while engine.current_tick() < tick {
        out.push(engine.tick().unwrap());
    }
    out
}

fn ticks_where(events: &[TickEvent], pred: impl Fn(&SimEvent) -> bool) -> Vec<u64> {
    events
        .iter()
        .flat_map(|t| t.events.iter().filter(|e| pred(e)).map(|_| t.tick))
        .collect()
}

#[test]
fn rent_deadlines_follow_the_lease() {
    let mut engine = engine();
    let events = run_to(&mut engine, midnight(5));

    // Both leases were paid through tick 0, so rent fell due at tick DAY.
    // The daily pass notices at the next midnight; every later stage is
    // counted from the due tick and lands on its exact tick.
    let due = DAY;
    let warning_due = due + DAY;
    let hearing = warning_due + DAY;
    let release = hearing + DAY;

    let warned = ticks_where(&events, |e| matches!(e, SimEvent::RentWarningIssued { .. }));
    assert_eq!(warned, vec![midnight(2), midnight(2)]);
    let due_dates: Vec<u64> = events
        .iter()
        .flat_map(|t| t.events.iter())
        .filter_map(|e| match e {
            SimEvent::RentWarningIssued { due_date, .. } => Some(*due_date),
            _ => None,
        })
        .collect();
    assert_eq!(due_dates, vec![warning_due, warning_due]);

    let cases = ticks_where(&events, |e| matches!(e, SimEvent::CourtCaseOpened { .. }));
    assert_eq!(cases, vec![warning_due, warning_due]);

    let jailed: Vec<u64> = events
        .iter()
        .flat_map(|t| t.events.iter())
        .filter_map(|e| match e {
            SimEvent::TenantJailed { release_date, .. } => Some(*release_date),
            _ => None,
        })
        .collect();
    assert_eq!(jailed, vec![release, release]);
    assert_eq!(
        ticks_where(&events, |e| matches!(e, SimEvent::TenantJailed { .. })),
        vec![hearing, hearing]
    );

    let released = ticks_where(&events, |e| matches!(e, SimEvent::InmateReleased { .. }));
    assert_eq!(released, vec![release, release]);
}

#[test]
fn punitive_taxes_bite_once_per_day() {
    let mut store = MemoryStore::new();
    let start = create_starting_city(&mut store, "Taxed", 20, 14, dec!(75000)).unwrap();
    let city = start.city_id;
    let policy = config().economy.tax;
    set_tax_rate(&mut store, city, Sector::Residential, dec!(13), &policy).unwrap();
    set_tax_rate(&mut store, city, Sector::Office, dec!(17), &policy).unwrap();
    let mut engine = Engine::new(store, city, &config()).unwrap();

    let office_salaries = |engine: &Engine<MemoryStore>| -> Vec<Decimal> {
        engine
            .store()
            .list_agents_working_at(start.office)
            .unwrap()
            .into_iter()
            .map(|a| a.salary)
            .collect()
    };
    let population = |engine: &Engine<MemoryStore>| engine.store().list_agents(city).unwrap().len();

    // 03:00 on days 1 and 2.
    let first = midnight(1) + 180;
    let second = midnight(2) + 180;

    run_to(&mut engine, first - 1);
    assert_eq!(population(&engine), 6);
    assert!(office_salaries(&engine).iter().all(|s| *s == dec!(3200)));

    run_to(&mut engine, first);
    assert_eq!(population(&engine), 5);
    let cut_once = office_salaries(&engine);
    assert!(!cut_once.is_empty());
    assert!(cut_once.iter().all(|s| *s == dec!(2880)));

    run_to(&mut engine, second - 1);
    assert_eq!(population(&engine), 5);
    assert_eq!(office_salaries(&engine), cut_once);

    run_to(&mut engine, second);
    assert_eq!(population(&engine), 4);
    assert!(office_salaries(&engine).iter().all(|s| *s == dec!(2592)));
    assert_eq!(
        engine.store().get_city(city).unwrap().unwrap().watermarks.tax_day,
        Some(2)
    );

    run_to(&mut engine, midnight(3));
    assert_eq!(population(&engine), 4);
    assert!(office_salaries(&engine).iter().all(|s| *s == dec!(2592)));
}

#[test]
fn daily_gates_fire_once_per_day() {
    let mut engine = engine();
    let collector = CollectingSubscriber::new();
    engine.register(Box::new(collector.clone()));

    let mut previous = engine
        .store()
        .get_city(engine.city_id())
        .unwrap()
        .unwrap()
        .watermarks;
    let mut rent_runs = Vec::new();
    while engine.current_tick() < midnight(5) {
        let event = engine.tick().unwrap();
        let marks = engine
            .store()
            .get_city(engine.city_id())
            .unwrap()
            .unwrap()
            .watermarks;
        if marks.rent_day != previous.rent_day {
            rent_runs.push(event.tick);
        }
        previous = marks;
    }

    // The city starts at 08:00, so day 0 is skipped.
    assert_eq!(
        rent_runs,
        vec![midnight(1), midnight(2), midnight(3), midnight(4), midnight(5)]
    );
    assert_eq!(previous.rent_day, Some(5));
    assert_eq!(previous.finance_day, Some(5));
    // 03:00 on day 5 has not been reached.
    assert_eq!(previous.tax_day, Some(4));

    let received = collector.received();
    let mornings: Vec<u64> = received
        .iter()
        .filter_map(|n| match n {
            EngineNotification::DayStarted { day } => Some(*day),
            _ => None,
        })
        .collect();
    let nights: Vec<u64> = received
        .iter()
        .filter_map(|n| match n {
            EngineNotification::NightStarted { day } => Some(*day),
            _ => None,
        })
        .collect();
    assert_eq!(mornings, vec![1, 2, 3, 4]);
    assert_eq!(nights, vec![0, 1, 2, 3, 4]);
}

#[test]
fn snapshot_resume_does_not_repeat_the_day() {
    let path = std::env::temp_dir().join(format!(
        "metropolis-resume-{}-{}.json",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let snapshots = SnapshotStore::new(&path);

    let mut first = engine();
    let city = first.city_id();
    run_to(&mut first, midnight(1) + 40);
    first.save_snapshot(&snapshots).unwrap();
    let before = first.store().get_city(city).unwrap().unwrap();

    let snapshot = snapshots.load().unwrap().unwrap();
    assert_eq!(snapshot.tick, midnight(1) + 40);
    let mut resumed = Engine::new(snapshot.store, city, &config()).unwrap();
    assert_eq!(resumed.current_tick(), midnight(1) + 40);

    let event = resumed.tick().unwrap();
    assert_eq!(event.tick, midnight(1) + 41);
    let after = resumed.store().get_city(city).unwrap().unwrap();
    assert_eq!(after.watermarks, before.watermarks);
    assert_eq!(after.watermarks.rent_day, Some(1));
    assert_eq!(after.treasury, before.treasury);
    assert!(
        !event
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::CreditRatingChanged { .. }))
    );

    std::fs::remove_file(&path).ok();
}

#[test]
fn completed_road_joins_the_graph_in_the_same_tick() {
    let mut engine = engine();
    let city = engine.city_id();
    let parcel = engine
        .store()
        .parcel_at(city, Coordinate::new(9, 9))
        .unwrap()
        .unwrap();
    let now = engine.current_tick();
    place_road(engine.store_mut(), parcel.id, RoadDirection::EastWest, now).unwrap();
    assert!(!engine.roads().is_road(9, 9));

    let event = engine.tick().unwrap();
    assert!(
        event
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::ConstructionCompleted { .. }))
    );
    assert!(engine.roads().is_road(9, 9));
    let path = engine
        .roads()
        .find_path(Coordinate::new(8, 0), Coordinate::new(9, 9));
    assert_eq!(path.last(), Some(&Coordinate::new(9, 9)));
}

#[test]
fn election_advances_on_poll_ticks() {
    let mut engine = engine();
    let city = engine.city_id();
    let service = ElectionService::new(GovernanceConfig::default());
    let t0 = Utc::now();
    let election = service
        .start_election(engine.store_mut(), city, t0)
        .unwrap();
    let user = UserId::new();
    let candidate = service
        .run_for_mayor(engine.store_mut(), election.id, user, None, t0)
        .unwrap();

    let after_nomination = t0 + TimeDelta::hours(73);
    let mut phase_changes = Vec::new();
    while engine.current_tick() < 100 {
        let event = engine.tick_at(after_nomination).unwrap();
        for e in &event.events {
            if let SimEvent::ElectionPhaseChanged { status, .. } = e {
                phase_changes.push((event.tick, *status));
            }
        }
    }
    assert_eq!(phase_changes, vec![(100, ElectionStatus::Voting)]);

    service
        .vote(
            engine.store_mut(),
            election.id,
            UserId::new(),
            candidate.id,
            after_nomination,
        )
        .unwrap();

    let after_voting = after_nomination + TimeDelta::hours(49);
    let mut elected = Vec::new();
    while engine.current_tick() < 200 {
        let event = engine.tick_at(after_voting).unwrap();
        for e in &event.events {
            if let SimEvent::MayorElected { user_id, .. } = e {
                elected.push((event.tick, *user_id));
            }
        }
    }
    assert_eq!(elected, vec![(200, user)]);
    assert_eq!(
        engine.store().get_city(city).unwrap().unwrap().mayor_id,
        Some(user)
    );
}
