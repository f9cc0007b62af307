//! Integration tests for the `metropolis-db` storage layer.
//!
//! These exercise the public repository API across tables and the JSON
//! snapshot round trip through a real file in the system temp directory.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::collections::VecDeque;

use metropolis_db::{
    AgentRepository, CityRepository, MemoryStore, RentalRepository, SnapshotStore, StoreError,
    StoreResultExt,
};
use metropolis_types::{
    Agent, AgentId, AgentState, BuildingId, City, CityEconomy, CityId, DailyPipeline, GameTime,
    Position,
    RentWarning, RentalUnit, RentalUnitId, Schedule, UnitStatus, WarningId, WarningStatus,
    Watermarks,
};
use rust_decimal_macros::dec;

fn city() -> City {
    City {
        id: CityId::new(),
        name: String::from("Snapshot City"),
        time: GameTime::default(),
        treasury: dec!(50000),
        economy: CityEconomy::default(),
        mayor_id: None,
        watermarks: Watermarks::default(),
    }
}

fn temp_path() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("metropolis-snapshot-{}.json", uuid::Uuid::now_v7()))
}

#[test]
fn snapshot_roundtrip_restores_watermarks() {
    let mut store = MemoryStore::new();
    let c = city();
    let id = c.id;
    store.insert_city(c).unwrap();
    store
        .set_watermarks(
            id,
            Watermarks {
                tax_day: Some(4),
                rent_day: Some(4),
                finance_day: Some(3),
            },
        )
        .unwrap();

    let path = temp_path();
    let snapshots = SnapshotStore::new(&path);
    snapshots.save(&store, 57_600).unwrap();

    let loaded = snapshots.load().unwrap().expect("snapshot exists");
    assert_eq!(loaded.tick, 57_600);
    assert_eq!(loaded.store, store);
    let restored = loaded.store.get_city(id).unwrap().unwrap();
    assert_eq!(restored.watermarks.tax_day, Some(4));
    assert_eq!(restored.watermarks.finance_day, Some(3));

    std::fs::remove_file(&path).ok();
}

#[test]
fn claimed_day_is_persisted_and_not_claimed_again() {
    let mut store = MemoryStore::new();
    let c = city();
    let id = c.id;
    store.insert_city(c).unwrap();

    assert!(store.claim_day(id, DailyPipeline::Finance, 3).unwrap());
    assert!(!store.claim_day(id, DailyPipeline::Finance, 3).unwrap());
    assert!(!store.claim_day(id, DailyPipeline::Finance, 2).unwrap());
    let marks = store.get_city(id).unwrap().unwrap().watermarks;
    assert_eq!(marks.finance_day, Some(3));
    assert_eq!(marks.tax_day, None);

    assert!(!store.claim_day(CityId::new(), DailyPipeline::Tax, 0).unwrap());
}

#[test]
fn missing_snapshot_loads_as_none() {
    let snapshots = SnapshotStore::new(temp_path());
    assert!(snapshots.load().unwrap().is_none());
}

#[test]
fn corrupt_snapshot_is_a_serialization_error() {
    let path = temp_path();
    std::fs::write(&path, b"{ not json").unwrap();
    let err = SnapshotStore::new(&path).load().unwrap_err();
    assert!(matches!(err, StoreError::Serialization { .. }));
    std::fs::remove_file(&path).ok();
}

#[test]
fn open_warnings_track_pending_and_escalated() {
    let mut store = MemoryStore::new();
    let city_id = CityId::new();
    let tenant = AgentId::new();
    let unit = RentalUnit {
        id: RentalUnitId::new(),
        city_id,
        building_id: BuildingId::new(),
        floor: 1,
        unit_number: 2,
        monthly_rent: dec!(800),
        tenant_id: Some(tenant),
        lease_start: Some(0),
        paid_through: Some(0),
        status: UnitStatus::Occupied,
    };
    store.insert_unit(unit.clone()).unwrap();

    let warning = RentWarning {
        id: WarningId::new(),
        city_id,
        unit_id: unit.id,
        tenant_id: tenant,
        amount_owed: dec!(800),
        warning_date: 10,
        due_date: 20,
        status: WarningStatus::Pending,
    };
    store.insert_warning(warning.clone()).unwrap();
    assert_eq!(store.list_open_warnings(unit.id, tenant).unwrap().len(), 1);
    assert!(store.list_due_warnings(city_id, 19).unwrap().is_empty());
    assert_eq!(store.list_due_warnings(city_id, 20).unwrap().len(), 1);

    store
        .set_warning_status(warning.id, WarningStatus::Escalated)
        .unwrap();
    assert_eq!(store.list_open_warnings(unit.id, tenant).unwrap().len(), 1);
    assert!(store.list_due_warnings(city_id, 20).unwrap().is_empty());

    store
        .set_warning_status(warning.id, WarningStatus::Paid)
        .unwrap();
    assert!(store.list_open_warnings(unit.id, tenant).unwrap().is_empty());
}

#[test]
fn vanished_agent_update_is_skipped() {
    let mut store = MemoryStore::new();
    let agent = Agent {
        id: AgentId::new(),
        city_id: CityId::new(),
        name: String::from("Ghost"),
        position: Position::default(),
        destination: None,
        path: VecDeque::new(),
        state: AgentState::Idle,
        schedule: Schedule::default(),
        wallet_balance: dec!(0),
        home_building_id: None,
        work_building_id: None,
        salary: dec!(0),
    };
    assert!(store.update_agent(&agent).skip_missing().unwrap().is_none());
}
