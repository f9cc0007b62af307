//! The engine: one city, one clock, one tick at a time.
//!
//! Each call to [`Engine::tick`] runs, in order:
//!
//! 1. **Clock** -- advance one tick and persist the city's in-game time.
//! 2. **Grid** -- on resource ticks, recompute power and water rationing.
//! 3. **Construction** -- advance building progress. Completions refresh
//!    the road graph and walking obstacles.
//! 4. **Agents** -- walk residents along their paths and apply schedules.
//! 5. **Vehicles** -- drive vehicles and refresh road traffic loads.
//! 6. **Tax penalties** -- once per day at the penalty hour.
//! 7. **Rent enforcement** -- the daily pass at midnight; on every other
//!    tick only the deadline stages, so releases and hearings land on
//!    their exact tick.
//! 8. **Finance** -- once per day at the finance hour.
//! 9. **Elections** -- every `poll_interval_ticks`, against wall-clock time.
//! 10. **Publish** -- the tick event, then any day or night notification.
//!
//! Each daily pipeline fires on the first tick at or past its hour. The
//! simulators claim their day on the city's persisted watermark before
//! touching anything, so a day never runs twice; the engine's own
//! [`PeriodGate`]s only skip that lookup on the ticks in between. A gate
//! whose watermark was never written starts closed for the current day if
//! its hour has already passed, so a fresh city starting at 08:00 first
//! runs rent at the next midnight and tax penalties at the next 03:00.
//!
//! Any error returned here is fatal for the run: entities that vanish
//! mid-tick are already skipped inside the simulators.

use chrono::{DateTime, Utc};
use metropolis_agents::{
    AgentError, AgentSimulator, ElectionService, GovernanceError, RentEnforcementSimulator,
    VehicleSimulator,
};
use metropolis_db::{ActivityLogger, MemoryStore, SnapshotStore, Store, StoreError, TracingActivityLogger};
use metropolis_economy::{
    Demand, DemandCalculator, EconomyError, FinanceSimulator, TaxPenaltySimulator,
};
use metropolis_types::{CityId, Coordinate, EngineNotification, PeriodGate, SimEvent, TickEvent};
use metropolis_world::{
    ConstructionSimulator, ResourceGridSimulator, RoadPathfinder, WalkingPathfinder, WorldError,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::clock::{ClockError, SimulationClock};
use crate::config::SimulationConfig;
use crate::publisher::{EngineSubscriber, Publisher, SubscriberId};

/// Hour of day the rent pipeline runs.
const RENT_HOUR: u32 = 0;

/// Errors that abort a tick.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The engine's city is missing from the store.
    #[error("city {0} not found")]
    CityNotFound(CityId),

    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// Storage failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// Grid, construction or pathfinding failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// Movement or rent enforcement failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// The election poll failed.
    #[error("governance error: {source}")]
    Governance {
        /// The underlying governance error.
        #[from]
        source: GovernanceError,
    },

    /// Tax penalties or finance failed.
    #[error("economy error: {source}")]
    Economy {
        /// The underlying economy error.
        #[from]
        source: EconomyError,
    },
}

/// Drives every simulator of one city over a store.
pub struct Engine<S> {
    store: S,
    city: CityId,
    clock: SimulationClock,

    grid: ResourceGridSimulator,
    construction: ConstructionSimulator,
    agents: AgentSimulator,
    vehicles: VehicleSimulator,
    tax: TaxPenaltySimulator,
    rent: RentEnforcementSimulator,
    finance: FinanceSimulator,
    elections: ElectionService,
    demand: DemandCalculator,
    finance_hour: u32,

    roads: RoadPathfinder,
    walking: WalkingPathfinder,

    tax_gate: PeriodGate,
    rent_gate: PeriodGate,
    finance_gate: PeriodGate,

    rng: StdRng,
    activity: Box<dyn ActivityLogger>,
    publisher: Publisher,
}

impl<S> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("city", &self.city)
            .field("tick", &self.clock.tick())
            .field("subscribers", &self.publisher.len())
            .finish_non_exhaustive()
    }
}

impl<S: Store> Engine<S> {
    /// Build an engine for `city`, resuming from the tick and watermarks
    /// stored on the city row.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::CityNotFound`] if the city is missing, or a
    /// clock error for an invalid time configuration.
    pub fn new(store: S, city: CityId, config: &SimulationConfig) -> Result<Self, TickError> {
        let row = store.get_city(city)?.ok_or(TickError::CityNotFound(city))?;
        let clock = SimulationClock::at_tick(config.time, row.time.tick)?;

        let mut justice = config.justice;
        justice.ticks_per_day = config.time.ticks_per_day();

        let tax_gate = initial_gate(&clock, row.watermarks.tax_day, config.economy.tax.penalty_hour);
        let rent_gate = initial_gate(&clock, row.watermarks.rent_day, RENT_HOUR);
        let finance_gate = initial_gate(
            &clock,
            row.watermarks.finance_day,
            config.economy.finance.finance_hour,
        );

        let roads = RoadPathfinder::from_store(&store, city)?;
        let walking = walking_from_store(&store, city)?;

        info!(
            %city,
            name = %row.name,
            tick = row.time.tick,
            tax_day = ?row.watermarks.tax_day,
            rent_day = ?row.watermarks.rent_day,
            finance_day = ?row.watermarks.finance_day,
            road_tiles = roads.len(),
            "engine initialized"
        );

        Ok(Self {
            store,
            city,
            clock,
            grid: ResourceGridSimulator::new(
                config.grid.resource_interval_ticks,
                config.grid.power_per_plant,
                config.grid.water_per_tower,
            ),
            construction: ConstructionSimulator::new(),
            agents: AgentSimulator::new(config.movement),
            vehicles: VehicleSimulator::new(),
            tax: TaxPenaltySimulator::new(config.economy.tax.clone()),
            rent: RentEnforcementSimulator::new(justice),
            finance: FinanceSimulator::new(),
            elections: ElectionService::new(config.governance),
            demand: DemandCalculator::new(config.economy.demand.clone(), &config.economy.tax),
            finance_hour: config.economy.finance.finance_hour,
            roads,
            walking,
            tax_gate,
            rent_gate,
            finance_gate,
            rng: StdRng::seed_from_u64(config.engine.seed),
            activity: Box::new(TracingActivityLogger),
            publisher: Publisher::new(),
        })
    }

    /// Replace the activity sink.
    #[must_use]
    pub fn with_activity_logger(mut self, activity: Box<dyn ActivityLogger>) -> Self {
        self.activity = activity;
        self
    }

    /// The city this engine drives.
    pub const fn city_id(&self) -> CityId {
        self.city
    }

    /// The last completed tick.
    pub const fn current_tick(&self) -> u64 {
        self.clock.tick()
    }

    /// The simulated clock.
    pub const fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Read access to the store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Write access to the store, for API-side mutations between ticks.
    ///
    /// Call [`Engine::refresh_paths`] after changing roads or buildings.
    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The road graph the vehicles drive on.
    pub const fn roads(&self) -> &RoadPathfinder {
        &self.roads
    }

    /// The walking grid residents move on.
    pub const fn walking(&self) -> &WalkingPathfinder {
        &self.walking
    }

    /// Add a subscriber.
    pub fn register(&mut self, subscriber: Box<dyn EngineSubscriber>) -> SubscriberId {
        self.publisher.register(subscriber)
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: SubscriberId) -> bool {
        self.publisher.unregister(id)
    }

    /// Announce that the tick loop is starting.
    pub fn start(&mut self) {
        let tick = self.clock.tick();
        info!(city = %self.city, tick, "engine started");
        self.publisher.publish(&EngineNotification::Started { tick });
    }

    /// Announce that the tick loop has stopped.
    pub fn stop(&mut self) {
        let tick = self.clock.tick();
        info!(city = %self.city, tick, "engine stopped");
        self.publisher.publish(&EngineNotification::Stopped { tick });
    }

    /// Current R/O/I demand of the city.
    pub fn demand(&self) -> Result<Demand, TickError> {
        let city = self
            .store
            .get_city(self.city)?
            .ok_or(TickError::CityNotFound(self.city))?;
        let buildings = self.store.list_buildings(self.city)?;
        Ok(self.demand.calculate(&city.economy, &buildings))
    }

    /// Rebuild the road graph and walking obstacles from the store.
    pub fn refresh_paths(&mut self) -> Result<(), TickError> {
        self.roads = RoadPathfinder::from_store(&self.store, self.city)?;
        self.walking = walking_from_store(&self.store, self.city)?;
        debug!(road_tiles = self.roads.len(), "paths refreshed");
        Ok(())
    }

    /// Run one tick using the current wall-clock time for elections.
    pub fn tick(&mut self) -> Result<TickEvent, TickError> {
        self.tick_at(Utc::now())
    }

    /// Run one tick with `now` as the wall-clock time for elections.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Result<TickEvent, TickError> {
        let step = self.clock.advance()?;
        let tick = step.tick;
        let hour = step.time.hour;
        let day = step.absolute_day;
        self.store.update_city_time(self.city, step.time)?;

        let mut events = Vec::new();

        if self.grid.is_resource_tick(tick) {
            let report = self.grid.run(&mut self.store, self.city)?;
            if report.changed > 0 {
                events.push(SimEvent::GridUpdated {
                    power_capacity: report.power_capacity,
                    power_demand: report.power_demand,
                    water_capacity: report.water_capacity,
                    water_demand: report.water_demand,
                    changed: report.changed,
                });
            }
        }

        let completed =
            self.construction
                .run(&mut self.store, self.city, tick, self.activity.as_mut())?;
        if !completed.is_empty() {
            self.refresh_paths()?;
        }
        events.extend(completed);

        events.extend(self.agents.run(
            &mut self.store,
            self.city,
            hour,
            &self.walking,
            &self.roads,
        )?);
        events.extend(
            self.vehicles
                .run(&mut self.store, self.city, &mut self.roads)?,
        );

        if hour >= self.tax.penalty_hour() && self.tax_gate.try_fire(day) {
            let penalties = self.tax.run(
                &mut self.store,
                self.city,
                day,
                &mut self.rng,
                self.activity.as_mut(),
            )?;
            info!(day, events = penalties.len(), "tax penalties applied");
            let demolished = penalties
                .iter()
                .any(|e| matches!(e, SimEvent::BuildingDestroyed { .. }));
            events.extend(penalties);
            if demolished {
                self.refresh_paths()?;
            }
        }

        if hour >= RENT_HOUR && self.rent_gate.try_fire(day) {
            let justice =
                self.rent
                    .run(&mut self.store, self.city, tick, day, self.activity.as_mut())?;
            info!(day, events = justice.len(), "rent enforcement ran");
            events.extend(justice);
        } else {
            events.extend(self.rent.run_deadlines(
                &mut self.store,
                self.city,
                tick,
                self.activity.as_mut(),
            )?);
        }

        if hour >= self.finance_hour && self.finance_gate.try_fire(day) {
            events.extend(
                self.finance
                    .run(&mut self.store, self.city, day, self.activity.as_mut())?,
            );
        }

        let poll_every = self.elections.poll_interval_ticks().max(1);
        if tick.checked_rem(poll_every) == Some(0) {
            events.extend(
                self.elections
                    .poll(&mut self.store, now, self.activity.as_mut())?,
            );
        }

        debug!(
            tick,
            hour,
            day = step.time.day,
            year = step.time.year,
            events = events.len(),
            "tick complete"
        );

        let event = TickEvent {
            tick,
            time: step.time,
            events,
        };
        self.publisher
            .publish(&EngineNotification::Tick(event.clone()));
        if step.day_started {
            info!(day, "day started");
            self.publisher
                .publish(&EngineNotification::DayStarted { day });
        }
        if step.night_started {
            info!(day, "night started");
            self.publisher
                .publish(&EngineNotification::NightStarted { day });
        }
        Ok(event)
    }
}

impl Engine<MemoryStore> {
    /// Write the whole store as a snapshot at the current tick.
    pub fn save_snapshot(&self, snapshots: &SnapshotStore) -> Result<(), StoreError> {
        snapshots.save(&self.store, self.clock.tick())
    }
}

/// Gate for a daily pipeline, seeded from its persisted watermark.
///
/// Without a watermark the current day counts as done once its hour has
/// passed at `clock`'s tick.
fn initial_gate(clock: &SimulationClock, watermark: Option<u64>, hour: u32) -> PeriodGate {
    if watermark.is_some() {
        return PeriodGate::seeded(watermark);
    }
    let tick = clock.tick();
    if clock.hour(tick) >= hour {
        PeriodGate::seeded(Some(clock.absolute_day(tick)))
    } else {
        PeriodGate::new()
    }
}

/// Walking grid sized to the city's parcels, with its obstacles.
fn walking_from_store<S: Store + ?Sized>(
    store: &S,
    city: CityId,
) -> Result<WalkingPathfinder, TickError> {
    let extent = store
        .list_parcels(city)?
        .iter()
        .map(|p| p.coordinate)
        .fold(Coordinate::new(0, 0), |acc, c| {
            Coordinate::new(acc.x.max(c.x.saturating_add(1)), acc.y.max(c.y.saturating_add(1)))
        });
    let mut walking = WalkingPathfinder::new(extent.x, extent.y);
    walking.set_obstacles(WalkingPathfinder::obstacles_from_store(store, city)?);
    Ok(walking)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use metropolis_db::{CityRepository, RecordingActivityLogger};
    use metropolis_types::Watermarks;
    use metropolis_world::create_starting_city;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::publisher::CollectingSubscriber;

    fn engine() -> Engine<MemoryStore> {
        let mut store = MemoryStore::new();
        let city = create_starting_city(&mut store, "Testopolis", 20, 14, dec!(50000)).unwrap();
        Engine::new(store, city.city_id, &SimulationConfig::default())
            .unwrap()
            .with_activity_logger(Box::new(RecordingActivityLogger::new()))
    }

    #[test]
    fn missing_city_is_rejected() {
        let err = Engine::new(MemoryStore::new(), CityId::new(), &SimulationConfig::default())
            .unwrap_err();
        assert!(matches!(err, TickError::CityNotFound(_)));
    }

    #[test]
    fn tick_advances_and_persists_time() {
        let mut engine = engine();
        let event = engine.tick().unwrap();
        assert_eq!(event.tick, 1);
        assert_eq!(engine.current_tick(), 1);
        let city = engine.store().get_city(engine.city_id()).unwrap().unwrap();
        assert_eq!(city.time, event.time);
        assert_eq!(city.time.hour, 8);
    }

    fn marks(engine: &Engine<MemoryStore>) -> Watermarks {
        engine
            .store()
            .get_city(engine.city_id())
            .unwrap()
            .unwrap()
            .watermarks
    }

    #[test]
    fn fresh_city_waits_for_the_next_daily_hours() {
        let mut config = SimulationConfig::default();
        config.time.ticks_per_minute = 1;
        let mut store = MemoryStore::new();
        let city = create_starting_city(&mut store, "Testopolis", 20, 14, dec!(50000)).unwrap();
        let mut engine = Engine::new(store, city.city_id, &config)
            .unwrap()
            .with_activity_logger(Box::new(RecordingActivityLogger::new()));

        // 08:00 on day 0 is already past every daily hour.
        engine.tick().unwrap();
        assert_eq!(marks(&engine), Watermarks::default());

        // Midnight of day 1 is 16 hours of 60 ticks later.
        while engine.current_tick() < 16 * 60 - 1 {
            engine.tick().unwrap();
        }
        assert_eq!(marks(&engine), Watermarks::default());
        engine.tick().unwrap();
        assert_eq!(marks(&engine).rent_day, Some(1));
        assert_eq!(marks(&engine).finance_day, Some(1));
        assert_eq!(marks(&engine).tax_day, None);

        while engine.current_tick() < 19 * 60 {
            engine.tick().unwrap();
        }
        assert_eq!(marks(&engine).tax_day, Some(1));
    }

    #[test]
    fn gates_start_closed_for_a_day_already_past() {
        let mut store = MemoryStore::new();
        let city = create_starting_city(&mut store, "Testopolis", 20, 14, dec!(50000)).unwrap();
        let row = store.get_city(city.city_id).unwrap().unwrap();
        assert_eq!(row.time.tick, 0);
        assert_eq!(row.watermarks, Watermarks::default());
        let engine = Engine::new(store, city.city_id, &SimulationConfig::default()).unwrap();
        assert_eq!(engine.tax_gate.last(), Some(0));
        assert_eq!(engine.rent_gate.last(), Some(0));
        assert_eq!(engine.finance_gate.last(), Some(0));
    }

    #[test]
    fn subscribers_receive_lifecycle_and_ticks() {
        let mut engine = engine();
        let collector = CollectingSubscriber::new();
        let id = engine.register(Box::new(collector.clone()));
        engine.start();
        engine.tick().unwrap();
        engine.stop();
        let received = collector.received();
        assert_eq!(received.len(), 3);
        assert_eq!(received.first(), Some(&EngineNotification::Started { tick: 0 }));
        assert!(matches!(received.get(1), Some(EngineNotification::Tick(t)) if t.tick == 1));
        assert_eq!(received.last(), Some(&EngineNotification::Stopped { tick: 1 }));

        assert!(engine.unregister(id));
        engine.tick().unwrap();
        assert_eq!(collector.received().len(), 3);
    }

    #[test]
    fn demand_reflects_the_city() {
        let engine = engine();
        let demand = engine.demand().unwrap();
        for v in [demand.residential, demand.office, demand.industrial] {
            assert!((-1.0..=1.0).contains(&v));
        }
    }
}
