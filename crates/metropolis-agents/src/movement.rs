//! Resident movement and daily commute.
//!
//! Each tick a resident with a path walks toward its next waypoint. Within
//! one step of the waypoint it snaps onto it and pops it. A resident with
//! no path checks its schedule: at `work_start` an idle resident heads to
//! work, at `work_end` a working resident heads home. Routing tries the
//! walking grid first and falls back to the road network; no route leaves
//! the resident idle. Jailed residents do not move.

use std::collections::VecDeque;

use metropolis_db::{AgentRepository, BuildingRepository, ParcelRepository, StoreResultExt};
use metropolis_types::{Agent, AgentState, BuildingId, CityId, Coordinate, Position, SimEvent};
use metropolis_world::{RoadPathfinder, WalkingPathfinder};

use crate::config::MovementConfig;
use crate::error::AgentError;

/// Result of advancing one mover for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved toward the next waypoint without reaching it.
    Moved,
    /// Reached an intermediate waypoint.
    Waypoint,
    /// Reached the last waypoint.
    Arrived(Coordinate),
}

/// Move `position` along `path` by up to `speed` tiles.
///
/// Returns `None` when the path is empty.
pub fn advance_along(
    position: &mut Position,
    path: &mut VecDeque<Coordinate>,
    speed: f64,
) -> Option<Advance> {
    let target = *path.front()?;
    let goal = Position::from(target);
    let distance = position.distance_to(goal);

    if distance <= speed {
        *position = goal;
        path.pop_front();
        return Some(if path.is_empty() {
            Advance::Arrived(target)
        } else {
            Advance::Waypoint
        });
    }

    let scale = speed / distance;
    position.x += (goal.x - position.x) * scale;
    position.y += (goal.y - position.y) * scale;
    Some(Advance::Moved)
}

/// Route from `from` to `to`: walking first, roads as fallback.
///
/// The current tile is dropped from the front so the first waypoint is the
/// next tile to enter; a same-tile route keeps its single element so that
/// arrival still fires.
pub fn route(
    from: Coordinate,
    to: Coordinate,
    walking: &WalkingPathfinder,
    roads: &RoadPathfinder,
) -> VecDeque<Coordinate> {
    let mut path = walking.find_path(from, to);
    if path.is_empty() {
        path = roads.find_path(from, to);
    }
    let mut path = VecDeque::from(path);
    if path.len() > 1 && path.front() == Some(&from) {
        path.pop_front();
    }
    path
}

/// Tile of the parcel a building stands on.
pub fn building_tile<S>(store: &S, building: Option<BuildingId>) -> Result<Option<Coordinate>, AgentError>
where
    S: BuildingRepository + ParcelRepository + ?Sized,
{
    let Some(id) = building else {
        return Ok(None);
    };
    let Some(b) = store.get_building(id)? else {
        return Ok(None);
    };
    Ok(store.get_parcel(b.parcel_id)?.map(|p| p.coordinate))
}

/// Moves residents and starts their commutes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentSimulator {
    config: MovementConfig,
}

impl AgentSimulator {
    /// Create a simulator.
    pub const fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    /// Advance every resident of `city` by one tick at in-game `hour`.
    pub fn run<S>(
        &self,
        store: &mut S,
        city: CityId,
        hour: u32,
        walking: &WalkingPathfinder,
        roads: &RoadPathfinder,
    ) -> Result<Vec<SimEvent>, AgentError>
    where
        S: AgentRepository + BuildingRepository + ParcelRepository + ?Sized,
    {
        let mut events = Vec::new();
        for mut agent in store.list_agents(city)? {
            if agent.state == AgentState::InJail {
                continue;
            }
            let changed = if agent.path.is_empty() {
                self.follow_schedule(&*store, &mut agent, hour, walking, roads)?
            } else {
                self.walk(&*store, &mut agent, &mut events)?
            };
            if changed {
                store.update_agent(&agent).skip_missing()?;
            }
        }
        Ok(events)
    }

    fn walk<S>(
        &self,
        store: &S,
        agent: &mut Agent,
        events: &mut Vec<SimEvent>,
    ) -> Result<bool, AgentError>
    where
        S: BuildingRepository + ParcelRepository + ?Sized,
    {
        let Some(step) = advance_along(&mut agent.position, &mut agent.path, self.config.walk_speed)
        else {
            return Ok(false);
        };
        match step {
            Advance::Moved => {}
            Advance::Waypoint => events.push(SimEvent::AgentMoved {
                agent_id: agent.id,
                position: agent.position,
            }),
            Advance::Arrived(at) => {
                agent.destination = None;
                let at_work = building_tile(store, agent.work_building_id)? == Some(at);
                agent.state = if at_work {
                    AgentState::Working
                } else {
                    AgentState::Idle
                };
                tracing::debug!(agent_id = %agent.id, %at, state = ?agent.state, "agent arrived");
                events.push(SimEvent::AgentArrived {
                    agent_id: agent.id,
                    destination: at,
                });
            }
        }
        Ok(true)
    }

    fn follow_schedule<S>(
        &self,
        store: &S,
        agent: &mut Agent,
        hour: u32,
        walking: &WalkingPathfinder,
        roads: &RoadPathfinder,
    ) -> Result<bool, AgentError>
    where
        S: BuildingRepository + ParcelRepository + ?Sized,
    {
        let target = if hour == agent.schedule.work_start && agent.state == AgentState::Idle {
            agent.work_building_id
        } else if hour == agent.schedule.work_end && agent.state == AgentState::Working {
            agent.home_building_id
        } else {
            return Ok(false);
        };
        let Some(goal) = building_tile(store, target)? else {
            return Ok(false);
        };
        let path = route(agent.position.nearest_tile(), goal, walking, roads);
        if path.is_empty() {
            return Ok(false);
        }
        agent.path = path;
        agent.destination = Some(goal);
        agent.state = AgentState::Traveling;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use metropolis_db::MemoryStore;
    use metropolis_types::{
        AgentId, Building, BuildingType, Density, Parcel, ParcelId, Schedule, Terrain,
    };
    use rust_decimal_macros::dec;

    use super::*;

    struct Town {
        store: MemoryStore,
        city: CityId,
        agent: AgentId,
    }

    fn place(store: &mut MemoryStore, city: CityId, at: Coordinate, bt: BuildingType) -> BuildingId {
        let parcel = Parcel {
            id: ParcelId::new(),
            city_id: city,
            coordinate: at,
            terrain: Terrain::Land,
            zoning: None,
            owner_id: None,
            land_value: dec!(10),
        };
        let building = Building {
            id: BuildingId::new(),
            city_id: city,
            parcel_id: parcel.id,
            building_type: bt,
            floors: 1,
            power_required: 0,
            water_required: 0,
            powered: true,
            has_water: true,
            construction_progress: 100,
            construction_started_at: Some(0),
            construction_time_ticks: 0,
            density: Density::Low,
        };
        let id = building.id;
        store.insert_parcel(parcel).unwrap();
        store.insert_building(building).unwrap();
        id
    }

    fn town(state: AgentState) -> Town {
        let mut store = MemoryStore::new();
        let city = CityId::new();
        let home = place(&mut store, city, Coordinate::new(0, 0), BuildingType::House);
        let work = place(&mut store, city, Coordinate::new(3, 0), BuildingType::Office);
        let agent = Agent {
            id: AgentId::new(),
            city_id: city,
            name: String::from("Walker"),
            position: Position::new(0.0, 0.0),
            destination: None,
            path: VecDeque::new(),
            state,
            schedule: Schedule::default(),
            wallet_balance: dec!(0),
            home_building_id: Some(home),
            work_building_id: Some(work),
            salary: dec!(1000),
        };
        let id = agent.id;
        store.insert_agent(agent).unwrap();
        Town {
            store,
            city,
            agent: id,
        }
    }

    #[test]
    fn advance_snaps_within_one_step() {
        let mut pos = Position::new(0.0, 0.0);
        let mut path = VecDeque::from([Coordinate::new(1, 0), Coordinate::new(2, 0)]);
        assert_eq!(advance_along(&mut pos, &mut path, 0.6), Some(Advance::Moved));
        assert!((pos.x - 0.6).abs() < 1e-9);
        assert_eq!(advance_along(&mut pos, &mut path, 0.6), Some(Advance::Waypoint));
        assert_eq!(pos, Position::new(1.0, 0.0));
        assert_eq!(path.len(), 1);
        advance_along(&mut pos, &mut path, 0.6);
        assert_eq!(
            advance_along(&mut pos, &mut path, 0.6),
            Some(Advance::Arrived(Coordinate::new(2, 0)))
        );
        assert_eq!(advance_along(&mut pos, &mut path, 0.6), None);
    }

    #[test]
    fn commute_to_work_and_back() {
        let mut t = town(AgentState::Idle);
        let walking = WalkingPathfinder::new(8, 8);
        let roads = RoadPathfinder::default();
        let sim = AgentSimulator::new(MovementConfig { walk_speed: 1.0 });

        // Outside commute hours nothing happens.
        assert!(sim.run(&mut t.store, t.city, 8, &walking, &roads).unwrap().is_empty());
        assert!(t.store.get_agent(t.agent).unwrap().unwrap().path.is_empty());

        // 09:00 starts the commute.
        sim.run(&mut t.store, t.city, 9, &walking, &roads).unwrap();
        let a = t.store.get_agent(t.agent).unwrap().unwrap();
        assert_eq!(a.state, AgentState::Traveling);
        assert_eq!(a.destination, Some(Coordinate::new(3, 0)));
        assert_eq!(a.path.len(), 3);

        let mut arrived = false;
        for _ in 0..3 {
            let events = sim.run(&mut t.store, t.city, 9, &walking, &roads).unwrap();
            arrived |= events
                .iter()
                .any(|e| matches!(e, SimEvent::AgentArrived { .. }));
        }
        assert!(arrived);
        let a = t.store.get_agent(t.agent).unwrap().unwrap();
        assert_eq!(a.state, AgentState::Working);
        assert_eq!(a.destination, None);

        // 17:00 heads home and arrives idle.
        for _ in 0..4 {
            sim.run(&mut t.store, t.city, 17, &walking, &roads).unwrap();
        }
        let a = t.store.get_agent(t.agent).unwrap().unwrap();
        assert_eq!(a.state, AgentState::Idle);
        assert_eq!(a.position.nearest_tile(), Coordinate::new(0, 0));
    }

    #[test]
    fn jailed_agents_do_not_move() {
        let mut t = town(AgentState::InJail);
        let mut a = t.store.get_agent(t.agent).unwrap().unwrap();
        a.path = VecDeque::from([Coordinate::new(1, 0)]);
        t.store.update_agent(&a).unwrap();
        let sim = AgentSimulator::default();
        sim.run(
            &mut t.store,
            t.city,
            9,
            &WalkingPathfinder::new(8, 8),
            &RoadPathfinder::default(),
        )
        .unwrap();
        let after = t.store.get_agent(t.agent).unwrap().unwrap();
        assert_eq!(after.position, Position::new(0.0, 0.0));
    }

    #[test]
    fn no_route_leaves_agent_idle() {
        let mut t = town(AgentState::Idle);
        let mut walking = WalkingPathfinder::new(8, 8);
        walking.set_obstacles((0..8).map(|y| Coordinate::new(2, y)));
        AgentSimulator::default()
            .run(&mut t.store, t.city, 9, &walking, &RoadPathfinder::default())
            .unwrap();
        let a = t.store.get_agent(t.agent).unwrap().unwrap();
        assert_eq!(a.state, AgentState::Idle);
        assert!(a.path.is_empty());
    }
}
