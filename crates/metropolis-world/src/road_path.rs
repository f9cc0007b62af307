//! A* routing over road tiles with traffic-aware edge costs.
//!
//! Edges connect 4-neighbouring road tiles. Entering a tile costs
//! [`STEP_COST`] plus its traffic load scaled by [`TRAFFIC_PENALTY`].
//! A loaded tile costs at most one and a half steps, so traffic breaks
//! ties between routes of equal length and picks a longer detour only
//! when the detour's extra steps cost less than the load it avoids.

use std::collections::BTreeMap;

use metropolis_db::{ParcelRepository, RoadRepository};
use metropolis_types::{CityId, Coordinate};
use pathfinding::prelude::astar;

use crate::error::WorldError;

/// Cost of entering one road tile with no traffic.
pub const STEP_COST: u32 = 100;

/// Extra cost of entering a fully loaded road tile.
pub const TRAFFIC_PENALTY: u32 = 50;

/// Orthogonal neighbour offsets.
const NEIGHBOURS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Road graph with the latest traffic load per tile.
#[derive(Debug, Clone, Default)]
pub struct RoadPathfinder {
    roads: BTreeMap<Coordinate, f64>,
}

impl RoadPathfinder {
    /// Create a pathfinder over the given road tiles, all unloaded.
    pub fn new(roads: impl IntoIterator<Item = Coordinate>) -> Self {
        let mut finder = Self::default();
        finder.update_roads(roads);
        finder
    }

    /// Build a pathfinder from the roads stored for a city, including their
    /// current traffic loads.
    pub fn from_store<S>(store: &S, city: CityId) -> Result<Self, WorldError>
    where
        S: RoadRepository + ParcelRepository + ?Sized,
    {
        let mut roads = BTreeMap::new();
        for road in store.list_roads(city)? {
            // A road whose parcel vanished is not part of the graph.
            if let Some(parcel) = store.get_parcel(road.parcel_id)? {
                roads.insert(parcel.coordinate, road.traffic_load.clamp(0.0, 1.0));
            }
        }
        Ok(Self { roads })
    }

    /// Replace the road set. Tiles that survive keep their traffic load.
    pub fn update_roads(&mut self, roads: impl IntoIterator<Item = Coordinate>) {
        let previous = std::mem::take(&mut self.roads);
        self.roads = roads
            .into_iter()
            .map(|c| (c, previous.get(&c).copied().unwrap_or(0.0)))
            .collect();
    }

    /// Whether the tile at `(x, y)` is a road.
    pub fn is_road(&self, x: i32, y: i32) -> bool {
        self.roads.contains_key(&Coordinate::new(x, y))
    }

    /// Number of road tiles.
    pub fn len(&self) -> usize {
        self.roads.len()
    }

    /// Whether there are no roads at all.
    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }

    /// Set the traffic load of a road tile, clamped to [0, 1]. Ignored for
    /// non-road tiles.
    pub fn set_traffic_load(&mut self, at: Coordinate, load: f64) {
        if let Some(slot) = self.roads.get_mut(&at) {
            *slot = load.clamp(0.0, 1.0);
        }
    }

    /// Current traffic load of a road tile.
    pub fn traffic_load(&self, at: Coordinate) -> Option<f64> {
        self.roads.get(&at).copied()
    }

    /// Cost of entering `at`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn entry_cost(load: f64) -> u32 {
        // load is clamped to [0, 1], so the product fits in u32.
        let penalty = (load * f64::from(TRAFFIC_PENALTY)).round() as u32;
        STEP_COST.saturating_add(penalty)
    }

    fn successors(&self, c: Coordinate) -> Vec<(Coordinate, u32)> {
        NEIGHBOURS
            .iter()
            .filter_map(|&(dx, dy)| {
                let next = Coordinate::new(c.x.checked_add(dx)?, c.y.checked_add(dy)?);
                let load = self.roads.get(&next)?;
                Some((next, Self::entry_cost(*load)))
            })
            .collect()
    }

    /// Shortest road route from `start` to `goal`, both endpoints included.
    ///
    /// Returns `[start]` when the two are equal and an empty path when
    /// either endpoint is not a road or the roads are disconnected.
    pub fn find_path(&self, start: Coordinate, goal: Coordinate) -> Vec<Coordinate> {
        if !self.roads.contains_key(&start) || !self.roads.contains_key(&goal) {
            return Vec::new();
        }
        if start == goal {
            return vec![start];
        }
        astar(
            &start,
            |&c| self.successors(c),
            |&c| c.manhattan(goal).saturating_mul(STEP_COST),
            |&c| c == goal,
        )
        .map(|(path, _cost)| path)
        .unwrap_or_default()
    }
}
