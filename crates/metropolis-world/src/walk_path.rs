//! 8-directional pedestrian routing over the bounded city grid.
//!
//! Straight steps cost [`STRAIGHT_COST`], diagonal steps [`DIAGONAL_COST`]
//! (10 and 14, an integer approximation of 1 and sqrt 2). The octile
//! heuristic is admissible for these costs. A diagonal step is only allowed
//! when both orthogonal tiles it passes between are free.
//!
//! Obstacles are building footprints and water. The start and goal tiles
//! are exempt so that agents can leave and enter buildings.

use std::collections::BTreeSet;

use metropolis_db::{BuildingRepository, ParcelRepository};
use metropolis_types::{CityId, Coordinate, Terrain};
use pathfinding::prelude::astar;

use crate::catalog::blocks_walking;
use crate::error::WorldError;

/// Cost of an orthogonal step.
pub const STRAIGHT_COST: u32 = 10;

/// Cost of a diagonal step.
pub const DIAGONAL_COST: u32 = 14;

/// All eight neighbour offsets.
const NEIGHBOURS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Grid pathfinder for agents on foot.
#[derive(Debug, Clone)]
pub struct WalkingPathfinder {
    width: i32,
    height: i32,
    obstacles: BTreeSet<Coordinate>,
}

impl WalkingPathfinder {
    /// Create a pathfinder over a `width` x `height` grid with no obstacles.
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            obstacles: BTreeSet::new(),
        }
    }

    /// Collect the obstacles of a city: water parcels and the parcels of
    /// every building that is not walkable.
    pub fn obstacles_from_store<S>(store: &S, city: CityId) -> Result<Vec<Coordinate>, WorldError>
    where
        S: ParcelRepository + BuildingRepository + ?Sized,
    {
        let parcels = store.list_parcels(city)?;
        let mut blocked: BTreeSet<Coordinate> = parcels
            .iter()
            .filter(|p| p.terrain == Terrain::Water)
            .map(|p| p.coordinate)
            .collect();
        for b in store.list_buildings(city)? {
            if !blocks_walking(b.building_type) {
                continue;
            }
            if let Some(p) = parcels.iter().find(|p| p.id == b.parcel_id) {
                blocked.insert(p.coordinate);
            }
        }
        Ok(blocked.into_iter().collect())
    }

    /// Replace the obstacle set wholesale.
    pub fn set_obstacles(&mut self, obstacles: impl IntoIterator<Item = Coordinate>) {
        self.obstacles = obstacles.into_iter().collect();
    }

    /// Whether a tile is inside the grid.
    pub const fn in_bounds(&self, c: Coordinate) -> bool {
        c.x >= 0 && c.y >= 0 && c.x < self.width && c.y < self.height
    }

    /// Whether a tile is inside the grid and not an obstacle.
    pub fn is_walkable(&self, c: Coordinate) -> bool {
        self.in_bounds(c) && !self.obstacles.contains(&c)
    }

    fn successors(&self, c: Coordinate, start: Coordinate, goal: Coordinate) -> Vec<(Coordinate, u32)> {
        let open = |t: Coordinate| t == start || t == goal || self.is_walkable(t);
        NEIGHBOURS
            .iter()
            .filter_map(|&(dx, dy)| {
                let next = Coordinate::new(c.x.checked_add(dx)?, c.y.checked_add(dy)?);
                if !self.in_bounds(next) || !open(next) {
                    return None;
                }
                if dx != 0 && dy != 0 {
                    let side_a = Coordinate::new(next.x, c.y);
                    let side_b = Coordinate::new(c.x, next.y);
                    if !self.is_walkable(side_a) || !self.is_walkable(side_b) {
                        return None;
                    }
                    return Some((next, DIAGONAL_COST));
                }
                Some((next, STRAIGHT_COST))
            })
            .collect()
    }

    /// Octile distance between two tiles.
    fn octile(a: Coordinate, b: Coordinate) -> u32 {
        let dx = a.x.abs_diff(b.x);
        let dy = a.y.abs_diff(b.y);
        let (long, short) = if dx > dy { (dx, dy) } else { (dy, dx) };
        long.saturating_mul(STRAIGHT_COST)
            .saturating_add(short.saturating_mul(DIAGONAL_COST.saturating_sub(STRAIGHT_COST)))
    }

    /// Shortest walking route from `start` to `goal`, both endpoints
    /// included.
    ///
    /// Returns `[start]` when the two are equal and an empty path when
    /// either endpoint is off the grid or the goal is walled off.
    pub fn find_path(&self, start: Coordinate, goal: Coordinate) -> Vec<Coordinate> {
        if !self.in_bounds(start) || !self.in_bounds(goal) {
            return Vec::new();
        }
        if start == goal {
            return vec![start];
        }
        astar(
            &start,
            |&c| self.successors(c, start, goal),
            |&c| Self::octile(c, goal),
            |&c| c == goal,
        )
        .map(|(path, _cost)| path)
        .unwrap_or_default()
    }
}
