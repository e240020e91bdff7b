//! Pathfinding seam
//!
//! Route computation is an external collaborator as far as the scheduling
//! core is concerned: the state machine only asks for a route and handles
//! the unreachable case. `GridPathfinder` is a plain breadth-first search
//! good enough for the headless runner and the test suites.

use std::collections::VecDeque;

use ahash::AHashMap;

use crate::core::types::TilePos;
use crate::world::map::WorldMap;

/// Outcome of a route request
#[derive(Debug, Clone, PartialEq)]
pub enum RouteResult {
    /// Tiles to traverse, excluding the start, ending at the goal
    Route(Vec<TilePos>),
    Unreachable,
}

/// Route computation interface consumed by the agent state machine
pub trait Pathfinder {
    fn find_route(&self, map: &WorldMap, from: TilePos, to: TilePos) -> RouteResult;
}

/// Breadth-first search over walkable tiles on a single level
#[derive(Debug, Default)]
pub struct GridPathfinder;

impl GridPathfinder {
    pub fn new() -> Self {
        Self
    }
}

impl Pathfinder for GridPathfinder {
    fn find_route(&self, map: &WorldMap, from: TilePos, to: TilePos) -> RouteResult {
        if from == to {
            return RouteResult::Route(Vec::new());
        }
        // Routes never cross levels
        if from.z != to.z || !map.is_walkable(to) {
            return RouteResult::Unreachable;
        }

        let mut came_from: AHashMap<TilePos, TilePos> = AHashMap::new();
        let mut queue = VecDeque::new();
        queue.push_back(from);
        came_from.insert(from, from);

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut path = Vec::new();
                let mut cursor = to;
                while cursor != from {
                    path.push(cursor);
                    cursor = came_from[&cursor];
                }
                path.reverse();
                return RouteResult::Route(path);
            }
            for next in current.neighbors() {
                if map.is_walkable(next) && !came_from.contains_key(&next) {
                    came_from.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        RouteResult::Unreachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_in_open_field() {
        let map = WorldMap::new(10, 10);
        let pf = GridPathfinder::new();
        let from = TilePos::new(0, 0, 0);
        let to = TilePos::new(3, 0, 0);

        match pf.find_route(&map, from, to) {
            RouteResult::Route(path) => {
                assert_eq!(path.len(), 3);
                assert_eq!(*path.last().unwrap(), to);
            }
            RouteResult::Unreachable => panic!("open field should be routable"),
        }
    }

    #[test]
    fn test_route_around_wall() {
        let mut map = WorldMap::new(10, 10);
        // Vertical wall with a gap at y=9
        for y in 0..9 {
            map.set_blocked(TilePos::new(5, y, 0), true);
        }
        let pf = GridPathfinder::new();
        let from = TilePos::new(0, 0, 0);
        let to = TilePos::new(9, 0, 0);

        match pf.find_route(&map, from, to) {
            RouteResult::Route(path) => {
                // Must detour through the gap
                assert!(path.len() > 9);
                assert!(path.iter().any(|p| p.y == 9));
            }
            RouteResult::Unreachable => panic!("gap should allow a route"),
        }
    }

    #[test]
    fn test_sealed_target_is_unreachable() {
        let mut map = WorldMap::new(10, 10);
        let to = TilePos::new(5, 5, 0);
        for n in to.neighbors() {
            map.set_blocked(n, true);
        }
        let pf = GridPathfinder::new();
        assert_eq!(
            pf.find_route(&map, TilePos::new(0, 0, 0), to),
            RouteResult::Unreachable
        );
    }

    #[test]
    fn test_cross_level_is_unreachable() {
        let map = WorldMap::new(10, 10);
        let pf = GridPathfinder::new();
        assert_eq!(
            pf.find_route(&map, TilePos::new(0, 0, 0), TilePos::new(1, 0, 1)),
            RouteResult::Unreachable
        );
    }

    #[test]
    fn test_trivial_route_is_empty() {
        let map = WorldMap::new(4, 4);
        let pf = GridPathfinder::new();
        let p = TilePos::new(2, 2, 0);
        assert_eq!(pf.find_route(&map, p, p), RouteResult::Route(Vec::new()));
    }
}
