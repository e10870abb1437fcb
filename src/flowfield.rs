//! Direction fields toward a set of target tiles.
//!
//! A flow field stores, for every tile that can reach a target, the screeps
//! `Direction` of the next step along a cheapest path. It is persisted as a
//! 4-bit grid (direction numbers 1..=8, 0 = no move).

use crate::constants::*;
use crate::grid::*;
use crate::location::*;
use fnv::FnvHashSet;
use log::*;
use pathfinding::directed::dijkstra::dijkstra_all;
use screeps::Direction;
use serde::{Deserialize, Serialize};

pub fn direction_to_u8(direction: Direction) -> u8 {
    match direction {
        Direction::Top => 1,
        Direction::TopRight => 2,
        Direction::Right => 3,
        Direction::BottomRight => 4,
        Direction::Bottom => 5,
        Direction::BottomLeft => 6,
        Direction::Left => 7,
        Direction::TopLeft => 8,
    }
}

pub fn direction_from_u8(value: u8) -> Option<Direction> {
    match value {
        1 => Some(Direction::Top),
        2 => Some(Direction::TopRight),
        3 => Some(Direction::Right),
        4 => Some(Direction::BottomRight),
        5 => Some(Direction::Bottom),
        6 => Some(Direction::BottomLeft),
        7 => Some(Direction::Left),
        8 => Some(Direction::TopLeft),
        _ => None,
    }
}

pub fn direction_offset(direction: Direction) -> (i8, i8) {
    match direction {
        Direction::Top => (0, -1),
        Direction::TopRight => (1, -1),
        Direction::Right => (1, 0),
        Direction::BottomRight => (1, 1),
        Direction::Bottom => (0, 1),
        Direction::BottomLeft => (-1, 1),
        Direction::Left => (-1, 0),
        Direction::TopLeft => (-1, -1),
    }
}

/// Direction of the single step from `from` to an adjacent `to`.
pub fn direction_between(from: Location, to: Location) -> Option<Direction> {
    let dx = (to.x() as i16 - from.x() as i16).signum();
    let dy = (to.y() as i16 - from.y() as i16).signum();

    match (dx, dy) {
        (0, -1) => Some(Direction::Top),
        (1, -1) => Some(Direction::TopRight),
        (1, 0) => Some(Direction::Right),
        (1, 1) => Some(Direction::BottomRight),
        (0, 1) => Some(Direction::Bottom),
        (-1, 1) => Some(Direction::BottomLeft),
        (-1, 0) => Some(Direction::Left),
        (-1, -1) => Some(Direction::TopLeft),
        _ => None,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowField {
    directions: Grid4,
}

impl FlowField {
    pub fn new() -> FlowField {
        FlowField::default()
    }

    pub fn grid(&self) -> &Grid4 {
        &self.directions
    }

    pub fn set_direction(&mut self, loc: Location, direction: Direction) {
        let _ = self.directions.set(loc.x(), loc.y(), direction_to_u8(direction));
    }

    pub fn direction_at(&self, loc: Location) -> Option<Direction> {
        direction_from_u8(self.directions.at(loc))
    }

    pub fn next_step(&self, loc: Location) -> Option<Location> {
        let (dx, dy) = direction_offset(self.direction_at(loc)?);
        Location::checked_new(loc.x() as i16 + dx as i16, loc.y() as i16 + dy as i16)
    }

    /// Follow the field from `start` until it stops. Bounded by the room area so
    /// a damaged field cannot loop forever.
    pub fn trace(&self, start: Location) -> Vec<Location> {
        let mut path = Vec::new();
        let mut current = start;

        while let Some(next) = self.next_step(current) {
            if path.len() >= ROOM_AREA {
                break;
            }
            path.push(next);
            current = next;
        }

        path
    }
}

/// Flow field service. `cost(x, y)` is the price of entering a tile; 255 is
/// impassable.
pub trait FlowFieldProvider {
    fn compute_flow_field(&self, from: &[Location], to: &[Location], cost: &dyn Fn(u8, u8) -> u8)
        -> Option<FlowField>;
}

/// Flow field built with a single reverse Dijkstra search from every target
/// at once.
pub struct DijkstraFlowField {
    /// Tiles whose path cost exceeds this are treated as unreachable.
    pub max_cost: u32,
}

impl DijkstraFlowField {
    pub fn new(max_cost: u32) -> DijkstraFlowField {
        DijkstraFlowField { max_cost }
    }
}

impl Default for DijkstraFlowField {
    fn default() -> Self {
        DijkstraFlowField { max_cost: u32::MAX }
    }
}

impl FlowFieldProvider for DijkstraFlowField {
    fn compute_flow_field(
        &self,
        from: &[Location],
        to: &[Location],
        cost: &dyn Fn(u8, u8) -> u8,
    ) -> Option<FlowField> {
        let entry_cost = |loc: Location| -> Option<u32> {
            match cost(loc.x(), loc.y()) {
                BLOCKED => None,
                value => Some(value.max(1) as u32),
            }
        };

        let targets: FnvHashSet<Location> = to.iter().copied().filter(|loc| entry_cost(*loc).is_some()).collect();
        if targets.is_empty() {
            return None;
        }

        // `None` is a virtual node joined to every target at no cost. Searching
        // from it over reversed edges gives each tile its cost to the nearest
        // target and its parent is the next step.
        let reached = dijkstra_all(&None, |node: &Option<Location>| -> Vec<(Option<Location>, u32)> {
            match node {
                None => targets.iter().map(|loc| (Some(*loc), 0)).collect(),
                Some(loc) => match entry_cost(*loc) {
                    Some(step) => loc
                        .neighbors()
                        .filter(|neighbor| entry_cost(*neighbor).is_some())
                        .map(|neighbor| (Some(neighbor), step))
                        .collect(),
                    None => Vec::new(),
                },
            }
        });

        let mut field = FlowField::new();
        for (node, (parent, total)) in reached.iter() {
            if *total > self.max_cost {
                continue;
            }
            if let (Some(loc), Some(next)) = (node, parent) {
                if let Some(direction) = direction_between(*loc, *next) {
                    field.set_direction(*loc, direction);
                }
            }
        }

        let reachable = from
            .iter()
            .any(|loc| targets.contains(loc) || field.direction_at(*loc).is_some());

        if !reachable {
            debug!("No flow field path from {} start tiles to {} targets", from.len(), targets.len());
            return None;
        }

        Some(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(_x: u8, _y: u8) -> u8 {
        1
    }

    #[test]
    fn straight_line_points_at_target() {
        let provider = DijkstraFlowField::default();
        let target = Location::from_xy(25, 25);

        let field = provider
            .compute_flow_field(&[Location::from_xy(20, 25)], &[target], &open)
            .unwrap();

        assert_eq!(field.direction_at(Location::from_xy(24, 25)), Some(Direction::Right));
        assert_eq!(field.direction_at(Location::from_xy(25, 26)), Some(Direction::Top));
        assert_eq!(field.direction_at(Location::from_xy(24, 24)), Some(Direction::BottomRight));
        assert_eq!(field.trace(Location::from_xy(20, 25)).len(), 5);
        assert_eq!(field.direction_at(target), None);
    }

    #[test]
    fn trace_reaches_target() {
        let provider = DijkstraFlowField::default();
        let target = Location::from_xy(40, 40);
        let start = Location::from_xy(2, 2);

        let field = provider.compute_flow_field(&[start], &[target], &open).unwrap();
        let path = field.trace(start);

        assert_eq!(path.last(), Some(&target));
        assert_eq!(path.len(), 38);
    }

    #[test]
    fn routes_around_walls() {
        let provider = DijkstraFlowField::default();
        // Wall at x = 10 with a single gap at y = 45.
        let cost = |x: u8, y: u8| if x == 10 && y != 45 { 255 } else { 1 };
        let start = Location::from_xy(5, 5);
        let target = Location::from_xy(15, 5);

        let field = provider.compute_flow_field(&[start], &[target], &cost).unwrap();
        let path = field.trace(start);

        assert!(path.contains(&Location::from_xy(10, 45)));
        assert_eq!(path.last(), Some(&target));
    }

    #[test]
    fn unreachable_target_has_no_field() {
        let provider = DijkstraFlowField::default();
        let cost = |x: u8, _y: u8| if x == 10 { 255 } else { 1 };

        let field = provider.compute_flow_field(&[Location::from_xy(5, 5)], &[Location::from_xy(15, 5)], &cost);

        assert!(field.is_none());
    }

    #[test]
    fn search_cost_limit_cuts_off_far_tiles() {
        let provider = DijkstraFlowField { max_cost: 5 };
        let target = Location::from_xy(25, 25);

        let near = provider.compute_flow_field(&[Location::from_xy(20, 25)], &[target], &open);
        let far = provider.compute_flow_field(&[Location::from_xy(10, 25)], &[target], &open);

        assert!(near.is_some());
        assert!(far.is_none());
    }

    #[test]
    fn direction_numbers_round_trip() {
        for value in 1..=8 {
            let direction = direction_from_u8(value).unwrap();
            assert_eq!(direction_to_u8(direction), value);
        }
        assert_eq!(direction_from_u8(0), None);
        assert_eq!(direction_from_u8(9), None);
    }
}
