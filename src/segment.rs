//! Flood-fill segmentation of a defended room.
//!
//! Each unique room entry floods the tiles reachable without crossing a
//! defence. The ramparts that stop a flood form that area's near perimeter;
//! the ramparts stacked behind them, reachable only through other ramparts,
//! form its far perimeter.

use crate::constants::*;
use crate::fields::durability::*;
use crate::grid::*;
use crate::location::*;
use crate::terrain::*;
use crate::world::*;
use fnv::FnvHashSet;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How a tile behaves for segmentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileKind {
    Open,
    /// Destructible defence: stops a flood and is recorded.
    Rampart,
    /// Terrain wall or indestructible wall: stops a flood silently.
    Boundary,
}

/// One connected danger region.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseArea {
    /// Entry tile the region was flooded from.
    pub entry: Option<Location>,
    /// Ramparts directly bordering the region, in discovery order.
    pub perimeter_near: Vec<Location>,
    /// Ramparts reachable from the near perimeter only through other ramparts.
    pub perimeter_far: Vec<Location>,
}

#[derive(Clone, Debug)]
pub struct Segmentation {
    /// One area per unique entry, in entry scan order.
    pub areas: Vec<DefenseArea>,
    /// Interior tiles mapped to their 1-based area index; 0 = unassigned.
    pub area_map: Grid4,
}

impl Segmentation {
    /// Area index (0-based) of an interior tile.
    pub fn area_of(&self, loc: Location) -> Option<usize> {
        match self.area_map.at(loc) {
            0 => None,
            index => Some(index as usize - 1),
        }
    }
}

/// Classify every tile of a room from its terrain and structures. Indexed by
/// `Location::index`.
pub fn classify_tiles(terrain: &FastRoomTerrain, structures: &[ObservedStructure]) -> Vec<TileKind> {
    let mut kinds: Vec<TileKind> = (0..ROOM_AREA)
        .map(|index| {
            let loc = Location::from_xy((index % ROOM_WIDTH as usize) as u8, (index / ROOM_WIDTH as usize) as u8);
            if terrain.get(&loc).contains(TerrainFlags::WALL) {
                TileKind::Boundary
            } else {
                TileKind::Open
            }
        })
        .collect();

    for structure in structures {
        let kind = match kinds.get_mut(structure.location.index()) {
            Some(kind) if *kind != TileKind::Boundary => kind,
            _ => continue,
        };
        if is_indestructible_boundary(structure) {
            *kind = TileKind::Boundary;
        } else if is_rampart_class(structure) {
            *kind = TileKind::Rampart;
        }
    }

    kinds
}

/// Drop entries within one tile of any entry scanned before them. Order is
/// significant: a run of adjacent entries collapses onto its first tile.
pub fn unique_entries(entries: &[Location]) -> Vec<Location> {
    let mut unique = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let merged = entries[..index].iter().any(|earlier| earlier.distance_to(*entry) <= 1);
        if !merged {
            unique.push(*entry);
        }
    }

    unique
}

/// Segment a room into danger areas flooded from `entries` (in scan order).
pub fn segment_defense_areas<F>(entries: &[Location], classify: F) -> Segmentation
where
    F: Fn(Location) -> TileKind,
{
    let unique = unique_entries(entries);

    let mut area_map = Grid4::new();
    let mut assigned: FnvHashSet<Location> = FnvHashSet::default();
    let mut areas = Vec::with_capacity(unique.len());
    let mut unmapped_areas = 0;

    for (area_index, entry) in unique.iter().enumerate() {
        let mut area = DefenseArea {
            entry: Some(*entry),
            ..Default::default()
        };
        let mut recorded: FnvHashSet<Location> = FnvHashSet::default();
        let mut queue = VecDeque::new();

        let map_value = u8::try_from(area_index + 1).ok().filter(|v| *v <= Nibble::MAX);
        if map_value.is_none() {
            unmapped_areas += 1;
        }

        let mut visit = |loc: Location, queue: &mut VecDeque<Location>, area: &mut DefenseArea| match classify(loc) {
            TileKind::Boundary => {}
            TileKind::Rampart => {
                if recorded.insert(loc) {
                    area.perimeter_near.push(loc);
                }
            }
            TileKind::Open => {
                if assigned.insert(loc) {
                    if let Some(value) = map_value {
                        let _ = area_map.set(loc.x(), loc.y(), value);
                    }
                    queue.push_back(loc);
                }
            }
        };

        visit(*entry, &mut queue, &mut area);

        while let Some(loc) = queue.pop_front() {
            for neighbor in loc.neighbors() {
                visit(neighbor, &mut queue, &mut area);
            }
        }

        area.perimeter_far = far_perimeter(&area.perimeter_near, &classify);
        areas.push(area);
    }

    if unmapped_areas > 0 {
        warn!("{} defense areas exceed the area map range and are not mapped", unmapped_areas);
    }

    debug!(
        "Segmented {} entries into {} defense areas",
        entries.len(),
        areas.len()
    );

    Segmentation { areas, area_map }
}

fn far_perimeter<F>(near: &[Location], classify: &F) -> Vec<Location>
where
    F: Fn(Location) -> TileKind,
{
    let mut seen: FnvHashSet<Location> = near.iter().copied().collect();
    let mut queue: VecDeque<Location> = near.iter().copied().collect();
    let mut far = Vec::new();

    while let Some(loc) = queue.pop_front() {
        for neighbor in loc.neighbors() {
            if classify(neighbor) == TileKind::Rampart && seen.insert(neighbor) {
                far.push(neighbor);
                queue.push_back(neighbor);
            }
        }
    }

    far
}
