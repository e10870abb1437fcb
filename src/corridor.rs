use crate::constants::*;
use crate::fields::damage::decode_damage;
use crate::grid::*;
use crate::location::*;
use serde::{Deserialize, Serialize};

/// Room edge an approach enters from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryEdge {
    Top,
    Right,
    Bottom,
    Left,
}

impl EntryEdge {
    pub const ALL: [EntryEdge; 4] = [EntryEdge::Top, EntryEdge::Right, EntryEdge::Bottom, EntryEdge::Left];

    /// Edge a border tile lies on. Corners belong to the top or bottom edge.
    pub fn of(loc: Location) -> Option<EntryEdge> {
        if loc.y() == 0 {
            Some(EntryEdge::Top)
        } else if loc.y() == ROOM_HEIGHT - 1 {
            Some(EntryEdge::Bottom)
        } else if loc.x() == ROOM_WIDTH - 1 {
            Some(EntryEdge::Right)
        } else if loc.x() == 0 {
            Some(EntryEdge::Left)
        } else {
            None
        }
    }

    /// Tiles one step inside the room along this edge, in ascending order.
    pub fn inset_line(self) -> Vec<Location> {
        match self {
            EntryEdge::Top => (1..ROOM_WIDTH - 1).map(|x| Location::from_xy(x, 1)).collect(),
            EntryEdge::Bottom => (1..ROOM_WIDTH - 1).map(|x| Location::from_xy(x, ROOM_HEIGHT - 2)).collect(),
            EntryEdge::Right => (1..ROOM_HEIGHT - 1).map(|y| Location::from_xy(ROOM_WIDTH - 2, y)).collect(),
            EntryEdge::Left => (1..ROOM_HEIGHT - 1).map(|y| Location::from_xy(1, y)).collect(),
        }
    }
}

/// Whether a scaled damage value reaches the blocking threshold.
pub fn is_lethal(damage: u8, damage_threshold: u32) -> bool {
    decode_damage(damage) >= damage_threshold
}

/// Threshold the damage map into a corridor map: tiles where one volley deals
/// at least `damage_threshold` are blocked (255), the rest keep their terrain
/// cost.
///
/// With an `entry` edge the one-tile-inset line along that edge must hold at
/// least one passable tile, otherwise there is no corridor and `None` is
/// returned.
pub fn plan_safe_corridor(
    terrain_grid: &Grid8,
    damage_grid: &Grid8,
    damage_threshold: u32,
    entry: Option<EntryEdge>,
) -> Option<Grid8> {
    let mut corridor = Grid8::new();

    for (loc, damage) in damage_grid.iter() {
        let value = if is_lethal(damage, damage_threshold) {
            BLOCKED
        } else {
            terrain_grid.at(loc)
        };
        let _ = corridor.set(loc.x(), loc.y(), value);
    }

    if let Some(edge) = entry {
        let open = edge.inset_line().into_iter().any(|loc| corridor.at(loc) != BLOCKED);
        if !open {
            return None;
        }
    }

    Some(corridor)
}
