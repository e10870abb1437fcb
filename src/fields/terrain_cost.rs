use crate::constants::*;
use crate::grid::*;
use crate::location::*;
use crate::terrain::*;

/// Movement cost per tile: walls are impassable, swamps cost 5, everything else 1.
pub fn build_terrain_grid(terrain: &FastRoomTerrain) -> Grid8 {
    let mut grid = Grid8::new();

    for y in 0..ROOM_HEIGHT {
        for x in 0..ROOM_WIDTH {
            let cost = if terrain.is_wall(x, y) {
                TERRAIN_COST_WALL
            } else if terrain.is_swamp(x, y) {
                TERRAIN_COST_SWAMP
            } else {
                TERRAIN_COST_PLAIN
            };
            // Coordinates come from the room bounds and costs fit in a byte.
            let _ = grid.set(x, y, cost);
        }
    }

    grid
}

/// True if the terrain grid marks the tile as impassable.
pub fn is_blocked(terrain_grid: &Grid8, loc: Location) -> bool {
    terrain_grid.at(loc) == BLOCKED
}
