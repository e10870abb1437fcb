use crate::constants::*;
use crate::location::*;
use bitflags::*;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TerrainFlags: u8 {
        const NONE = 0;
        const WALL = 1;
        const SWAMP = 2;
        const LAVA = 4;
    }
}

/// Raw room terrain as returned by the game: one flag byte per tile, row-major.
#[derive(Clone)]
pub struct FastRoomTerrain {
    buffer: Vec<u8>,
}

impl FastRoomTerrain {
    /// Wrap a raw terrain buffer. Short buffers are padded with plain tiles.
    pub fn new(mut buffer: Vec<u8>) -> FastRoomTerrain {
        buffer.resize(ROOM_AREA, 0);
        FastRoomTerrain { buffer }
    }

    /// Build terrain by classifying every tile with `f(x, y)`.
    pub fn from_fn<F>(f: F) -> FastRoomTerrain
    where
        F: Fn(u8, u8) -> TerrainFlags,
    {
        let mut buffer = vec![0; ROOM_AREA];
        for y in 0..ROOM_HEIGHT {
            for x in 0..ROOM_WIDTH {
                buffer[Location::from_xy(x, y).index()] = f(x, y).bits();
            }
        }
        FastRoomTerrain { buffer }
    }

    pub fn plain() -> FastRoomTerrain {
        Self::from_fn(|_, _| TerrainFlags::NONE)
    }

    pub fn get(&self, pos: &Location) -> TerrainFlags {
        self.get_xy(pos.x(), pos.y())
    }

    pub fn get_xy(&self, x: u8, y: u8) -> TerrainFlags {
        let index = (y as usize * ROOM_WIDTH as usize) + (x as usize);
        TerrainFlags::from_bits_truncate(self.buffer[index])
    }

    pub fn is_wall(&self, x: u8, y: u8) -> bool {
        self.get_xy(x, y).contains(TerrainFlags::WALL)
    }

    pub fn is_swamp(&self, x: u8, y: u8) -> bool {
        self.get_xy(x, y).contains(TerrainFlags::SWAMP)
    }

    /// Returns all passable exit tiles (tiles on the room border that are not walls).
    ///
    /// Scan order is top edge, right edge, bottom edge, left edge; callers that
    /// deduplicate neighbouring exits rely on this order.
    pub fn get_exits(&self) -> Vec<Location> {
        let mut exits = Vec::new();
        // Top edge
        for x in 0..ROOM_WIDTH {
            if !self.is_wall(x, 0) {
                exits.push(Location::from_coords(x as u32, 0));
            }
        }
        // Right edge
        for y in 1..ROOM_HEIGHT - 1 {
            if !self.is_wall(ROOM_WIDTH - 1, y) {
                exits.push(Location::from_coords(ROOM_WIDTH as u32 - 1, y as u32));
            }
        }
        // Bottom edge
        for x in 0..ROOM_WIDTH {
            if !self.is_wall(x, ROOM_HEIGHT - 1) {
                exits.push(Location::from_coords(x as u32, ROOM_HEIGHT as u32 - 1));
            }
        }
        // Left edge
        for y in 1..ROOM_HEIGHT - 1 {
            if !self.is_wall(0, y) {
                exits.push(Location::from_coords(0, y as u32));
            }
        }
        exits
    }
}

/// Neighbor offsets for 8-directional movement.
pub const NEIGHBORS_8: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];
