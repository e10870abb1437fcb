pub const ROOM_WIDTH: u8 = 50;
pub const ROOM_HEIGHT: u8 = 50;
pub const ROOM_AREA: usize = (ROOM_WIDTH as usize) * (ROOM_HEIGHT as usize);

/// Tower attack power at or inside optimal range.
pub const TOWER_POWER_ATTACK: u32 = 600;
pub const TOWER_OPTIMAL_RANGE: u32 = 5;
pub const TOWER_FALLOFF_RANGE: u32 = 20;
/// Fraction of attack power lost at falloff range.
pub const TOWER_FALLOFF: f32 = 0.75;

/// Damage values are stored in a byte grid scaled down by this factor.
pub const DAMAGE_SCALE: u32 = 50;

/// Cell value marking an impassable tile in every 8-bit field.
pub const BLOCKED: u8 = 255;

pub const TERRAIN_COST_PLAIN: u8 = 1;
pub const TERRAIN_COST_SWAMP: u8 = 5;
pub const TERRAIN_COST_WALL: u8 = BLOCKED;

/// Upper bound of the relative durability band for rampart-class structures.
pub const DURABILITY_MAX: u8 = 200;
/// Any non rampart-class structure on the tile.
pub const DURABILITY_OTHER_STRUCTURE: u8 = 205;
/// Indestructible boundary (terrain wall or novice/respawn barrier).
pub const DURABILITY_BOUNDARY: u8 = 210;
