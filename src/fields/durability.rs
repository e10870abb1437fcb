use crate::constants::*;
use crate::grid::*;
use crate::world::*;
use screeps::StructureType;

/// Ramparts and constructed walls: destructible structures that block movement
/// until they are taken down.
pub fn is_rampart_class(structure: &ObservedStructure) -> bool {
    matches!(structure.structure_type, StructureType::Rampart | StructureType::Wall) && structure.hits.is_some()
}

/// Walls that cannot be damaged (novice and respawn area borders).
pub fn is_indestructible_boundary(structure: &ObservedStructure) -> bool {
    structure.structure_type == StructureType::Wall && structure.hits.is_none()
}

/// Relative durability of the room's defences.
///
/// Rampart-class tiles are scaled into `0..=200` between the weakest and the
/// strongest observed defence. Tiles with any other structure read 205 and
/// indestructible boundaries read 210. Later rules override earlier ones on a
/// shared tile. With no rampart-class structure, or when every defence has the
/// same hits, all defence tiles read 0.
pub fn build_durability_grid(structures: &[ObservedStructure]) -> Grid8 {
    let mut grid = Grid8::new();

    let defense_hits = structures.iter().filter(|s| is_rampart_class(s)).filter_map(|s| s.hits);
    let bounds = defense_hits.fold(None, |acc: Option<(u32, u32)>, hits| match acc {
        Some((min, max)) => Some((min.min(hits), max.max(hits))),
        None => Some((hits, hits)),
    });

    if let Some((min_hits, max_hits)) = bounds {
        let span = max_hits - min_hits;
        for structure in structures.iter().filter(|s| is_rampart_class(s)) {
            let hits = structure.hits.unwrap_or(min_hits);
            let value = if span == 0 {
                0
            } else {
                ((hits - min_hits) as u64 * DURABILITY_MAX as u64 / span as u64) as u8
            };
            let _ = grid.set(structure.location.x(), structure.location.y(), value);
        }
    }

    for structure in structures {
        if !is_rampart_class(structure) && !is_indestructible_boundary(structure) {
            let _ = grid.set(structure.location.x(), structure.location.y(), DURABILITY_OTHER_STRUCTURE);
        }
    }

    for structure in structures.iter().filter(|s| is_indestructible_boundary(s)) {
        let _ = grid.set(structure.location.x(), structure.location.y(), DURABILITY_BOUNDARY);
    }

    grid
}
