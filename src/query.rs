//! Read-only queries used by unit role executors.

use crate::config::*;
use crate::constants::*;
use crate::corridor::*;
use crate::location::*;
use crate::record::*;
use crate::repository::*;
use crate::squad::*;
use crate::world::*;
use screeps::{RoomName, StructureType};

pub fn get_campaign<R: CampaignRepository + ?Sized>(repository: &R, target: RoomName) -> Option<SiegeRecord> {
    repository.get(target)
}

/// Tile on the approach edge's inset line where the squad stages: the
/// passable corridor tile closest to the middle of the line.
pub fn staging_tile(record: &SiegeRecord) -> Option<Location> {
    let edge = record.approach_direction?;
    let corridor = record.safe_corridor.as_ref()?;

    edge.inset_line()
        .into_iter()
        .filter(|loc| corridor.at(*loc) != BLOCKED)
        .min_by_key(|loc| {
            let along = match edge {
                EntryEdge::Top | EntryEdge::Bottom => loc.x(),
                EntryEdge::Left | EntryEdge::Right => loc.y(),
            };
            (along as i16 * 2 - (ROOM_WIDTH as i16 - 1)).abs()
        })
}

/// Where units gather: the configured rally point, else the staging tile in
/// the target room.
pub fn resolve_rally_point(record: &SiegeRecord) -> Option<RallyPoint> {
    record.rally_point.or_else(|| {
        staging_tile(record).map(|location| RallyPoint {
            room: record.target_room,
            location,
        })
    })
}

pub fn should_retreat(member: &SquadMember, config: &SiegeConfig) -> bool {
    member.health_fraction() < config.retreat_health_fraction
}

/// The room controller cannot be dismantled; a room holding nothing else is
/// taken.
pub fn is_core(structure: &ObservedStructure) -> bool {
    structure.structure_type == StructureType::Controller
}

fn dismantle_priority(record: &SiegeRecord, structure: &ObservedStructure) -> u8 {
    let targeted = record
        .target_perimeter_tiles
        .as_ref()
        .map(|tiles| tiles.contains(&structure.location))
        .unwrap_or(false);

    if targeted {
        0
    } else {
        match structure.structure_type {
            StructureType::Tower => 1,
            StructureType::Spawn => 2,
            _ => 3,
        }
    }
}

/// Hostile structures still to tear down, most urgent first: the targeted
/// perimeter, then turrets, then spawns, then everything else. Ties go to the
/// structure nearest the staging tile.
pub fn dismantle_order(record: &SiegeRecord, structures: &[ObservedStructure]) -> Vec<ObservedStructure> {
    let staging = staging_tile(record);

    let mut order: Vec<ObservedStructure> = structures
        .iter()
        .filter(|s| s.hostile && s.hits.is_some() && !is_core(s))
        .cloned()
        .collect();

    order.sort_by_key(|s| {
        let distance = staging.map(|tile| tile.distance_to(s.location)).unwrap_or(0);
        (dismantle_priority(record, s), distance, s.location)
    });

    order
}
