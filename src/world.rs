//! Interfaces to the game world and the bot's own services.
//!
//! The siege engine never talks to the game API directly. The host bot
//! implements these traits on top of its room cache, spawn queue and creep
//! registry, and hands them to the controller once per tick. Every query may
//! answer `None` when the room is not visible this tick.

use crate::location::*;
use crate::squad::*;
use crate::terrain::*;
use screeps::{RoomName, StructureType};

/// A structure seen in a room.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservedStructure {
    pub location: Location,
    pub structure_type: StructureType,
    /// `None` for structures that cannot be damaged.
    pub hits: Option<u32>,
    pub hits_max: Option<u32>,
    /// Stored energy for structures with a store (towers, spawns).
    pub energy: Option<u32>,
    pub hostile: bool,
}

impl ObservedStructure {
    pub fn new(location: Location, structure_type: StructureType) -> ObservedStructure {
        ObservedStructure {
            location,
            structure_type,
            hits: None,
            hits_max: None,
            energy: None,
            hostile: true,
        }
    }

    pub fn with_hits(mut self, hits: u32, hits_max: u32) -> Self {
        self.hits = Some(hits);
        self.hits_max = Some(hits_max);
        self
    }

    pub fn with_energy(mut self, energy: u32) -> Self {
        self.energy = Some(energy);
        self
    }

    pub fn friendly(mut self) -> Self {
        self.hostile = false;
        self
    }

    pub fn is_hostile_turret(&self) -> bool {
        self.hostile && self.structure_type == StructureType::Tower
    }
}

/// A hostile creep seen in a room.
#[derive(Clone, Debug, PartialEq)]
pub struct HostileUnit {
    pub location: Location,
    pub owner: String,
    pub hits: u32,
    pub hits_max: u32,
}

/// Read access to the game world.
pub trait SiegeWorld {
    /// Terrain of a room. Terrain is static, so this is usually available even
    /// without visibility.
    fn observe_terrain(&self, room: RoomName) -> Option<FastRoomTerrain>;

    /// Every structure in a room, or `None` if the room is not visible.
    fn find_structures(&self, room: RoomName) -> Option<Vec<ObservedStructure>>;

    /// Hostile creeps in a room, or `None` if the room is not visible.
    fn find_hostile_units(&self, room: RoomName) -> Option<Vec<HostileUnit>>;

    /// Living squad members assigned to the campaign against `target`.
    fn find_squad(&self, target: RoomName) -> Vec<SquadMember>;
}

/// The bot's spawn/roster service. Requests are needs, not orders: the roster
/// decides when and where a unit is produced.
pub trait UnitRoster {
    /// Returns true if the request was queued.
    fn request_units(&mut self, request: &SquadRequest) -> bool;
}

/// Hostile turrets among a room's structures.
pub fn hostile_defenses(structures: &[ObservedStructure]) -> impl Iterator<Item = &ObservedStructure> {
    structures.iter().filter(|s| s.is_hostile_turret())
}

/// Total energy stored in the hostile turrets of a room.
pub fn hostile_turret_energy(structures: &[ObservedStructure]) -> u32 {
    hostile_defenses(structures)
        .map(|s| s.energy.unwrap_or(0))
        .sum()
}
