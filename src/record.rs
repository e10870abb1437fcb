use crate::corridor::*;
use crate::flowfield::*;
use crate::grid::*;
use crate::location::*;
use screeps::RoomName;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectReason {
    /// Every tile on the approach edge is inside lethal turret range.
    NoSafeCorridor,
}

/// Phase of a siege campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase")]
pub enum SiegePhase {
    /// Waiting for a view of the target room.
    Scout,
    /// Deriving the damage map and the safe corridor.
    Plan,
    /// Stuck; needs operator action.
    Inspect { reason: InspectReason },
    /// Building the squad up to quorum.
    Prep { waiting_since: u32 },
    /// Baiting turret fire until the turrets run dry.
    Drain,
    /// Killing defenders.
    Attack,
    /// Tearing down structures.
    Dismantle,
    Complete { finished_at: u32 },
}

impl SiegePhase {
    pub fn name(&self) -> &'static str {
        match self {
            SiegePhase::Scout => "scout",
            SiegePhase::Plan => "plan",
            SiegePhase::Inspect { .. } => "inspect",
            SiegePhase::Prep { .. } => "prep",
            SiegePhase::Drain => "drain",
            SiegePhase::Attack => "attack",
            SiegePhase::Dismantle => "dismantle",
            SiegePhase::Complete { .. } => "complete",
        }
    }

    /// Phases the controller never leaves on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SiegePhase::Inspect { .. } | SiegePhase::Complete { .. })
    }

    /// Phases in which the squad is committed to the target room.
    pub fn is_engaged(&self) -> bool {
        matches!(self, SiegePhase::Drain | SiegePhase::Attack | SiegePhase::Dismantle)
    }
}

/// Operator-chosen gathering tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RallyPoint {
    pub room: RoomName,
    pub location: Location,
}

/// Persistent state of one siege campaign, keyed by target room.
///
/// Each optional field is written only by the phase that derives it; later
/// phases read it and regress when it is missing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SiegeRecord {
    pub target_room: RoomName,
    pub source_room: RoomName,
    pub phase: SiegePhase,
    #[serde(default)]
    pub rally_point: Option<RallyPoint>,

    // Scout
    #[serde(default)]
    pub terrain_grid: Option<Grid8>,
    #[serde(default)]
    pub turret_positions: Option<Vec<Location>>,
    #[serde(default)]
    pub durability_grid: Option<Grid8>,
    #[serde(default)]
    pub approach_direction: Option<EntryEdge>,
    #[serde(default)]
    pub target_perimeter_tiles: Option<Vec<Location>>,
    #[serde(default)]
    pub approach_flow: Option<FlowField>,

    // Plan
    #[serde(default)]
    pub damage_grid: Option<Grid8>,
    #[serde(default)]
    pub safe_corridor: Option<Grid8>,
}

impl SiegeRecord {
    pub fn new(target_room: RoomName, source_room: RoomName) -> SiegeRecord {
        SiegeRecord {
            target_room,
            source_room,
            phase: SiegePhase::Scout,
            rally_point: None,
            terrain_grid: None,
            turret_positions: None,
            durability_grid: None,
            approach_direction: None,
            target_perimeter_tiles: None,
            approach_flow: None,
            damage_grid: None,
            safe_corridor: None,
        }
    }

    pub fn with_rally_point(mut self, rally_point: RallyPoint) -> Self {
        self.rally_point = Some(rally_point);
        self
    }

    /// Drop everything derived from scouting, forcing a fresh scout.
    pub fn clear_scouting(&mut self) {
        self.terrain_grid = None;
        self.turret_positions = None;
        self.durability_grid = None;
        self.approach_direction = None;
        self.target_perimeter_tiles = None;
        self.approach_flow = None;
        self.clear_plan();
    }

    pub fn clear_plan(&mut self) {
        self.damage_grid = None;
        self.safe_corridor = None;
    }
}
