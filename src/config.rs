use crate::fields::damage::TurretProfile;
use crate::squad::*;
use serde::{Deserialize, Serialize};

/// Tuning for siege campaigns. Every field has a default, so a host can
/// deserialize a partial JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiegeConfig {
    pub turret: TurretProfile,
    /// Per-volley damage at which a tile is no longer safe to stand on.
    pub corridor_damage_threshold: u32,
    pub quorum: SquadQuorum,
    /// How close every healer must be to the rally point before draining.
    pub rally_radius: u8,
    /// Units below this fraction of their hits should fall back.
    pub retreat_health_fraction: f32,
    /// Turret energy above which a dismantling squad goes back to draining.
    pub turret_energy_resume_threshold: u32,
    pub scout_body: BodyDefinition,
    /// Upper bound on the approach flow field's path cost.
    pub max_flow_search_cost: u32,
}

impl Default for SiegeConfig {
    fn default() -> Self {
        SiegeConfig {
            turret: TurretProfile::default(),
            corridor_damage_threshold: 1000,
            quorum: SquadQuorum::default(),
            rally_radius: 3,
            retreat_health_fraction: 0.5,
            turret_energy_resume_threshold: 100,
            scout_body: BodyDefinition::scout(),
            max_flow_search_cost: 25_000,
        }
    }
}
