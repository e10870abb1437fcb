use crate::location::*;
use screeps::{Part, RoomName};
use serde::{Deserialize, Serialize};

/// Role a unit plays in a siege. Attached when the unit is requested and never
/// inferred from its body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SquadRole {
    /// Observes the target room before planning.
    Scout,
    /// Keeps the squad alive under turret fire.
    Healer,
    /// Kills hostile units.
    RangedAttacker,
    /// Tears down structures.
    Dismantler,
}

/// Body template for a requested unit: `pre_body` followed by `repeat_body`
/// as many times as the roster can afford, up to `maximum_repeat`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyDefinition {
    #[serde(default)]
    pub pre_body: Vec<Part>,
    pub repeat_body: Vec<Part>,
    #[serde(default)]
    pub maximum_repeat: Option<usize>,
}

impl BodyDefinition {
    pub fn scout() -> BodyDefinition {
        BodyDefinition {
            pre_body: vec![],
            repeat_body: vec![Part::Move],
            maximum_repeat: Some(1),
        }
    }

    pub fn healer() -> BodyDefinition {
        BodyDefinition {
            pre_body: vec![],
            repeat_body: vec![Part::Heal, Part::Move],
            maximum_repeat: Some(25),
        }
    }

    pub fn ranged_attacker() -> BodyDefinition {
        BodyDefinition {
            pre_body: vec![],
            repeat_body: vec![Part::RangedAttack, Part::Move],
            maximum_repeat: Some(25),
        }
    }

    pub fn dismantler() -> BodyDefinition {
        BodyDefinition {
            pre_body: vec![Part::Tough, Part::Tough, Part::Move, Part::Move],
            repeat_body: vec![Part::Work, Part::Move],
            maximum_repeat: Some(23),
        }
    }

    pub fn for_role(role: SquadRole) -> BodyDefinition {
        match role {
            SquadRole::Scout => Self::scout(),
            SquadRole::Healer => Self::healer(),
            SquadRole::RangedAttacker => Self::ranged_attacker(),
            SquadRole::Dismantler => Self::dismantler(),
        }
    }

    /// Energy cost of the body with `repeats` copies of `repeat_body`.
    pub fn cost(&self, repeats: usize) -> u32 {
        let pre_cost: u32 = self.pre_body.iter().map(|p| p.cost()).sum();
        let repeat_cost: u32 = self.repeat_body.iter().map(|p| p.cost()).sum();
        let repeats = self.maximum_repeat.map(|max| repeats.min(max)).unwrap_or(repeats);

        pre_cost + repeat_cost * repeats as u32
    }
}

/// A need for `count` more units of one role, sent to the roster.
#[derive(Clone, Debug, PartialEq)]
pub struct SquadRequest {
    pub role: SquadRole,
    pub count: u32,
    pub body: BodyDefinition,
    pub target_room: RoomName,
    /// Room the units should be produced from.
    pub source_room: RoomName,
}

/// Minimum squad before leaving prep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadQuorum {
    pub healers: u32,
    pub ranged: u32,
    pub dismantlers: u32,
}

impl Default for SquadQuorum {
    fn default() -> Self {
        SquadQuorum {
            healers: 4,
            ranged: 2,
            dismantlers: 2,
        }
    }
}

impl SquadQuorum {
    pub fn required(&self, role: SquadRole) -> u32 {
        match role {
            SquadRole::Scout => 0,
            SquadRole::Healer => self.healers,
            SquadRole::RangedAttacker => self.ranged,
            SquadRole::Dismantler => self.dismantlers,
        }
    }

    /// Roles still short of quorum with the number of missing units.
    pub fn deficits(&self, squad: &[SquadMember]) -> Vec<(SquadRole, u32)> {
        [SquadRole::Healer, SquadRole::RangedAttacker, SquadRole::Dismantler]
            .iter()
            .filter_map(|role| {
                let have = count_role(squad, *role);
                let need = self.required(*role);
                if have < need {
                    Some((*role, need - have))
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn is_met(&self, squad: &[SquadMember]) -> bool {
        self.deficits(squad).is_empty()
    }
}

/// Per-step telemetry for a living squad member.
#[derive(Clone, Debug, PartialEq)]
pub struct SquadMember {
    pub role: SquadRole,
    pub location: Location,
    pub room: RoomName,
    pub hits: u32,
    pub hits_max: u32,
}

impl SquadMember {
    pub fn health_fraction(&self) -> f32 {
        if self.hits_max == 0 {
            0.0
        } else {
            self.hits as f32 / self.hits_max as f32
        }
    }
}

pub fn count_role(squad: &[SquadMember], role: SquadRole) -> u32 {
    squad.iter().filter(|m| m.role == role).count() as u32
}
