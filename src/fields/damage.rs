//! Turret damage map.
//!
//! Each tile holds the combined damage every hostile turret deals there in one
//! shot, divided by `DAMAGE_SCALE` and rounded up. Values that do not fit in a
//! byte are clamped to 255, so anything above `255 * DAMAGE_SCALE` becomes
//! indistinguishable from a wall. This loss is accepted and reported through the
//! returned overflow count.

use crate::constants::*;
use crate::fields::terrain_cost::is_blocked;
use crate::grid::*;
use crate::location::*;
use itertools::iproduct;
use log::*;
use serde::{Deserialize, Serialize};

/// Range falloff of a turret's attack.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretProfile {
    pub base_damage: u32,
    pub optimal_range: u32,
    pub falloff_range: u32,
    /// Fraction of `base_damage` lost at `falloff_range`.
    pub falloff_fraction: f64,
}

impl Default for TurretProfile {
    fn default() -> Self {
        TurretProfile {
            base_damage: TOWER_POWER_ATTACK,
            optimal_range: TOWER_OPTIMAL_RANGE,
            falloff_range: TOWER_FALLOFF_RANGE,
            falloff_fraction: TOWER_FALLOFF as f64,
        }
    }
}

impl TurretProfile {
    /// Damage of one shot at the given Chebyshev range.
    pub fn damage_at_range(&self, range: u32) -> f64 {
        let base = self.base_damage as f64;

        if range <= self.optimal_range || self.falloff_range <= self.optimal_range {
            return base;
        }

        let band = (self.falloff_range - self.optimal_range) as f64;
        let into_band = (range.min(self.falloff_range) - self.optimal_range) as f64;

        base - base * self.falloff_fraction * into_band / band
    }

    /// Damage of one shot at the range's furthest point.
    pub fn minimum_damage(&self) -> f64 {
        self.damage_at_range(self.falloff_range)
    }
}

/// Output of `build_damage_grid`.
#[derive(Clone, Debug)]
pub struct DamageGrid {
    pub grid: Grid8,
    /// Number of non-wall tiles whose damage was clamped.
    pub overflowed_tiles: usize,
}

/// Scaled damage for a raw per-shot total.
pub fn encode_damage(total: f64) -> (u8, bool) {
    let scaled = (total / DAMAGE_SCALE as f64).ceil();
    if scaled > BLOCKED as f64 {
        (BLOCKED, true)
    } else {
        (scaled.max(0.0) as u8, false)
    }
}

/// Per-shot damage a scaled cell stands for.
pub fn decode_damage(value: u8) -> u32 {
    value as u32 * DAMAGE_SCALE
}

/// Build the damage map for turrets at `turrets`. Walls in `terrain_grid`
/// (cost 255) are forced to 255 after all turrets are summed.
pub fn build_damage_grid(terrain_grid: &Grid8, turrets: &[Location], profile: &TurretProfile) -> DamageGrid {
    let mut grid = Grid8::new();
    let mut overflowed_tiles = 0;

    for (y, x) in iproduct!(0..ROOM_HEIGHT, 0..ROOM_WIDTH) {
        let loc = Location::from_xy(x, y);

        let value = if is_blocked(terrain_grid, loc) {
            BLOCKED
        } else {
            let total: f64 = turrets
                .iter()
                .map(|turret| profile.damage_at_range(loc.distance_to(*turret) as u32))
                .sum();

            let (value, overflowed) = encode_damage(total);
            if overflowed {
                overflowed_tiles += 1;
            }
            value
        };

        let _ = grid.set(x, y, value);
    }

    if overflowed_tiles > 0 {
        warn!(
            "Turret damage exceeded the encodable range on {} tiles; clamped to {}",
            overflowed_tiles,
            BLOCKED as u32 * DAMAGE_SCALE
        );
    }

    DamageGrid { grid, overflowed_tiles }
}
