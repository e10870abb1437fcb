//! Field builders: turn raw room observations into the byte grids the planner
//! persists between steps.

pub mod damage;
pub mod durability;
pub mod terrain_cost;

pub use damage::{build_damage_grid, DamageGrid, TurretProfile};
pub use durability::{build_durability_grid, is_rampart_class};
pub use terrain_cost::build_terrain_grid;
