//! Siege phase controller.
//!
//! Each campaign record is advanced at most one phase per step. Phase handlers
//! return `Ok(None)` to stay, `Ok(Some(next))` to move on, or a `SiegeError`
//! that the dispatcher turns into a regression (missing prerequisite) or an
//! early return (collaborator unavailable). No error leaves this module.

use crate::cache::*;
use crate::config::*;
use crate::constants::*;
use crate::corridor::*;
use crate::fields::*;
use crate::flowfield::*;
use crate::grid::*;
use crate::location::*;
use crate::query::*;
use crate::record::*;
use crate::repository::*;
use crate::segment::*;
use crate::squad::*;
use crate::world::*;
use log::*;
use screeps::RoomName;
use thiserror::Error;

/// Record fields a phase depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prerequisite {
    TerrainGrid,
    TurretPositions,
    SafeCorridor,
}

impl Prerequisite {
    /// Phase that derives this field.
    pub fn producer(self) -> SiegePhase {
        match self {
            Prerequisite::TerrainGrid | Prerequisite::TurretPositions => SiegePhase::Scout,
            Prerequisite::SafeCorridor => SiegePhase::Plan,
        }
    }
}

impl std::fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Prerequisite::TerrainGrid => "terrain grid",
            Prerequisite::TurretPositions => "turret positions",
            Prerequisite::SafeCorridor => "safe corridor",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiegeError {
    #[error("missing {0}")]
    MissingPrerequisite(Prerequisite),
    #[error("{0} is unavailable")]
    CollaboratorUnavailable(&'static str),
}

type PhaseResult = Result<Option<SiegePhase>, SiegeError>;

/// Collaborators handed to the controller for one step.
pub struct SiegeServices<'a> {
    pub world: &'a dyn SiegeWorld,
    pub roster: &'a mut dyn UnitRoster,
    pub flow: &'a dyn FlowFieldProvider,
}

/// World observations memoized for the current step.
#[derive(Default)]
struct Observations {
    structures: StepCache<RoomName, Option<Vec<ObservedStructure>>>,
    hostiles: StepCache<RoomName, Option<Vec<HostileUnit>>>,
}

impl Observations {
    fn structures(&mut self, ctx: &StepContext, world: &dyn SiegeWorld, room: RoomName) -> Option<Vec<ObservedStructure>> {
        self.structures
            .get_or_insert_with(ctx, room, 0, || world.find_structures(room))
            .clone()
    }

    fn hostiles(&mut self, ctx: &StepContext, world: &dyn SiegeWorld, room: RoomName) -> Option<Vec<HostileUnit>> {
        self.hostiles
            .get_or_insert_with(ctx, room, 0, || world.find_hostile_units(room))
            .clone()
    }

    fn purge_expired(&mut self, ctx: &StepContext) {
        self.structures.purge_expired(ctx);
        self.hostiles.purge_expired(ctx);
    }
}

pub struct SiegeController {
    config: SiegeConfig,
    observations: Observations,
}

impl SiegeController {
    pub fn new(config: SiegeConfig) -> SiegeController {
        SiegeController {
            config,
            observations: Observations::default(),
        }
    }

    pub fn config(&self) -> &SiegeConfig {
        &self.config
    }

    /// Advance one campaign by one step.
    pub fn tick(&mut self, ctx: &StepContext, record: &mut SiegeRecord, services: &mut SiegeServices) {
        self.observations.purge_expired(ctx);

        if record.phase.is_terminal() {
            return;
        }

        if record.phase.is_engaged() && !self.healers_at_quorum(record, services) {
            info!(
                "Siege of {} dropped below {} healers, regrouping",
                record.target_room, self.config.quorum.healers
            );
            transition(record, SiegePhase::Prep { waiting_since: ctx.tick });
            return;
        }

        let result = match record.phase.clone() {
            SiegePhase::Scout => self.tick_scout(ctx, record, services),
            SiegePhase::Plan => self.tick_plan(ctx, record),
            SiegePhase::Prep { waiting_since } => self.tick_prep(ctx, record, services, waiting_since),
            SiegePhase::Drain => self.tick_drain(ctx, record, services),
            SiegePhase::Attack => self.tick_attack(ctx, record, services),
            SiegePhase::Dismantle => self.tick_dismantle(ctx, record, services),
            SiegePhase::Inspect { .. } | SiegePhase::Complete { .. } => Ok(None),
        };

        match result {
            Ok(Some(next)) => transition(record, next),
            Ok(None) => {}
            Err(SiegeError::MissingPrerequisite(prerequisite)) => {
                let fallback = prerequisite.producer();
                warn!(
                    "Siege of {} is missing its {} in {}, falling back to {}",
                    record.target_room,
                    prerequisite,
                    record.phase.name(),
                    fallback.name()
                );
                transition(record, fallback);
            }
            Err(err @ SiegeError::CollaboratorUnavailable(_)) => {
                debug!("Siege of {} waiting: {}", record.target_room, err);
            }
        }
    }

    fn healers_at_quorum(&self, record: &SiegeRecord, services: &SiegeServices) -> bool {
        let squad = services.world.find_squad(record.target_room);
        count_role(&squad, SquadRole::Healer) >= self.config.quorum.healers
    }

    fn tick_scout(&mut self, ctx: &StepContext, record: &mut SiegeRecord, services: &mut SiegeServices) -> PhaseResult {
        let target = record.target_room;

        let structures = match self.observations.structures(ctx, services.world, target) {
            Some(structures) => structures,
            None => {
                self.request_scout(record, services);
                return Ok(None);
            }
        };

        let terrain = services
            .world
            .observe_terrain(target)
            .ok_or(SiegeError::CollaboratorUnavailable("terrain"))?;

        record.clear_scouting();

        let terrain_grid = build_terrain_grid(&terrain);
        let turret_positions: Vec<Location> = hostile_defenses(&structures).map(|s| s.location).collect();
        let durability_grid = build_durability_grid(&structures);

        let kinds = classify_tiles(&terrain, &structures);
        let segmentation = segment_defense_areas(&terrain.get_exits(), |loc| kinds[loc.index()]);
        let approach = choose_approach_area(&segmentation.areas, &durability_grid);

        record.approach_direction = approach.and_then(|area| area.entry).and_then(EntryEdge::of);
        record.target_perimeter_tiles = Some(approach.map(|area| area.perimeter_near.clone()).unwrap_or_default());
        record.approach_flow = approach.and_then(|area| {
            let from: Vec<Location> = area.entry.into_iter().collect();
            let cost = |x: u8, y: u8| approach_cost(terrain_grid.get(x, y).unwrap_or(BLOCKED), durability_grid.get(x, y).unwrap_or(0));
            let flow = services.flow.compute_flow_field(&from, &area.perimeter_near, &cost);
            if flow.is_none() {
                warn!("Siege of {}: no approach path to the defences", target);
            }
            flow
        });

        debug!(
            "Scouted {}: {} turrets, {} defense areas, approach {:?}",
            target,
            turret_positions.len(),
            segmentation.areas.len(),
            record.approach_direction
        );

        record.terrain_grid = Some(terrain_grid);
        record.turret_positions = Some(turret_positions);
        record.durability_grid = Some(durability_grid);

        Ok(Some(SiegePhase::Plan))
    }

    fn request_scout(&self, record: &SiegeRecord, services: &mut SiegeServices) {
        let squad = services.world.find_squad(record.target_room);
        if count_role(&squad, SquadRole::Scout) > 0 {
            return;
        }

        let request = SquadRequest {
            role: SquadRole::Scout,
            count: 1,
            body: self.config.scout_body.clone(),
            target_room: record.target_room,
            source_room: record.source_room,
        };
        if !services.roster.request_units(&request) {
            debug!("Scout request for {} was not accepted", record.target_room);
        }
    }

    fn tick_plan(&mut self, ctx: &StepContext, record: &mut SiegeRecord) -> PhaseResult {
        let terrain_grid = record
            .terrain_grid
            .as_ref()
            .ok_or(SiegeError::MissingPrerequisite(Prerequisite::TerrainGrid))?;
        let turrets = record
            .turret_positions
            .as_ref()
            .ok_or(SiegeError::MissingPrerequisite(Prerequisite::TurretPositions))?;

        let damage = build_damage_grid(terrain_grid, turrets, &self.config.turret);
        let corridor = plan_safe_corridor(
            terrain_grid,
            &damage.grid,
            self.config.corridor_damage_threshold,
            record.approach_direction,
        );

        record.damage_grid = Some(damage.grid);

        match corridor {
            Some(corridor) => {
                record.safe_corridor = Some(corridor);
                Ok(Some(SiegePhase::Prep { waiting_since: ctx.tick }))
            }
            None => {
                record.safe_corridor = None;
                warn!("Siege of {}: no safe corridor, needs inspection", record.target_room);
                Ok(Some(SiegePhase::Inspect {
                    reason: InspectReason::NoSafeCorridor,
                }))
            }
        }
    }

    fn tick_prep(
        &mut self,
        ctx: &StepContext,
        record: &mut SiegeRecord,
        services: &mut SiegeServices,
        waiting_since: u32,
    ) -> PhaseResult {
        if record.safe_corridor.is_none() {
            return Err(SiegeError::MissingPrerequisite(Prerequisite::SafeCorridor));
        }

        let squad = services.world.find_squad(record.target_room);
        let deficits = self.config.quorum.deficits(&squad);

        if !deficits.is_empty() {
            for (role, count) in deficits.iter() {
                let request = SquadRequest {
                    role: *role,
                    count: *count,
                    body: BodyDefinition::for_role(*role),
                    target_room: record.target_room,
                    source_room: record.source_room,
                };
                services.roster.request_units(&request);
            }
            debug!(
                "Siege of {} waiting for quorum for {} ticks: {:?}",
                record.target_room,
                ctx.tick.saturating_sub(waiting_since),
                deficits
            );
            return Ok(None);
        }

        if let Some(rally) = record.rally_point {
            let radius = self.config.rally_radius;
            let gathered = squad
                .iter()
                .filter(|member| member.role == SquadRole::Healer)
                .all(|member| member.room == rally.room && member.location.distance_to(rally.location) <= radius);
            if !gathered {
                return Ok(None);
            }
        }

        Ok(Some(SiegePhase::Drain))
    }

    fn tick_drain(&mut self, ctx: &StepContext, record: &mut SiegeRecord, services: &mut SiegeServices) -> PhaseResult {
        if record.safe_corridor.is_none() {
            return Err(SiegeError::MissingPrerequisite(Prerequisite::SafeCorridor));
        }

        let structures = self
            .observations
            .structures(ctx, services.world, record.target_room)
            .ok_or(SiegeError::CollaboratorUnavailable("structures"))?;

        if hostile_turret_energy(&structures) == 0 {
            Ok(Some(SiegePhase::Attack))
        } else {
            Ok(None)
        }
    }

    fn tick_attack(&mut self, ctx: &StepContext, record: &mut SiegeRecord, services: &mut SiegeServices) -> PhaseResult {
        let hostiles = self
            .observations
            .hostiles(ctx, services.world, record.target_room)
            .ok_or(SiegeError::CollaboratorUnavailable("hostile units"))?;

        if hostiles.is_empty() {
            Ok(Some(SiegePhase::Dismantle))
        } else {
            Ok(None)
        }
    }

    fn tick_dismantle(
        &mut self,
        ctx: &StepContext,
        record: &mut SiegeRecord,
        services: &mut SiegeServices,
    ) -> PhaseResult {
        let structures = self
            .observations
            .structures(ctx, services.world, record.target_room)
            .ok_or(SiegeError::CollaboratorUnavailable("structures"))?;

        if hostile_turret_energy(&structures) > self.config.turret_energy_resume_threshold {
            info!("Siege of {}: turrets refilled, draining again", record.target_room);
            return Ok(Some(SiegePhase::Drain));
        }

        if dismantle_order(record, &structures).is_empty() {
            Ok(Some(SiegePhase::Complete { finished_at: ctx.tick }))
        } else {
            Ok(None)
        }
    }
}

fn transition(record: &mut SiegeRecord, next: SiegePhase) {
    if record.phase != next {
        info!("Siege of {}: {} -> {}", record.target_room, record.phase.name(), next.name());
    }
    record.phase = next;
}

/// Path cost for the approach flow field: terrain plus a bias toward weak
/// defences. Indestructible boundaries are impassable.
pub fn approach_cost(terrain: u8, durability: u8) -> u8 {
    if terrain == BLOCKED || durability >= DURABILITY_BOUNDARY {
        BLOCKED
    } else {
        (terrain as u32 + durability as u32).min(BLOCKED as u32 - 1) as u8
    }
}

/// The defended area with the weakest near perimeter. Areas without a
/// perimeter are not defended and are skipped.
pub fn choose_approach_area<'a>(areas: &'a [DefenseArea], durability: &Grid8) -> Option<&'a DefenseArea> {
    areas
        .iter()
        .filter(|area| !area.perimeter_near.is_empty())
        .min_by_key(|area| {
            area.perimeter_near
                .iter()
                .map(|loc| durability.at(*loc) as u32)
                .sum::<u32>()
        })
}

/// Step every declared campaign once. Records are written back only when they
/// changed.
pub fn tick_campaigns<R: CampaignRepository + ?Sized>(
    controller: &mut SiegeController,
    ctx: &StepContext,
    repository: &mut R,
    services: &mut SiegeServices,
) {
    for target in repository.keys() {
        let mut record = match repository.get(target) {
            Some(record) => record,
            None => continue,
        };
        let before = record.clone();

        controller.tick(ctx, &mut record, services);

        if record != before {
            if let Err(err) = repository.put(&record) {
                warn!("Failed to store siege record for {}: {}", target, err);
            }
        }
    }
}
