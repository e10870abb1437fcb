use screeps::{RoomName, StructureType};
use screeps_siege::controller::*;
use screeps_siege::flowfield::*;
use screeps_siege::record::*;
use screeps_siege::squad::*;
use screeps_siege::terrain::*;
use screeps_siege::world::*;
use screeps_siege::*;
use std::cell::Cell;

fn room(name: &str) -> RoomName {
    RoomName::new(name).unwrap()
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct FakeWorld {
    visible: bool,
    terrain: FastRoomTerrain,
    structures: Vec<ObservedStructure>,
    hostiles: Vec<HostileUnit>,
    squad: Vec<SquadMember>,
    structure_queries: Cell<u32>,
}

impl FakeWorld {
    /// A room with a rampart ring around 20..=30. The west side of the ring is
    /// the weakest. A tower, a spawn and the controller sit inside.
    fn fortress() -> FakeWorld {
        let mut structures = Vec::new();
        for x in 19..=31 {
            for y in 19..=31 {
                if x == 19 || x == 31 || y == 19 || y == 31 {
                    let hits = if x == 19 { 10_000 } else { 100_000 };
                    structures.push(
                        ObservedStructure::new(Location::from_xy(x, y), StructureType::Rampart)
                            .with_hits(hits, 300_000_000),
                    );
                }
            }
        }
        structures.push(
            ObservedStructure::new(Location::from_xy(25, 25), StructureType::Tower)
                .with_hits(3000, 3000)
                .with_energy(500),
        );
        structures.push(ObservedStructure::new(Location::from_xy(24, 24), StructureType::Spawn).with_hits(5000, 5000));
        structures.push(ObservedStructure::new(Location::from_xy(26, 26), StructureType::Controller));

        FakeWorld {
            visible: true,
            terrain: FastRoomTerrain::plain(),
            structures,
            hostiles: vec![HostileUnit {
                location: Location::from_xy(27, 27),
                owner: "Defender".to_string(),
                hits: 1000,
                hits_max: 1000,
            }],
            squad: Vec::new(),
            structure_queries: Cell::new(0),
        }
    }

    fn set_tower_energy(&mut self, energy: u32) {
        for structure in self.structures.iter_mut() {
            if structure.structure_type == StructureType::Tower {
                structure.energy = Some(energy);
            }
        }
    }

    fn fill_squad(&mut self, quorum: &SquadQuorum) {
        self.squad.clear();
        for (role, count) in [
            (SquadRole::Healer, quorum.healers),
            (SquadRole::RangedAttacker, quorum.ranged),
            (SquadRole::Dismantler, quorum.dismantlers),
        ] {
            for _ in 0..count {
                self.squad.push(member(role, Location::from_xy(10, 2)));
            }
        }
    }
}

fn member(role: SquadRole, location: Location) -> SquadMember {
    SquadMember {
        role,
        location,
        room: room("W5N5"),
        hits: 1000,
        hits_max: 1000,
    }
}

impl SiegeWorld for FakeWorld {
    fn observe_terrain(&self, _room: RoomName) -> Option<FastRoomTerrain> {
        Some(self.terrain.clone())
    }

    fn find_structures(&self, _room: RoomName) -> Option<Vec<ObservedStructure>> {
        self.structure_queries.set(self.structure_queries.get() + 1);
        if self.visible {
            Some(self.structures.clone())
        } else {
            None
        }
    }

    fn find_hostile_units(&self, _room: RoomName) -> Option<Vec<HostileUnit>> {
        if self.visible {
            Some(self.hostiles.clone())
        } else {
            None
        }
    }

    fn find_squad(&self, _target: RoomName) -> Vec<SquadMember> {
        self.squad.clone()
    }
}

#[derive(Default)]
struct FakeRoster {
    requests: Vec<SquadRequest>,
}

impl UnitRoster for FakeRoster {
    fn request_units(&mut self, request: &SquadRequest) -> bool {
        self.requests.push(request.clone());
        true
    }
}

struct Harness {
    controller: SiegeController,
    world: FakeWorld,
    roster: FakeRoster,
    flow: DijkstraFlowField,
    record: SiegeRecord,
    tick: u32,
}

impl Harness {
    fn new(config: SiegeConfig) -> Harness {
        init_logging();
        let flow = DijkstraFlowField::new(config.max_flow_search_cost);
        Harness {
            controller: SiegeController::new(config),
            world: FakeWorld::fortress(),
            roster: FakeRoster::default(),
            flow,
            record: SiegeRecord::new(room("W5N5"), room("W6N5")),
            tick: 100,
        }
    }

    fn step(&mut self) -> &SiegePhase {
        self.tick += 1;
        let ctx = StepContext::new(self.tick);
        let mut services = SiegeServices {
            world: &self.world,
            roster: &mut self.roster,
            flow: &self.flow,
        };
        self.controller.tick(&ctx, &mut self.record, &mut services);
        &self.record.phase
    }

    fn advance_to_drain(&mut self) {
        assert_eq!(*self.step(), SiegePhase::Plan);
        assert!(matches!(self.step(), SiegePhase::Prep { .. }));
        let quorum = self.controller.config().quorum;
        self.world.fill_squad(&quorum);
        assert_eq!(*self.step(), SiegePhase::Drain);
    }
}

#[test]
fn full_campaign_reaches_complete() {
    let mut harness = Harness::new(SiegeConfig::default());

    assert_eq!(*harness.step(), SiegePhase::Plan);
    assert_eq!(harness.record.turret_positions, Some(vec![Location::from_xy(25, 25)]));
    assert_eq!(harness.record.target_perimeter_tiles.as_ref().map(|t| t.len()), Some(48));
    assert!(harness.record.terrain_grid.is_some());
    assert!(harness.record.durability_grid.is_some());
    assert!(harness.record.damage_grid.is_none());

    let flow = harness.record.approach_flow.clone().expect("approach flow");
    let path = flow.trace(Location::from_xy(0, 0));
    assert_eq!(path.last().map(|loc| loc.x()), Some(19));

    assert_eq!(*harness.step(), SiegePhase::Prep { waiting_since: 102 });
    assert!(harness.record.damage_grid.is_some());
    assert!(harness.record.safe_corridor.is_some());

    // Empty squad: one request per short role, every step.
    assert!(matches!(harness.step(), SiegePhase::Prep { .. }));
    assert!(matches!(harness.step(), SiegePhase::Prep { .. }));
    let healer_requests: Vec<&SquadRequest> = harness
        .roster
        .requests
        .iter()
        .filter(|r| r.role == SquadRole::Healer)
        .collect();
    assert_eq!(healer_requests.len(), 2);
    assert_eq!(healer_requests[0].count, 4);
    assert_eq!(healer_requests[0].source_room, room("W6N5"));
    assert_eq!(harness.roster.requests.len(), 6);

    let quorum = harness.controller.config().quorum;
    harness.world.fill_squad(&quorum);
    assert_eq!(*harness.step(), SiegePhase::Drain);

    assert_eq!(*harness.step(), SiegePhase::Drain);
    harness.world.set_tower_energy(0);
    assert_eq!(*harness.step(), SiegePhase::Attack);

    assert_eq!(*harness.step(), SiegePhase::Attack);
    harness.world.hostiles.clear();
    assert_eq!(*harness.step(), SiegePhase::Dismantle);

    assert_eq!(*harness.step(), SiegePhase::Dismantle);
    harness
        .world
        .structures
        .retain(|s| s.structure_type == StructureType::Controller);
    let phase = harness.step().clone();
    assert_eq!(phase, SiegePhase::Complete { finished_at: harness.tick });

    // Terminal.
    assert_eq!(*harness.step(), phase);
}

#[test]
fn healer_loss_while_draining_regresses_to_prep() {
    let mut harness = Harness::new(SiegeConfig::default());
    harness.advance_to_drain();

    let healer = harness
        .world
        .squad
        .iter()
        .position(|m| m.role == SquadRole::Healer)
        .unwrap();
    harness.world.squad.remove(healer);

    let tick = harness.tick + 1;
    assert_eq!(*harness.step(), SiegePhase::Prep { waiting_since: tick });

    // Reinforced: back to draining.
    harness.world.squad.push(member(SquadRole::Healer, Location::from_xy(10, 2)));
    assert_eq!(*harness.step(), SiegePhase::Drain);
}

#[test]
fn refilled_turrets_send_dismantlers_back_to_draining() {
    let mut harness = Harness::new(SiegeConfig::default());
    harness.advance_to_drain();
    harness.world.set_tower_energy(0);
    harness.world.hostiles.clear();
    assert_eq!(*harness.step(), SiegePhase::Attack);
    assert_eq!(*harness.step(), SiegePhase::Dismantle);

    harness.world.set_tower_energy(100);
    assert_eq!(*harness.step(), SiegePhase::Dismantle);

    harness.world.set_tower_energy(101);
    assert_eq!(*harness.step(), SiegePhase::Drain);
}

#[test]
fn lethal_approach_needs_inspection() {
    let config = SiegeConfig {
        corridor_damage_threshold: 100,
        ..Default::default()
    };
    let mut harness = Harness::new(config);

    assert_eq!(*harness.step(), SiegePhase::Plan);
    assert_eq!(
        *harness.step(),
        SiegePhase::Inspect {
            reason: InspectReason::NoSafeCorridor
        }
    );
    assert!(harness.record.safe_corridor.is_none());
    assert!(harness.record.damage_grid.is_some());

    harness.world.fill_squad(&SquadQuorum::default());
    for _ in 0..3 {
        assert!(matches!(harness.step(), SiegePhase::Inspect { .. }));
    }
    assert!(harness.roster.requests.is_empty());
}

#[test]
fn unobserved_target_requests_a_single_scout() {
    let mut harness = Harness::new(SiegeConfig::default());
    harness.world.visible = false;

    assert_eq!(*harness.step(), SiegePhase::Scout);
    assert_eq!(harness.roster.requests.len(), 1);
    assert_eq!(harness.roster.requests[0].role, SquadRole::Scout);
    assert_eq!(harness.roster.requests[0].body, BodyDefinition::scout());

    harness.world.squad.push(member(SquadRole::Scout, Location::from_xy(25, 1)));
    assert_eq!(*harness.step(), SiegePhase::Scout);
    assert_eq!(harness.roster.requests.len(), 1);

    harness.world.visible = true;
    assert_eq!(*harness.step(), SiegePhase::Plan);
}

#[test]
fn observations_are_memoized_within_a_step() {
    let mut harness = Harness::new(SiegeConfig::default());
    harness.world.visible = false;
    let ctx = StepContext::new(harness.tick);

    for _ in 0..3 {
        let mut services = SiegeServices {
            world: &harness.world,
            roster: &mut harness.roster,
            flow: &harness.flow,
        };
        harness.controller.tick(&ctx, &mut harness.record, &mut services);
    }
    assert_eq!(harness.world.structure_queries.get(), 1);

    harness.step();
    assert_eq!(harness.world.structure_queries.get(), 2);
}

#[test]
fn drain_and_dismantle_share_one_structure_query_per_step() {
    let mut harness = Harness::new(SiegeConfig::default());
    harness.advance_to_drain();

    harness.world.structure_queries.set(0);
    assert_eq!(*harness.step(), SiegePhase::Drain);
    assert_eq!(harness.world.structure_queries.get(), 1);

    harness.world.set_tower_energy(0);
    harness.world.hostiles.clear();
    assert_eq!(*harness.step(), SiegePhase::Attack);
    assert_eq!(*harness.step(), SiegePhase::Dismantle);

    harness.world.structure_queries.set(0);
    assert_eq!(*harness.step(), SiegePhase::Dismantle);
    assert_eq!(harness.world.structure_queries.get(), 1);
}

#[test]
fn tampered_turret_positions_do_not_load() {
    let mut harness = Harness::new(SiegeConfig::default());
    assert_eq!(*harness.step(), SiegePhase::Plan);

    let mut repository = MemoryRepository::new();
    repository.put(&harness.record).unwrap();
    let mut entries = repository.into_entries();
    let raw = entries.get_mut("W5N5").unwrap();
    let mut value: serde_json::Value = serde_json::from_str(raw).unwrap();
    value["turret_positions"] = serde_json::json!([0x800A]);
    *raw = value.to_string();

    assert!(serde_json::from_str::<SiegeRecord>(raw).is_err());

    let mut repository = MemoryRepository::from_entries(entries);
    assert!(get_campaign(&repository, room("W5N5")).is_none());

    let mut services = SiegeServices {
        world: &harness.world,
        roster: &mut harness.roster,
        flow: &harness.flow,
    };
    tick_campaigns(&mut harness.controller, &StepContext::new(200), &mut repository, &mut services);
    assert!(get_campaign(&repository, room("W5N5")).is_none());
}

#[test]
fn off_room_turret_still_plans() {
    let mut harness = Harness::new(SiegeConfig::default());
    assert_eq!(*harness.step(), SiegePhase::Plan);

    harness.record.turret_positions = Some(vec![Location::from_packed(0x800A)]);

    assert!(matches!(harness.step(), SiegePhase::Prep { .. }));
    assert!(harness.record.damage_grid.is_some());
}

#[test]
fn missing_prerequisites_regress() {
    let mut harness = Harness::new(SiegeConfig::default());

    harness.record.phase = SiegePhase::Plan;
    assert_eq!(*harness.step(), SiegePhase::Scout);

    let quorum = harness.controller.config().quorum;
    harness.world.fill_squad(&quorum);
    harness.record.phase = SiegePhase::Drain;
    assert_eq!(*harness.step(), SiegePhase::Plan);
}

#[test]
fn unavailable_world_keeps_phase() {
    let mut harness = Harness::new(SiegeConfig::default());
    harness.advance_to_drain();
    let before = harness.record.clone();

    harness.world.visible = false;
    assert_eq!(*harness.step(), SiegePhase::Drain);
    assert_eq!(harness.record, before);
}

#[test]
fn rally_point_holds_prep_until_healers_gather() {
    let mut harness = Harness::new(SiegeConfig::default());
    harness.record.rally_point = Some(RallyPoint {
        room: room("W5N5"),
        location: Location::from_xy(10, 10),
    });

    assert_eq!(*harness.step(), SiegePhase::Plan);
    assert!(matches!(harness.step(), SiegePhase::Prep { .. }));

    let quorum = harness.controller.config().quorum;
    harness.world.fill_squad(&quorum);
    assert!(matches!(harness.step(), SiegePhase::Prep { .. }));

    for m in harness.world.squad.iter_mut().filter(|m| m.role == SquadRole::Healer) {
        m.location = Location::from_xy(12, 8);
    }
    assert_eq!(*harness.step(), SiegePhase::Drain);
    assert_eq!(resolve_rally_point(&harness.record).map(|r| r.location), Some(Location::from_xy(10, 10)));
}

#[test]
fn campaigns_tick_through_the_repository() {
    init_logging();
    let world = FakeWorld::fortress();
    let mut roster = FakeRoster::default();
    let flow = DijkstraFlowField::default();
    let mut controller = SiegeController::new(SiegeConfig::default());
    let mut repository = MemoryRepository::new();

    declare_campaign(&mut repository, room("W5N5"), room("W6N5")).unwrap();
    declare_campaign(&mut repository, room("W7N5"), room("W6N5")).unwrap();

    for tick in 1..=2 {
        let mut services = SiegeServices {
            world: &world,
            roster: &mut roster,
            flow: &flow,
        };
        tick_campaigns(&mut controller, &StepContext::new(tick), &mut repository, &mut services);
    }

    for target in [room("W5N5"), room("W7N5")] {
        let record = get_campaign(&repository, target).unwrap();
        assert_eq!(record.phase, SiegePhase::Prep { waiting_since: 2 });
        assert!(record.safe_corridor.is_some());
    }

    assert!(abandon_campaign(&mut repository, room("W7N5")));
    assert!(get_campaign(&repository, room("W7N5")).is_none());

    // Grids persist in their printable form and survive a reload.
    let reloaded = MemoryRepository::from_entries(repository.into_entries());
    let record = get_campaign(&reloaded, room("W5N5")).unwrap();
    assert_eq!(record.terrain_grid.unwrap().get(10, 10), Ok(1));
}
