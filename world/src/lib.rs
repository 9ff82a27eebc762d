#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Gridlock.
//!
//! The world owns the walkability grid, the dense occupancy store and the
//! unit registry. All mutation flows through [`apply`], which executes a
//! single [`Command`] and appends the resulting [`Event`]s; systems observe
//! the world exclusively through the read-only views in [`query`].

use std::time::Duration;

use gridlock_core::{
    footprint, Command, Event, Side, TileCoord, UnitId, UnitKind, UnitState, UnitStats, WorldPoint,
};

mod grid;
mod occupancy;

pub use grid::{Grid, GridConfig, GridConfigError};

use occupancy::Occupancy;

/// Represents the authoritative Gridlock world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    occupancy: Occupancy,
    units: Vec<Unit>,
    next_unit_id: u32,
    tick_index: u64,
}

impl World {
    /// Creates a new world with a freshly generated battlefield.
    ///
    /// Fails when the configuration violates a startup invariant, such as an
    /// even grid dimension; occupancy violations later on are recoverable and
    /// never abort the simulation.
    pub fn new(config: GridConfig) -> Result<Self, GridConfigError> {
        let grid = Grid::generate(config)?;
        let occupancy = Occupancy::new(grid.columns(), grid.rows());
        Ok(Self {
            grid,
            occupancy,
            units: Vec::new(),
            next_unit_id: 0,
            tick_index: 0,
        })
    }

    fn unit_index(&self, unit: UnitId) -> Option<usize> {
        self.units.iter().position(|candidate| candidate.id == unit)
    }

    fn live_unit_index(&self, unit: UnitId) -> Option<usize> {
        self.unit_index(unit)
            .filter(|index| self.units[*index].alive)
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        // Defeated units linger until the tick boundary so systems iterating
        // the previous view never observe the set shrinking underneath them.
        self.units.retain(|unit| unit.alive);

        self.tick_index = self.tick_index.saturating_add(1);
        for unit in &mut self.units {
            unit.cooldown = unit.cooldown.saturating_sub(dt);
        }
        out_events.push(Event::TimeAdvanced { dt });
    }

    fn spawn_unit(
        &mut self,
        side: Side,
        kind: UnitKind,
        stats: UnitStats,
        position: WorldPoint,
        out_events: &mut Vec<Event>,
    ) {
        let tile = self.grid.world_to_tile(position);
        let open = footprint::is_open(
            tile,
            stats.radius,
            self.grid.view(),
            self.occupancy.view(),
            &[],
        );
        if !open {
            out_events.push(Event::SpawnRejected { side, kind, tile });
            return;
        }

        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id = self.next_unit_id.saturating_add(1);

        let covered = footprint::tiles_covered(tile, stats.radius);
        self.occupancy.claim(id, &covered);
        self.units.push(Unit {
            id,
            side,
            kind,
            stats,
            tile,
            position,
            facing: 0.0,
            state: UnitState::Idle,
            health: stats.max_health,
            target: None,
            cooldown: Duration::ZERO,
            alive: true,
        });

        out_events.push(Event::UnitSpawned {
            unit: id,
            side,
            kind,
            tile,
            position,
        });
    }

    fn place_unit(&mut self, unit: UnitId, tile: TileCoord, out_events: &mut Vec<Event>) {
        let Some(index) = self.live_unit_index(unit) else {
            return;
        };
        let radius = self.units[index].stats.radius;
        let from = self.units[index].tile;
        if from == tile {
            return;
        }

        // Validate before touching any slot so a rejected move is a no-op.
        let destination = footprint::tiles_covered(tile, radius);
        let blocked = destination.iter().any(|covered| {
            if !self.grid.is_walkable(*covered) {
                return true;
            }
            matches!(self.occupancy.occupant(*covered), Some(occupant) if occupant != unit)
        });
        if blocked {
            out_events.push(Event::PlacementRejected { unit, tile });
            return;
        }

        let origin = footprint::tiles_covered(from, radius);
        self.occupancy.release(unit, &origin);
        self.occupancy.claim(unit, &destination);
        self.units[index].tile = tile;

        out_events.push(Event::UnitRelocated {
            unit,
            from,
            to: tile,
        });
    }

    fn strike(&mut self, attacker: UnitId, target: UnitId, out_events: &mut Vec<Event>) {
        let Some(attacker_index) = self.live_unit_index(attacker) else {
            return;
        };
        if !self.units[attacker_index].cooldown.is_zero() {
            return;
        }
        // Attacking without a live target is a guarded no-op.
        let Some(target_index) = self.live_unit_index(target) else {
            return;
        };

        let stats = self.units[attacker_index].stats;
        self.units[attacker_index].cooldown = attack_interval(stats.attack_speed);

        let victim = &mut self.units[target_index];
        let damage = if victim.stats.defense > 0.0 {
            stats.strength / victim.stats.defense
        } else {
            stats.strength
        };
        victim.health -= damage;

        out_events.push(Event::AttackFired { attacker, target });
        out_events.push(Event::UnitDamaged {
            unit: target,
            health: self.units[target_index].health,
        });

        if self.units[target_index].health <= 0.0 {
            let fallen_tile = self.units[target_index].tile;
            let fallen_radius = self.units[target_index].stats.radius;
            self.units[target_index].alive = false;
            let covered = footprint::tiles_covered(fallen_tile, fallen_radius);
            self.occupancy.release(target, &covered);
            out_events.push(Event::UnitDied {
                unit: target,
                tile: fallen_tile,
            });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnUnit {
            side,
            kind,
            stats,
            position,
        } => world.spawn_unit(side, kind, stats, position, out_events),
        Command::PlaceUnit { unit, tile } => world.place_unit(unit, tile, out_events),
        Command::SetUnitTarget { unit, target } => {
            if let Some(index) = world.live_unit_index(unit) {
                world.units[index].target = target;
            }
        }
        Command::SetUnitPose {
            unit,
            position,
            facing,
        } => {
            if let Some(index) = world.live_unit_index(unit) {
                world.units[index].position = position;
                world.units[index].facing = facing;
            }
        }
        Command::SetUnitState { unit, state } => {
            if let Some(index) = world.live_unit_index(unit) {
                if world.units[index].state != state {
                    world.units[index].state = state;
                    out_events.push(Event::UnitStateChanged { unit, state });
                }
            }
        }
        Command::Strike { attacker, target } => world.strike(attacker, target, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use gridlock_core::{GridView, OccupancyView, UnitSnapshot, UnitView};

    /// Captures a read-only view of the static walkability grid.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Exposes a read-only view of the dense occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        world.occupancy.view()
    }

    /// Captures a read-only view of the live units on the battlefield.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        let snapshots: Vec<UnitSnapshot> = world
            .units
            .iter()
            .filter(|unit| unit.alive)
            .map(|unit| UnitSnapshot {
                id: unit.id,
                side: unit.side,
                kind: unit.kind,
                stats: unit.stats,
                tile: unit.tile,
                position: unit.position,
                facing: unit.facing,
                state: unit.state,
                health: unit.health,
                target: unit.target,
                ready_to_strike: unit.cooldown.is_zero(),
            })
            .collect();
        UnitView::from_snapshots(snapshots)
    }

    /// Number of ticks the world has processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[derive(Clone, Copy, Debug)]
struct Unit {
    id: UnitId,
    side: Side,
    kind: UnitKind,
    stats: UnitStats,
    tile: TileCoord,
    position: WorldPoint,
    facing: f32,
    state: UnitState,
    health: f32,
    target: Option<UnitId>,
    cooldown: Duration,
    alive: bool,
}

fn attack_interval(attack_speed: f32) -> Duration {
    if attack_speed > 0.0 {
        Duration::from_secs_f32(1.0 / attack_speed)
    } else {
        Duration::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_core::OccupancyView;

    fn open_world(columns: u32, rows: u32) -> World {
        World::new(GridConfig::new(columns, rows, 0.0, 1)).expect("world builds")
    }

    fn character_stats(radius: u32) -> UnitStats {
        UnitStats {
            radius,
            max_health: 100.0,
            defense: 2.0,
            attack_speed: 2.0,
            strength: 10.0,
            move_speed: 5.0,
        }
    }

    fn spawn_at(world: &mut World, side: Side, tile: TileCoord, radius: u32) -> UnitId {
        let position = world.grid.tile_to_world(tile);
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnUnit {
                side,
                kind: UnitKind::Character,
                stats: character_stats(radius),
                position,
            },
            &mut events,
        );
        match events.last() {
            Some(Event::UnitSpawned { unit, .. }) => *unit,
            other => panic!("expected spawn event, got {other:?}"),
        }
    }

    fn occupancy_cells(world: &World) -> Vec<Option<UnitId>> {
        let view = query::occupancy_view(world);
        let (columns, rows) = view.dimensions();
        let mut cells = Vec::new();
        for y in 0..rows as i32 {
            for x in 0..columns as i32 {
                cells.push(view.occupant(TileCoord::new(x, y)));
            }
        }
        cells
    }

    fn occupant_of(view: OccupancyView<'_>, x: i32, y: i32) -> Option<UnitId> {
        view.occupant(TileCoord::new(x, y))
    }

    #[test]
    fn spawning_claims_the_full_footprint() {
        let mut world = open_world(11, 11);
        let unit = spawn_at(&mut world, Side::Player, TileCoord::new(5, 5), 2);

        let view = query::occupancy_view(&world);
        assert_eq!(occupant_of(view, 5, 5), Some(unit));
        assert_eq!(occupant_of(view, 4, 5), Some(unit));
        assert_eq!(occupant_of(view, 4, 4), Some(unit));
        assert_eq!(occupant_of(view, 3, 5), None);
        assert_eq!(occupant_of(view, 5, 7), None);
    }

    #[test]
    fn spawning_onto_an_occupied_footprint_is_rejected_without_side_effects() {
        let mut world = open_world(11, 11);
        let _first = spawn_at(&mut world, Side::Player, TileCoord::new(5, 5), 1);
        let before = occupancy_cells(&world);

        let mut events = Vec::new();
        let position = world.grid.tile_to_world(TileCoord::new(5, 5));
        apply(
            &mut world,
            Command::SpawnUnit {
                side: Side::Enemy,
                kind: UnitKind::Character,
                stats: character_stats(2),
                position,
            },
            &mut events,
        );

        assert!(matches!(events.last(), Some(Event::SpawnRejected { .. })));
        assert_eq!(query::unit_view(&world).into_vec().len(), 1);
        assert_eq!(occupancy_cells(&world), before);
    }

    #[test]
    fn placement_moves_the_footprint_atomically() {
        let mut world = open_world(11, 11);
        let unit = spawn_at(&mut world, Side::Player, TileCoord::new(3, 3), 2);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceUnit {
                unit,
                tile: TileCoord::new(6, 6),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::UnitRelocated {
                unit,
                from: TileCoord::new(3, 3),
                to: TileCoord::new(6, 6),
            }]
        );
        let view = query::occupancy_view(&world);
        assert_eq!(occupant_of(view, 6, 6), Some(unit));
        assert_eq!(occupant_of(view, 3, 3), None);
        assert_eq!(occupant_of(view, 3, 2), None);
    }

    #[test]
    fn rejected_placement_leaves_the_world_unchanged() {
        let mut world = open_world(11, 11);
        let mover = spawn_at(&mut world, Side::Player, TileCoord::new(3, 3), 1);
        let _blocker = spawn_at(&mut world, Side::Enemy, TileCoord::new(6, 6), 1);
        let before = occupancy_cells(&world);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceUnit {
                unit: mover,
                tile: TileCoord::new(6, 6),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::PlacementRejected {
                unit: mover,
                tile: TileCoord::new(6, 6),
            }]
        );
        assert_eq!(occupancy_cells(&world), before);
        let snapshot = query::unit_view(&world);
        assert_eq!(
            snapshot.get(mover).expect("mover snapshot").tile,
            TileCoord::new(3, 3)
        );
    }

    #[test]
    fn strike_applies_defense_scaled_damage_and_resets_the_cooldown() {
        let mut world = open_world(11, 11);
        let attacker = spawn_at(&mut world, Side::Player, TileCoord::new(3, 3), 1);
        let target = spawn_at(&mut world, Side::Enemy, TileCoord::new(5, 5), 1);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Strike { attacker, target },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::AttackFired { attacker, target },
                Event::UnitDamaged {
                    unit: target,
                    health: 95.0,
                },
            ]
        );
        let view = query::unit_view(&world);
        assert!(!view.get(attacker).expect("attacker").ready_to_strike);

        // Cooldown gating swallows an immediate second strike.
        let mut more_events = Vec::new();
        apply(
            &mut world,
            Command::Strike { attacker, target },
            &mut more_events,
        );
        assert!(more_events.is_empty());

        // 1 / attack_speed seconds later the attacker is ready again.
        let mut tick_events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(500),
            },
            &mut tick_events,
        );
        let view = query::unit_view(&world);
        assert!(view.get(attacker).expect("attacker").ready_to_strike);
    }

    #[test]
    fn lethal_damage_frees_occupancy_and_defers_removal_by_one_tick() {
        let mut world = open_world(11, 11);
        let attacker = spawn_at(&mut world, Side::Player, TileCoord::new(3, 3), 1);
        let second = spawn_at(&mut world, Side::Player, TileCoord::new(7, 7), 1);
        let target = spawn_at(&mut world, Side::Enemy, TileCoord::new(5, 5), 1);

        // Wear the target down to a sliver, ticking between strikes.
        for _ in 0..19 {
            let mut events = Vec::new();
            apply(
                &mut world,
                Command::Strike { attacker, target },
                &mut events,
            );
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_secs(1),
                },
                &mut events,
            );
        }

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Strike { attacker, target },
            &mut events,
        );
        assert!(matches!(events.last(), Some(Event::UnitDied { unit, .. }) if *unit == target));
        assert!(query::occupancy_view(&world).is_free(TileCoord::new(5, 5)));
        assert!(query::unit_view(&world).get(target).is_none());

        // A strike against the corpse in the same tick must not remove twice.
        let mut corpse_events = Vec::new();
        apply(
            &mut world,
            Command::Strike {
                attacker: second,
                target,
            },
            &mut corpse_events,
        );
        assert!(corpse_events.is_empty());

        let mut tick_events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut tick_events,
        );
        assert_eq!(query::unit_view(&world).into_vec().len(), 2);
    }

    #[test]
    fn state_changes_are_announced_once() {
        let mut world = open_world(9, 9);
        let unit = spawn_at(&mut world, Side::Player, TileCoord::new(4, 4), 1);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetUnitState {
                unit,
                state: UnitState::Navigating,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SetUnitState {
                unit,
                state: UnitState::Navigating,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::UnitStateChanged {
                unit,
                state: UnitState::Navigating,
            }]
        );
    }
}
