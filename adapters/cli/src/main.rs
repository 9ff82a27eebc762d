#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Gridlock skirmish.
//!
//! Boots a battlefield, places each side's bases in mirrored corners of its
//! home row, drops reinforcements on a fixed interval and drives the tick
//! loop until one side loses all of its bases or the run length is reached.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use gridlock_core::{Command, Event, Side, TileCoord, UnitKind, UnitStats};
use gridlock_system_combat::Combat;
use gridlock_system_unit_ai::UnitAi;
use gridlock_world::{apply, query, GridConfig, World};

const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Parser)]
#[command(name = "gridlock", about = "Runs a headless Gridlock skirmish")]
struct Args {
    /// Battlefield width in tiles; must be odd.
    #[arg(long, default_value_t = 9)]
    columns: u32,

    /// Battlefield height in tiles; must be odd.
    #[arg(long, default_value_t = 15)]
    rows: u32,

    /// Probability that an interior tile is impassable terrain.
    #[arg(long, default_value_t = 0.2)]
    blocked_chance: f32,

    /// Terrain seed; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of simulation ticks to run.
    #[arg(long, default_value_t = 3000)]
    ticks: u32,

    /// Seconds between reinforcement spawns for each side.
    #[arg(long, default_value_t = 10.0)]
    spawn_interval: f32,
}

fn character_stats() -> UnitStats {
    UnitStats {
        radius: 1,
        max_health: 100.0,
        defense: 2.0,
        attack_speed: 2.0,
        strength: 10.0,
        move_speed: 5.0,
    }
}

fn base_stats() -> UnitStats {
    UnitStats {
        radius: 2,
        max_health: 100.0,
        defense: 2.0,
        attack_speed: 0.0,
        strength: 0.0,
        move_speed: 0.0,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    println!(
        "battlefield {}x{} (blocked chance {}, seed {seed})",
        args.columns, args.rows, args.blocked_chance
    );

    let config = GridConfig::new(args.columns, args.rows, args.blocked_chance, seed);
    let mut world = World::new(config).context("generating the battlefield")?;

    let garrisons = spawn_bases(&mut world, args.columns as i32, args.rows as i32);

    let mut ai = UnitAi::new();
    let mut combat = Combat::new();

    // Each side reinforces from its own end of the field.
    let player_muster = TileCoord::new(args.columns as i32 / 2, 3);
    let enemy_muster = TileCoord::new(args.columns as i32 / 2, args.rows as i32 - 4);
    let interval_ticks = (args.spawn_interval / TICK.as_secs_f32()).round().max(1.0) as u32;

    for tick in 0..args.ticks {
        if tick % interval_ticks == 0 {
            spawn_character(&mut world, Side::Player, player_muster);
            spawn_character(&mut world, Side::Enemy, enemy_muster);
        }

        let mut events = Vec::new();
        apply(&mut world, Command::Tick { dt: TICK }, &mut events);

        let units = query::unit_view(&world);
        let mut commands = Vec::new();
        ai.handle(
            &events,
            &units,
            query::grid_view(&world),
            query::occupancy_view(&world),
            &mut commands,
        );
        combat.handle(&units, &mut commands);
        for command in commands {
            apply(&mut world, command, &mut events);
        }

        report(tick, &events);

        if let Some(loser) = defeated_side(&world, garrisons) {
            println!(
                "tick {tick}: all {loser:?} bases destroyed, {:?} wins",
                loser.opponent()
            );
            return Ok(());
        }
    }

    print_standings(&world);
    Ok(())
}

/// Mirrored base layout: each side holds the two ends of its home row. The
/// anchors sit two tiles in from the edge so a radius-2 footprint clears the
/// unwalkable border. Returns how many bases each side actually managed to
/// place, since rough terrain can still reject a corner.
fn spawn_bases(world: &mut World, columns: i32, rows: i32) -> [u32; 2] {
    let mut garrisons = [0, 0];
    for (index, (side, y)) in [(Side::Player, 2), (Side::Enemy, rows - 3)]
        .into_iter()
        .enumerate()
    {
        for x in [2, columns - 3] {
            let position = query::grid_view(world).tile_to_world(TileCoord::new(x, y));
            let mut events = Vec::new();
            apply(
                world,
                Command::SpawnUnit {
                    side,
                    kind: UnitKind::Base,
                    stats: base_stats(),
                    position,
                },
                &mut events,
            );
            if events
                .iter()
                .any(|event| matches!(event, Event::UnitSpawned { .. }))
            {
                garrisons[index] += 1;
            }
            report(0, &events);
        }
    }
    garrisons
}

fn spawn_character(world: &mut World, side: Side, tile: TileCoord) {
    let position = query::grid_view(world).tile_to_world(tile);
    let mut events = Vec::new();
    apply(
        world,
        Command::SpawnUnit {
            side,
            kind: UnitKind::Character,
            stats: character_stats(),
            position,
        },
        &mut events,
    );
}

fn report(tick: u32, events: &[Event]) {
    for event in events {
        match event {
            Event::UnitSpawned {
                unit, side, kind, tile, ..
            } => {
                println!("tick {tick}: {side:?} {kind:?} {} arrives at {tile:?}", unit.get());
            }
            Event::SpawnRejected { side, kind, tile } => {
                println!("tick {tick}: {side:?} {kind:?} spawn blocked at {tile:?}");
            }
            Event::UnitDied { unit, tile } => {
                println!("tick {tick}: unit {} falls at {tile:?}", unit.get());
            }
            _ => {}
        }
    }
}

/// A side is defeated once every base it managed to place has fallen.
fn defeated_side(world: &World, garrisons: [u32; 2]) -> Option<Side> {
    let view = query::unit_view(world);
    for (index, side) in [Side::Player, Side::Enemy].into_iter().enumerate() {
        if garrisons[index] == 0 {
            continue;
        }
        let standing = view
            .iter()
            .any(|unit| unit.side == side && unit.kind == UnitKind::Base);
        if !standing {
            return Some(side);
        }
    }
    None
}

fn print_standings(world: &World) {
    let view = query::unit_view(world);
    for side in [Side::Player, Side::Enemy] {
        let bases: Vec<String> = view
            .iter()
            .filter(|unit| unit.side == side && unit.kind == UnitKind::Base)
            .map(|unit| format!("{:.0}%", unit.health_fraction() * 100.0))
            .collect();
        let characters = view
            .iter()
            .filter(|unit| unit.side == side && unit.kind == UnitKind::Character)
            .count();
        println!(
            "{side:?}: {characters} characters in the field, bases at [{}]",
            bases.join(", ")
        );
    }
}
