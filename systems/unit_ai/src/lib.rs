#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-unit targeting, navigation and state selection.
//!
//! Each tick the system picks every character's nearest opponent, keeps a
//! smoothed path toward it, and walks the unit along that path, proposing all
//! changes as commands. The world stays authoritative: occupancy moves go
//! through `PlaceUnit` and may be rejected, in which case the unit simply
//! retries on a later tick.

use std::collections::BTreeMap;
use std::time::Duration;

use gridlock_core::{
    footprint, Command, Event, GridView, OccupancyView, TileCoord, UnitId, UnitKind, UnitSnapshot,
    UnitState, UnitView, WorldPoint,
};
use gridlock_system_pathfinding::{PathRequest, Pathfinder};
use gridlock_system_smoothing::smooth;

/// Distance below which a waypoint counts as reached.
const WAYPOINT_EPSILON: f32 = 0.001;
/// Curve samples generated per tile-path segment.
const SPLINE_SUBDIVISIONS: u32 = 5;

#[derive(Clone, Debug)]
struct Plan {
    target: UnitId,
    planned_from: TileCoord,
    planned_to: TileCoord,
    waypoints: Vec<WorldPoint>,
    cursor: usize,
}

/// Pure system that steers characters toward their nearest opponent.
#[derive(Debug, Default)]
pub struct UnitAi {
    pathfinder: Pathfinder,
    plans: BTreeMap<UnitId, Plan>,
    scratch: Vec<Command>,
}

impl UnitAi {
    /// Creates a new unit AI system with no cached plans.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and immutable views to emit steering commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        units: &UnitView,
        grid: GridView<'_>,
        occupancy: OccupancyView<'_>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::UnitDied { unit, .. } = event {
                let _ = self.plans.remove(unit);
            }
        }

        let Some(dt) = elapsed(events) else {
            return;
        };

        self.scratch.clear();
        for unit in units.iter() {
            if unit.kind != UnitKind::Character {
                continue;
            }
            self.steer(unit, units, grid, occupancy, dt);
        }

        if self.scratch.is_empty() {
            return;
        }
        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }

    fn steer(
        &mut self,
        unit: &UnitSnapshot,
        units: &UnitView,
        grid: GridView<'_>,
        occupancy: OccupancyView<'_>,
        dt: Duration,
    ) {
        let Some(target) = nearest_opponent(unit, units) else {
            let _ = self.plans.remove(&unit.id);
            if unit.target.is_some() {
                self.scratch.push(Command::SetUnitTarget {
                    unit: unit.id,
                    target: None,
                });
            }
            if unit.state != UnitState::Idle {
                self.scratch.push(Command::SetUnitState {
                    unit: unit.id,
                    state: UnitState::Idle,
                });
            }
            return;
        };

        if unit.target != Some(target.id) {
            self.scratch.push(Command::SetUnitTarget {
                unit: unit.id,
                target: Some(target.id),
            });
        }

        // Continuous motion may have carried the unit into a new tile; the
        // occupancy claim follows it. A rejected move just retries later.
        let current_tile = grid.world_to_tile(unit.position);
        if current_tile != unit.tile
            && footprint::is_open(current_tile, unit.stats.radius, grid, occupancy, &[unit.id])
        {
            self.scratch.push(Command::PlaceUnit {
                unit: unit.id,
                tile: current_tile,
            });
        }

        // A plan goes stale when the pursued unit changes, when motion has
        // carried the mover into a new tile, or when the target relocated.
        let stale = self.plans.get(&unit.id).map_or(true, |plan| {
            plan.target != target.id
                || plan.planned_from != current_tile
                || plan.planned_to != target.tile
        });
        if stale {
            let request = PathRequest {
                mover: unit.id,
                radius: unit.stats.radius,
                target: Some(target.id),
                start: current_tile,
                goal: target.tile,
                exclude_goal: true,
            };
            let tiles = self
                .pathfinder
                .find_path(grid, occupancy, units, &request);
            if tiles.is_empty() {
                // Nowhere to go yet; keep searching on later ticks.
                let _ = self.plans.remove(&unit.id);
                return;
            }
            let tile_centers: Vec<WorldPoint> =
                tiles.iter().map(|tile| grid.tile_to_world(*tile)).collect();
            let _ = self.plans.insert(
                unit.id,
                Plan {
                    target: target.id,
                    planned_from: current_tile,
                    planned_to: target.tile,
                    waypoints: smooth(&tile_centers, SPLINE_SUBDIVISIONS),
                    cursor: 0,
                },
            );
        }

        let Some(plan) = self.plans.get_mut(&unit.id) else {
            return;
        };

        if plan.cursor + 2 >= plan.waypoints.len() {
            // Attack position reached: hold the final waypoint, face the
            // target so strikes and animation line up.
            let post = plan
                .waypoints
                .last()
                .copied()
                .unwrap_or(unit.position);
            self.scratch.push(Command::SetUnitPose {
                unit: unit.id,
                position: post,
                facing: post.direction_to(target.position),
            });
            if unit.state != UnitState::Attacking {
                self.scratch.push(Command::SetUnitState {
                    unit: unit.id,
                    state: UnitState::Attacking,
                });
            }
            return;
        }

        if unit.position.distance_to(plan.waypoints[plan.cursor]) < WAYPOINT_EPSILON {
            plan.cursor += 1;
        }
        let next = plan.waypoints[plan.cursor];
        let step = unit.stats.move_speed * dt.as_secs_f32();
        let position = unit.position.move_towards(next, step);
        let facing = if unit.position.distance_to(next) > WAYPOINT_EPSILON {
            unit.position.direction_to(next)
        } else {
            unit.facing
        };
        self.scratch.push(Command::SetUnitPose {
            unit: unit.id,
            position,
            facing,
        });
        if unit.state != UnitState::Navigating {
            self.scratch.push(Command::SetUnitState {
                unit: unit.id,
                state: UnitState::Navigating,
            });
        }
    }
}

/// Total simulated time covered by the event batch, if any.
fn elapsed(events: &[Event]) -> Option<Duration> {
    let mut total = Duration::ZERO;
    let mut advanced = false;
    for event in events {
        if let Event::TimeAdvanced { dt } = event {
            total += *dt;
            advanced = true;
        }
    }
    advanced.then_some(total)
}

/// Nearest opposing unit by rounded tile distance. Equal distances keep the
/// earlier unit in ascending id order, which makes the choice stable.
fn nearest_opponent<'a>(unit: &UnitSnapshot, units: &'a UnitView) -> Option<&'a UnitSnapshot> {
    let mut closest: Option<(&UnitSnapshot, u32)> = None;
    for candidate in units.iter() {
        if candidate.id == unit.id || candidate.side == unit.side {
            continue;
        }
        let distance = unit.tile.distance(candidate.tile);
        if closest.map_or(true, |(_, best)| distance < best) {
            closest = Some((candidate, distance));
        }
    }
    closest.map(|(snapshot, _)| snapshot)
}
