#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridlock engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::ops::{Add, Mul, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod footprint;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests creation of a new unit anchored near the provided position.
    SpawnUnit {
        /// Side the new unit fights for.
        side: Side,
        /// Role of the new unit within the battle.
        kind: UnitKind,
        /// Combat and movement statistics applied to the unit.
        stats: UnitStats,
        /// World-space position converted to a tile through the grid mapping.
        position: WorldPoint,
    },
    /// Requests the atomic occupancy move of a unit to a new anchor tile.
    PlaceUnit {
        /// Identifier of the unit to relocate.
        unit: UnitId,
        /// Anchor tile the unit's footprint should cover after the move.
        tile: TileCoord,
    },
    /// Records the opponent a unit is currently pursuing.
    SetUnitTarget {
        /// Identifier of the pursuing unit.
        unit: UnitId,
        /// Opponent being pursued, or `None` to stand down.
        target: Option<UnitId>,
    },
    /// Updates the continuous position and facing of a unit.
    SetUnitPose {
        /// Identifier of the unit being moved.
        unit: UnitId,
        /// New continuous world-space position.
        position: WorldPoint,
        /// New facing angle expressed in radians.
        facing: f32,
    },
    /// Requests a transition of the unit's animation-facing state.
    SetUnitState {
        /// Identifier of the unit changing state.
        unit: UnitId,
        /// State the unit should adopt.
        state: UnitState,
    },
    /// Requests that a unit deal one attack's worth of damage to a target.
    Strike {
        /// Identifier of the attacking unit.
        attacker: UnitId,
        /// Identifier of the unit receiving the damage.
        target: UnitId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a unit was created and its footprint claimed.
    UnitSpawned {
        /// Identifier assigned to the new unit.
        unit: UnitId,
        /// Side the unit fights for.
        side: Side,
        /// Role of the unit within the battle.
        kind: UnitKind,
        /// Anchor tile claimed by the unit's footprint.
        tile: TileCoord,
        /// Continuous position the unit spawned at.
        position: WorldPoint,
    },
    /// Reports that a spawn request found its destination footprint occupied.
    SpawnRejected {
        /// Side the rejected unit would have fought for.
        side: Side,
        /// Role the rejected unit would have filled.
        kind: UnitKind,
        /// Anchor tile that failed the open-footprint check.
        tile: TileCoord,
    },
    /// Confirms that a unit's anchor moved between two tiles.
    UnitRelocated {
        /// Identifier of the relocated unit.
        unit: UnitId,
        /// Anchor tile before the move.
        from: TileCoord,
        /// Anchor tile after the move.
        to: TileCoord,
    },
    /// Reports that an occupancy move was rejected and state left unchanged.
    PlacementRejected {
        /// Identifier of the unit whose move failed.
        unit: UnitId,
        /// Destination tile that was not open for the unit's footprint.
        tile: TileCoord,
    },
    /// Announces that a unit transitioned to a new state.
    UnitStateChanged {
        /// Identifier of the unit that changed state.
        unit: UnitId,
        /// State that became active.
        state: UnitState,
    },
    /// Reports that an attack was delivered.
    AttackFired {
        /// Identifier of the attacking unit.
        attacker: UnitId,
        /// Identifier of the unit that received the attack.
        target: UnitId,
    },
    /// Reports the remaining health of a unit after taking damage.
    UnitDamaged {
        /// Identifier of the damaged unit.
        unit: UnitId,
        /// Health remaining after the damage was applied.
        health: f32,
    },
    /// Announces that a unit's health reached zero and its cells were freed.
    UnitDied {
        /// Identifier of the defeated unit.
        unit: UnitId,
        /// Anchor tile the unit occupied when it fell.
        tile: TileCoord,
    },
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Side a unit fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Units commanded by the player.
    Player,
    /// Units commanded by the opposing AI.
    Enemy,
}

impl Side {
    /// Returns the side this side fights against.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

/// Role a unit plays within the battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Mobile combatant driven by the motion/combat state machine.
    Character,
    /// Stationary structure that can be attacked but never moves.
    Base,
}

/// Motion/combat state a unit can occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    /// No target exists; the unit holds position.
    Idle,
    /// The unit is following a smoothed path toward its target.
    Navigating,
    /// The unit reached attack position and delivers strikes.
    Attacking,
}

/// Combat and movement statistics carried by every unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Footprint radius in tiles; `1` covers a single cell.
    pub radius: u32,
    /// Health the unit spawns with.
    pub max_health: f32,
    /// Divisor applied to incoming damage.
    pub defense: f32,
    /// Attacks delivered per second while in attack position.
    pub attack_speed: f32,
    /// Raw damage dealt per attack before the target's defense applies.
    pub strength: f32,
    /// Continuous movement speed in world units per second.
    pub move_speed: f32,
}

/// Location of a single grid tile expressed as signed x/y coordinates.
///
/// Coordinates are signed so that world-to-tile conversion can represent
/// positions outside the grid before bounds checks reject them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    x: i32,
    y: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Squared Euclidean distance between two tiles.
    #[must_use]
    pub const fn distance_squared(self, other: TileCoord) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Euclidean distance between two tiles rounded to the nearest integer.
    #[must_use]
    pub fn distance(self, other: TileCoord) -> u32 {
        let squared = self.distance_squared(other) as f64;
        squared.sqrt().round() as u32
    }

    /// Chebyshev distance between two tiles.
    #[must_use]
    pub fn chebyshev_distance(self, other: TileCoord) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }
}

/// Continuous world-space position used for motion and path smoothing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    x: f32,
    y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the point.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component of the point.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Angle in radians of the direction pointing from `self` to `other`.
    #[must_use]
    pub fn direction_to(self, other: WorldPoint) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Moves from `self` toward `target` by at most `max_delta` world units.
    ///
    /// Arrives exactly at `target` once the remaining distance falls below
    /// `max_delta`, mirroring the clamped step used for per-tick motion.
    #[must_use]
    pub fn move_towards(self, target: WorldPoint, max_delta: f32) -> WorldPoint {
        let distance = self.distance_to(target);
        if distance <= max_delta || distance == 0.0 {
            return target;
        }
        let scale = max_delta / distance;
        WorldPoint::new(
            self.x + (target.x - self.x) * scale,
            self.y + (target.y - self.y) * scale,
        )
    }
}

impl Add for WorldPoint {
    type Output = WorldPoint;

    fn add(self, rhs: WorldPoint) -> WorldPoint {
        WorldPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for WorldPoint {
    type Output = WorldPoint;

    fn sub(self, rhs: WorldPoint) -> WorldPoint {
        WorldPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for WorldPoint {
    type Output = WorldPoint;

    fn mul(self, rhs: f32) -> WorldPoint {
        WorldPoint::new(self.x * rhs, self.y * rhs)
    }
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Side the unit fights for.
    pub side: Side,
    /// Role the unit plays within the battle.
    pub kind: UnitKind,
    /// Combat and movement statistics applied at spawn time.
    pub stats: UnitStats,
    /// Anchor tile currently claimed by the unit's footprint.
    pub tile: TileCoord,
    /// Continuous world-space position.
    pub position: WorldPoint,
    /// Facing angle in radians.
    pub facing: f32,
    /// Current motion/combat state.
    pub state: UnitState,
    /// Remaining health.
    pub health: f32,
    /// Opponent the unit is pursuing, if any.
    pub target: Option<UnitId>,
    /// Indicates whether the attack cooldown has fully elapsed.
    pub ready_to_strike: bool,
}

impl UnitSnapshot {
    /// Remaining health as a fraction of the spawn health, clamped to `0..=1`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.stats.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.stats.max_health).clamp(0.0, 1.0)
    }
}

/// Read-only snapshot describing all live units on the battlefield.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot captured for the provided unit.
    #[must_use]
    pub fn get(&self, unit: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&unit, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Read-only view into the static walkability grid.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    walkable: &'a [bool],
    columns: u32,
    rows: u32,
}

impl<'a> GridView<'a> {
    /// Captures a new grid view backed by the provided walkability slice.
    #[must_use]
    pub fn new(walkable: &'a [bool], columns: u32, rows: u32) -> Self {
        Self {
            walkable,
            columns,
            rows,
        }
    }

    /// Reports whether the tile lies within the grid bounds.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.x() >= 0
            && tile.y() >= 0
            && (tile.x() as u32) < self.columns
            && (tile.y() as u32) < self.rows
    }

    /// Static terrain property; `false` for any tile outside the grid.
    #[must_use]
    pub fn is_walkable(&self, tile: TileCoord) -> bool {
        self.index(tile)
            .map_or(false, |index| self.walkable.get(index).copied().unwrap_or(false))
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Converts a continuous world position to the tile containing it.
    ///
    /// Tile `(0, 0)` sits at the grid's negative corner so that the grid
    /// center is adjacent to the world origin; the result may lie outside the
    /// grid for positions beyond the battlefield.
    #[must_use]
    pub fn world_to_tile(&self, position: WorldPoint) -> TileCoord {
        let half_x = (self.columns as i32 - 1) / 2;
        let half_y = (self.rows as i32 - 1) / 2;
        TileCoord::new(
            position.x().round() as i32 + half_x,
            position.y().round() as i32 + half_y,
        )
    }

    /// Converts a tile to the world-space position of its center.
    #[must_use]
    pub fn tile_to_world(&self, tile: TileCoord) -> WorldPoint {
        let half_x = (self.columns as i32 - 1) / 2;
        let half_y = (self.rows as i32 - 1) / 2;
        WorldPoint::new((tile.x() - half_x) as f32, (tile.y() - half_y) as f32)
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        if !self.contains(tile) {
            return None;
        }
        let row = usize::try_from(tile.y()).ok()?;
        let column = usize::try_from(tile.x()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<UnitId>],
    columns: u32,
    rows: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<UnitId>], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// Returns the unit occupying the provided tile, if any.
    #[must_use]
    pub fn occupant(&self, tile: TileCoord) -> Option<UnitId> {
        self.index(tile)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether the tile is currently free of occupants.
    #[must_use]
    pub fn is_free(&self, tile: TileCoord) -> bool {
        self.occupant(tile).is_none()
    }

    /// Provides the dimensions of the underlying occupancy grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        if tile.x() < 0
            || tile.y() < 0
            || tile.x() as u32 >= self.columns
            || tile.y() as u32 >= self.rows
        {
            return None;
        }
        let row = usize::try_from(tile.y()).ok()?;
        let column = usize::try_from(tile.x()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn unit_id_round_trips_through_bincode() {
        assert_round_trip(&UnitId::new(42));
    }

    #[test]
    fn tile_coord_round_trips_through_bincode() {
        assert_round_trip(&TileCoord::new(-3, 11));
    }

    #[test]
    fn unit_stats_round_trip_through_bincode() {
        assert_round_trip(&UnitStats {
            radius: 2,
            max_health: 100.0,
            defense: 4.0,
            attack_speed: 1.5,
            strength: 12.0,
            move_speed: 5.0,
        });
    }

    #[test]
    fn side_and_state_round_trip_through_bincode() {
        assert_round_trip(&Side::Enemy);
        assert_round_trip(&UnitKind::Base);
        assert_round_trip(&UnitState::Attacking);
    }

    #[test]
    fn tile_distance_rounds_to_nearest_integer() {
        let origin = TileCoord::new(0, 0);
        assert_eq!(origin.distance(TileCoord::new(3, 4)), 5);
        assert_eq!(origin.distance(TileCoord::new(1, 1)), 1);
        assert_eq!(origin.distance(TileCoord::new(2, 2)), 3);
    }

    #[test]
    fn chebyshev_distance_takes_the_larger_axis() {
        let origin = TileCoord::new(2, 2);
        assert_eq!(origin.chebyshev_distance(TileCoord::new(5, 3)), 3);
        assert_eq!(origin.chebyshev_distance(TileCoord::new(2, -4)), 6);
    }

    #[test]
    fn move_towards_clamps_at_the_target() {
        let start = WorldPoint::new(0.0, 0.0);
        let target = WorldPoint::new(3.0, 4.0);

        let step = start.move_towards(target, 2.5);
        assert!((step.distance_to(start) - 2.5).abs() < 1e-6);

        let arrived = start.move_towards(target, 10.0);
        assert_eq!(arrived, target);
    }

    #[test]
    fn world_to_tile_centers_the_grid() {
        let walkable = vec![true; 9 * 15];
        let grid = GridView::new(&walkable, 9, 15);

        assert_eq!(
            grid.world_to_tile(WorldPoint::new(0.0, 0.0)),
            TileCoord::new(4, 7)
        );
        assert_eq!(
            grid.world_to_tile(WorldPoint::new(-4.0, -7.0)),
            TileCoord::new(0, 0)
        );
        assert_eq!(
            grid.tile_to_world(TileCoord::new(4, 7)),
            WorldPoint::new(0.0, 0.0)
        );
    }

    #[test]
    fn tile_round_trips_through_world_space() {
        let walkable = vec![true; 11 * 11];
        let grid = GridView::new(&walkable, 11, 11);

        for x in 0..11 {
            for y in 0..11 {
                let tile = TileCoord::new(x, y);
                assert_eq!(grid.world_to_tile(grid.tile_to_world(tile)), tile);
            }
        }
    }

    #[test]
    fn health_fraction_clamps_to_unit_interval() {
        let mut snapshot = UnitSnapshot {
            id: UnitId::new(1),
            side: Side::Player,
            kind: UnitKind::Character,
            stats: UnitStats {
                radius: 1,
                max_health: 100.0,
                defense: 1.0,
                attack_speed: 1.0,
                strength: 1.0,
                move_speed: 1.0,
            },
            tile: TileCoord::new(0, 0),
            position: WorldPoint::new(0.0, 0.0),
            facing: 0.0,
            state: UnitState::Idle,
            health: 25.0,
            target: None,
            ready_to_strike: false,
        };

        assert!((snapshot.health_fraction() - 0.25).abs() < f32::EPSILON);
        snapshot.health = -10.0;
        assert_eq!(snapshot.health_fraction(), 0.0);
        snapshot.health = 250.0;
        assert_eq!(snapshot.health_fraction(), 1.0);
    }
}
