//! Static walkability grid generated once at world construction.

use gridlock_core::{GridView, TileCoord, WorldPoint};
use thiserror::Error;

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

/// Configuration parameters required to generate the battlefield grid.
#[derive(Clone, Copy, Debug)]
pub struct GridConfig {
    columns: u32,
    rows: u32,
    blocked_chance: f32,
    seed: u64,
}

impl GridConfig {
    /// Creates a new grid configuration.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, blocked_chance: f32, seed: u64) -> Self {
        Self {
            columns,
            rows,
            blocked_chance,
            seed,
        }
    }

    /// Number of tile columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }
}

/// Reasons grid generation can fail at startup.
///
/// These violate design invariants the rest of the simulation relies on, so
/// they are fatal rather than recoverable.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GridConfigError {
    /// Both dimensions must be odd so the grid has an exact center tile,
    /// which symmetric spawn placement depends on.
    #[error("grid dimensions must be odd, got {columns}x{rows}")]
    EvenDimensions {
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
    },
    /// The blocked chance must be a probability.
    #[error("blocked chance must lie within 0..=1")]
    InvalidBlockedChance,
}

/// Fixed-size walkability grid with unwalkable borders.
///
/// Interior tiles are blocked with the configured probability using a seeded
/// linear congruential generator, so equal configurations always produce the
/// same battlefield. The grid is created once and never resized.
#[derive(Clone, Debug)]
pub struct Grid {
    columns: u32,
    rows: u32,
    walkable: Vec<bool>,
}

impl Grid {
    /// Generates a new grid from the provided configuration.
    pub fn generate(config: GridConfig) -> Result<Self, GridConfigError> {
        if config.columns % 2 == 0 || config.rows % 2 == 0 {
            return Err(GridConfigError::EvenDimensions {
                columns: config.columns,
                rows: config.rows,
            });
        }
        if !(0.0..=1.0).contains(&config.blocked_chance) {
            return Err(GridConfigError::InvalidBlockedChance);
        }

        let columns = config.columns;
        let rows = config.rows;
        let capacity = columns as usize * rows as usize;
        let mut walkable = Vec::with_capacity(capacity);
        let mut rng_state = config.seed;

        for y in 0..rows {
            for x in 0..columns {
                let border = x == 0 || y == 0 || x == columns - 1 || y == rows - 1;
                if border {
                    walkable.push(false);
                } else {
                    rng_state = next_random(rng_state);
                    walkable.push(unit_interval(rng_state) > f64::from(config.blocked_chance));
                }
            }
        }

        Ok(Self {
            columns,
            rows,
            walkable,
        })
    }

    /// Number of tile columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Static terrain property; `false` outside the grid.
    #[must_use]
    pub fn is_walkable(&self, tile: TileCoord) -> bool {
        self.view().is_walkable(tile)
    }

    /// Converts a continuous world position to the tile containing it.
    #[must_use]
    pub fn world_to_tile(&self, position: WorldPoint) -> TileCoord {
        self.view().world_to_tile(position)
    }

    /// Converts a tile to the world-space position of its center.
    #[must_use]
    pub fn tile_to_world(&self, tile: TileCoord) -> WorldPoint {
        self.view().tile_to_world(tile)
    }

    /// Captures a read-only view of the walkability data.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(&self.walkable, self.columns, self.rows)
    }
}

fn next_random(state: u64) -> u64 {
    state.wrapping_mul(RNG_MULTIPLIER).wrapping_add(RNG_INCREMENT)
}

fn unit_interval(state: u64) -> f64 {
    (state >> 11) as f64 / (1u64 << 53) as f64
}
