#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Footprint-aware A* search over the 8-connected battlefield grid.
//!
//! The search plans for a unit's whole disk footprint, not just its anchor
//! tile, so a wide unit never receives a path its body cannot follow. Costs
//! are integer (10 orthogonal, 14 diagonal) with a Chebyshev heuristic, which
//! keeps tie-breaking stable across runs. When the goal cannot be reached the
//! search degrades to a closest-approach path instead of failing outright, so
//! units visibly press toward an unreachable target.

use gridlock_core::{footprint, GridView, OccupancyView, TileCoord, UnitId, UnitView};

const ORTHOGONAL_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

/// Neighbor offsets, orthogonals before diagonals. The order is part of the
/// observable tie-break behavior and must stay fixed.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, -1),
    (-1, 1),
];

/// Parameters for a single path query.
#[derive(Clone, Copy, Debug)]
pub struct PathRequest {
    /// Unit the path is planned for; its own occupancy never blocks it.
    pub mover: UnitId,
    /// Footprint radius of the mover.
    pub radius: u32,
    /// Opponent the mover is pursuing; its occupancy does not block the
    /// goal cell.
    pub target: Option<UnitId>,
    /// Anchor tile the search starts from.
    pub start: TileCoord,
    /// Anchor tile the search steers toward.
    pub goal: TileCoord,
    /// Drops the final tile from the returned path, for callers that want
    /// to stop adjacent to an occupied goal.
    pub exclude_goal: bool,
}

#[derive(Clone, Copy, Debug)]
struct Node {
    tile: TileCoord,
    parent: Option<usize>,
    g: u32,
    h: u32,
}

impl Node {
    const fn f(&self) -> u32 {
        self.g + self.h
    }
}

/// A* searcher with reusable scratch buffers.
///
/// One instance serves any number of sequential queries; buffers grow to the
/// map size once and are reset per invocation.
#[derive(Debug, Default)]
pub struct Pathfinder {
    nodes: Vec<Node>,
    open: Vec<usize>,
    closed: Vec<bool>,
    node_limit: Option<usize>,
}

impl Pathfinder {
    /// Creates a pathfinder with empty scratch buffers.
    ///
    /// The node arena is capped at four entries per map cell; a search that
    /// fills the arena terminates with whatever it has explored.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pathfinder whose node arena is capped at `limit` entries
    /// regardless of map size. Callers with a tight per-tick deadline can
    /// pin the cap low and accept best-effort paths sooner.
    #[must_use]
    pub fn with_node_limit(limit: usize) -> Self {
        Self {
            node_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Searches for a path from `request.start` to `request.goal`.
    ///
    /// Returns the tile sequence in start-to-goal order, including both
    /// endpoints; `exclude_goal` trims the last tile of a goal-reaching
    /// path. If the goal is unreachable the closest-approach path is
    /// returned instead, untrimmed so it keeps its full extent; the result
    /// is empty only when the search cannot leave the start tile at all.
    pub fn find_path(
        &mut self,
        grid: GridView<'_>,
        occupancy: OccupancyView<'_>,
        units: &UnitView,
        request: &PathRequest,
    ) -> Vec<TileCoord> {
        let (columns, rows) = grid.dimensions();
        let cell_count = columns as usize * rows as usize;
        if cell_count == 0 || !grid.contains(request.start) {
            return Vec::new();
        }
        let node_limit = self
            .node_limit
            .unwrap_or_else(|| cell_count.saturating_mul(4));

        let goal = self.resolve_goal(grid, occupancy, units, request);

        self.nodes.clear();
        self.open.clear();
        self.closed.clear();
        self.closed.resize(cell_count, false);

        self.nodes.push(Node {
            tile: request.start,
            parent: None,
            g: 0,
            h: heuristic(request.start, goal),
        });
        self.open.push(0);

        let mut best_index = 0;
        let mut best_h = self.nodes[0].h;
        let mut reached: Option<usize> = None;

        while !self.open.is_empty() {
            let current = self.pop_cheapest();
            let current_node = self.nodes[current];

            if let Some(cell) = cell_index(grid, current_node.tile) {
                if self.closed[cell] {
                    continue;
                }
                self.closed[cell] = true;
            }

            if current_node.h < best_h {
                best_h = current_node.h;
                best_index = current;
            }
            if current_node.tile == goal {
                reached = Some(current);
                break;
            }

            if self.expand(grid, occupancy, request, goal, current, node_limit) {
                // Node pool exhausted; finish with what has been explored.
                break;
            }
        }

        let end = match reached {
            Some(index) => index,
            // Closest approach, unless the search never left the start.
            None if best_index == 0 => return Vec::new(),
            None => best_index,
        };

        let mut path = Vec::new();
        let mut cursor = Some(end);
        while let Some(index) = cursor {
            path.push(self.nodes[index].tile);
            cursor = self.nodes[index].parent;
        }
        path.reverse();
        if request.exclude_goal && reached.is_some() {
            let _ = path.pop();
        }
        path
    }

    /// Redirects a query whose goal cell is held by a third party to the open
    /// cell bordering the blocker's footprint closest to the original goal.
    fn resolve_goal(
        &self,
        grid: GridView<'_>,
        occupancy: OccupancyView<'_>,
        units: &UnitView,
        request: &PathRequest,
    ) -> TileCoord {
        let Some(blocker) = occupancy.occupant(request.goal) else {
            return request.goal;
        };
        if blocker == request.mover || Some(blocker) == request.target {
            return request.goal;
        }

        let blocker_radius = units
            .get(blocker)
            .map_or(1, |snapshot| snapshot.stats.radius);
        let covered = footprint::tiles_covered(request.goal, blocker_radius);

        let mut best: Option<(u32, TileCoord)> = None;
        for tile in &covered {
            for (dx, dy) in NEIGHBOR_OFFSETS {
                let candidate = TileCoord::new(tile.x() + dx, tile.y() + dy);
                if covered.contains(&candidate) {
                    continue;
                }
                if !footprint::is_open(candidate, request.radius, grid, occupancy, &[request.mover])
                {
                    continue;
                }
                let score = heuristic(candidate, request.goal);
                let better = match best {
                    None => true,
                    Some((best_score, best_tile)) => {
                        score < best_score || (score == best_score && candidate < best_tile)
                    }
                };
                if better {
                    best = Some((score, candidate));
                }
            }
        }

        best.map_or(request.goal, |(_, tile)| tile)
    }

    /// Removes and returns the open node with the lowest `f`, keeping the
    /// earliest-inserted node on ties.
    fn pop_cheapest(&mut self) -> usize {
        let mut best_position = 0;
        for position in 1..self.open.len() {
            if self.nodes[self.open[position]].f() < self.nodes[self.open[best_position]].f() {
                best_position = position;
            }
        }
        self.open.remove(best_position)
    }

    /// Pushes admissible neighbors of `current` onto the open list. Returns
    /// true when the node pool limit was hit.
    fn expand(
        &mut self,
        grid: GridView<'_>,
        occupancy: OccupancyView<'_>,
        request: &PathRequest,
        goal: TileCoord,
        current: usize,
        node_limit: usize,
    ) -> bool {
        let current_tile = self.nodes[current].tile;
        let current_g = self.nodes[current].g;

        for (dx, dy) in NEIGHBOR_OFFSETS {
            let neighbor = TileCoord::new(current_tile.x() + dx, current_tile.y() + dy);
            let Some(cell) = cell_index(grid, neighbor) else {
                continue;
            };
            if self.closed[cell] {
                continue;
            }
            if !admissible(grid, occupancy, request, goal, neighbor) {
                continue;
            }

            let diagonal = dx != 0 && dy != 0;
            if diagonal {
                // Both corner cells must fit the footprint so a unit can
                // never squeeze through a gap narrower than its body.
                let across = TileCoord::new(current_tile.x() + dx, current_tile.y());
                let down = TileCoord::new(current_tile.x(), current_tile.y() + dy);
                if !admissible(grid, occupancy, request, goal, across)
                    || !admissible(grid, occupancy, request, goal, down)
                {
                    continue;
                }
            }

            let step = if diagonal {
                DIAGONAL_COST
            } else {
                ORTHOGONAL_COST
            };
            let candidate = Node {
                tile: neighbor,
                parent: Some(current),
                g: current_g + step,
                h: heuristic(neighbor, goal),
            };

            // Simplified decrease-key: an open entry for the same cell at an
            // equal-or-lower f suppresses the insertion.
            let superseded = self
                .open
                .iter()
                .any(|&index| self.nodes[index].tile == neighbor && self.nodes[index].f() <= candidate.f());
            if superseded {
                continue;
            }

            if self.nodes.len() >= node_limit {
                return true;
            }
            self.nodes.push(candidate);
            self.open.push(self.nodes.len() - 1);
        }
        false
    }
}

/// Footprint admission for a single search cell. The goal cell ignores
/// occupancy by the mover and its target so a pursuit can terminate on a
/// cell the target is standing in.
fn admissible(
    grid: GridView<'_>,
    occupancy: OccupancyView<'_>,
    request: &PathRequest,
    goal: TileCoord,
    tile: TileCoord,
) -> bool {
    if tile == goal {
        let ignored = match request.target {
            Some(target) => vec![request.mover, target],
            None => vec![request.mover],
        };
        footprint::is_open(tile, request.radius, grid, occupancy, &ignored)
    } else {
        footprint::is_open(tile, request.radius, grid, occupancy, &[request.mover])
    }
}

fn heuristic(from: TileCoord, to: TileCoord) -> u32 {
    from.chebyshev_distance(to) * ORTHOGONAL_COST
}

fn cell_index(grid: GridView<'_>, tile: TileCoord) -> Option<usize> {
    if !grid.contains(tile) {
        return None;
    }
    let (columns, _) = grid.dimensions();
    Some(tile.y() as usize * columns as usize + tile.x() as usize)
}
