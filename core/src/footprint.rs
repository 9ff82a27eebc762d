//! Disk footprint math shared by occupancy bookkeeping and pathfinding.
//!
//! A radius-`R` unit anchored at `(cx, cy)` covers every tile `(cx+dx, cy+dy)`
//! with `dx, dy` in `(-R+1..R-1)` and `dx² + dy² < R²` — a discretized disk
//! rather than a square. Radius `1` covers exactly the anchor tile.

use crate::{GridView, OccupancyView, TileCoord, UnitId};

/// Enumerates the tiles covered by a radius-`radius` footprint at `center`.
///
/// Tiles are produced without bounds checking, in ascending `(dx, dy)` order;
/// callers filter against the grid when enumerating claims.
#[must_use]
pub fn tiles_covered(center: TileCoord, radius: u32) -> Vec<TileCoord> {
    let r = radius as i32;
    let r_squared = r * r;
    let mut tiles = Vec::new();
    for dx in (-r + 1)..r {
        for dy in (-r + 1)..r {
            if dx * dx + dy * dy < r_squared {
                tiles.push(TileCoord::new(center.x() + dx, center.y() + dy));
            }
        }
    }
    tiles
}

/// Reports whether a footprint fits at `tile` for the given radius.
///
/// True iff every covered tile is in bounds, walkable, and either unoccupied
/// or occupied by one of the `ignored` units. An empty `ignored` slice makes
/// this the plain spawn-time openness check.
#[must_use]
pub fn is_open(
    tile: TileCoord,
    radius: u32,
    grid: GridView<'_>,
    occupancy: OccupancyView<'_>,
    ignored: &[UnitId],
) -> bool {
    tiles_covered(tile, radius).into_iter().all(|covered| {
        if !grid.is_walkable(covered) {
            return false;
        }
        match occupancy.occupant(covered) {
            None => true,
            Some(occupant) => ignored.contains(&occupant),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk_cell_count(radius: i32) -> usize {
        let mut count = 0;
        for dx in (-radius + 1)..radius {
            for dy in (-radius + 1)..radius {
                if dx * dx + dy * dy < radius * radius {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn radius_one_covers_only_the_anchor() {
        let center = TileCoord::new(4, 7);
        assert_eq!(tiles_covered(center, 1), vec![center]);
    }

    #[test]
    fn footprint_matches_the_disk_predicate_for_all_small_radii() {
        for radius in 1..=5u32 {
            let tiles = tiles_covered(TileCoord::new(0, 0), radius);
            assert_eq!(tiles.len(), disk_cell_count(radius as i32));
        }
    }

    #[test]
    fn footprint_is_symmetric_around_the_anchor() {
        let center = TileCoord::new(10, 10);
        for radius in 1..=4u32 {
            let tiles = tiles_covered(center, radius);
            for tile in &tiles {
                let mirrored = TileCoord::new(
                    2 * center.x() - tile.x(),
                    2 * center.y() - tile.y(),
                );
                assert!(tiles.contains(&mirrored), "missing mirror of {tile:?}");
            }
        }
    }

    #[test]
    fn radius_two_covers_the_full_three_by_three_block() {
        let tiles = tiles_covered(TileCoord::new(5, 5), 2);
        assert_eq!(tiles.len(), 9);
        assert!(tiles.contains(&TileCoord::new(4, 4)));
        assert!(tiles.contains(&TileCoord::new(6, 6)));
    }

    #[test]
    fn radius_four_starts_shaving_the_square_corners() {
        let tiles = tiles_covered(TileCoord::new(10, 10), 4);
        assert_eq!(tiles.len(), 7 * 7 - 4);
        assert!(!tiles.contains(&TileCoord::new(7, 7)));
        assert!(!tiles.contains(&TileCoord::new(13, 13)));
        assert!(tiles.contains(&TileCoord::new(7, 8)));
    }

    #[test]
    fn is_open_rejects_out_of_bounds_footprints() {
        let walkable = vec![true; 5 * 5];
        let cells: Vec<Option<UnitId>> = vec![None; 5 * 5];
        let grid = GridView::new(&walkable, 5, 5);
        let occupancy = OccupancyView::new(&cells, 5, 5);

        assert!(is_open(TileCoord::new(2, 2), 2, grid, occupancy, &[]));
        assert!(!is_open(TileCoord::new(0, 2), 2, grid, occupancy, &[]));
        assert!(!is_open(TileCoord::new(-1, 2), 1, grid, occupancy, &[]));
    }

    #[test]
    fn is_open_respects_the_ignore_list() {
        let walkable = vec![true; 3 * 3];
        let mut cells: Vec<Option<UnitId>> = vec![None; 3 * 3];
        cells[4] = Some(UnitId::new(9));
        let grid = GridView::new(&walkable, 3, 3);
        let occupancy = OccupancyView::new(&cells, 3, 3);
        let center = TileCoord::new(1, 1);

        assert!(!is_open(center, 1, grid, occupancy, &[]));
        assert!(is_open(center, 1, grid, occupancy, &[UnitId::new(9)]));
    }
}
