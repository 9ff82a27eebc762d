//! Dense tile-to-unit occupancy bookkeeping.

use gridlock_core::{OccupancyView, TileCoord, UnitId};

/// Authoritative mapping from grid tiles to the units covering them.
///
/// The store itself is deliberately dumb: validation of moves happens in the
/// world so that claim and release remain simple slot writes and a rejected
/// transaction never touches the cells.
#[derive(Clone, Debug)]
pub(crate) struct Occupancy {
    columns: u32,
    rows: u32,
    cells: Vec<Option<UnitId>>,
}

impl Occupancy {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let capacity = columns as usize * rows as usize;
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    /// Writes the unit into every in-bounds slot of the provided tiles.
    pub(crate) fn claim(&mut self, unit: UnitId, tiles: &[TileCoord]) {
        for tile in tiles {
            if let Some(index) = self.index(*tile) {
                self.cells[index] = Some(unit);
            }
        }
    }

    /// Clears every provided slot that is currently held by the unit.
    ///
    /// Slots held by other units are left untouched so an interrupted move
    /// can never erase a neighbour's claim.
    pub(crate) fn release(&mut self, unit: UnitId, tiles: &[TileCoord]) {
        for tile in tiles {
            if let Some(index) = self.index(*tile) {
                if self.cells[index] == Some(unit) {
                    self.cells[index] = None;
                }
            }
        }
    }

    pub(crate) fn occupant(&self, tile: TileCoord) -> Option<UnitId> {
        self.index(tile).and_then(|index| self.cells[index])
    }

    pub(crate) fn view(&self) -> OccupancyView<'_> {
        OccupancyView::new(&self.cells, self.columns, self.rows)
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
        Some(row * self.columns as usize + column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_core::footprint;

    #[test]
    fn claim_and_release_round_trip_a_footprint() {
        let mut occupancy = Occupancy::new(9, 9);
        let unit = UnitId::new(3);
        let tiles = footprint::tiles_covered(TileCoord::new(4, 4), 2);

        occupancy.claim(unit, &tiles);
        for tile in &tiles {
            assert_eq!(occupancy.occupant(*tile), Some(unit));
        }

        occupancy.release(unit, &tiles);
        for tile in &tiles {
            assert_eq!(occupancy.occupant(*tile), None);
        }
    }

    #[test]
    fn release_never_clears_a_foreign_claim() {
        let mut occupancy = Occupancy::new(5, 5);
        let holder = UnitId::new(1);
        let intruder = UnitId::new(2);
        let tile = [TileCoord::new(2, 2)];

        occupancy.claim(holder, &tile);
        occupancy.release(intruder, &tile);

        assert_eq!(occupancy.occupant(tile[0]), Some(holder));
    }

    #[test]
    fn out_of_bounds_tiles_are_ignored() {
        let mut occupancy = Occupancy::new(3, 3);
        let unit = UnitId::new(7);

        occupancy.claim(unit, &[TileCoord::new(-1, 0), TileCoord::new(5, 5)]);
        assert_eq!(occupancy.occupant(TileCoord::new(-1, 0)), None);
        assert!(occupancy.view().is_free(TileCoord::new(0, 0)));
    }
}
