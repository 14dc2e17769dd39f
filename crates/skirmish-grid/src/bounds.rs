//! Rectangular map bounds.

use serde::{Deserialize, Serialize};

use crate::footprint::Footprint;
use crate::Cell;

/// Width and height of the battle grid. Valid cells are `0..width` × `0..height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBounds {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl GridBounds {
    /// Creates bounds for a `width` × `height` grid.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if the cell lies on the grid.
    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && cell.x.unsigned_abs() < self.width
            && cell.y.unsigned_abs() < self.height
    }

    /// Returns true if every cell of the footprint lies on the grid.
    #[must_use]
    pub fn contains_footprint(&self, footprint: &Footprint) -> bool {
        self.contains(footprint.origin) && self.contains(footprint.far_corner())
    }

    /// Iterates over every cell of the grid in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let width = i32::try_from(self.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.height).unwrap_or(i32::MAX);
        (0..height).flat_map(move |y| (0..width).map(move |x| Cell::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_edges() {
        let bounds = GridBounds::new(4, 3);
        assert!(bounds.contains(Cell::new(0, 0)));
        assert!(bounds.contains(Cell::new(3, 2)));
        assert!(!bounds.contains(Cell::new(4, 2)));
        assert!(!bounds.contains(Cell::new(3, 3)));
        assert!(!bounds.contains(Cell::new(-1, 0)));
    }

    #[test]
    fn footprint_must_fit_entirely() {
        let bounds = GridBounds::new(4, 4);
        assert!(bounds.contains_footprint(&Footprint::new(Cell::new(2, 2), 2)));
        assert!(!bounds.contains_footprint(&Footprint::new(Cell::new(3, 2), 2)));
    }

    #[test]
    fn cells_covers_whole_grid() {
        let bounds = GridBounds::new(3, 2);
        let cells: Vec<_> = bounds.cells().collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], Cell::new(0, 0));
        assert_eq!(cells[5], Cell::new(2, 1));
    }
}
