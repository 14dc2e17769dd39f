//! N×N unit footprints.
//!
//! A unit of size `N` anchored at `origin` covers the square
//! `origin.x..origin.x + N` × `origin.y..origin.y + N`. Size-1 units cover
//! exactly their anchor cell, so every footprint rule degrades to the plain
//! cell rule for them.

use serde::{Deserialize, Serialize};

use crate::Cell;

/// The square of cells covered by a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    /// Top-left (minimum) cell.
    pub origin: Cell,
    /// Edge length in cells. Always at least 1.
    pub size: u32,
}

impl Footprint {
    /// Creates a footprint; a size of 0 is treated as 1.
    #[must_use]
    pub fn new(origin: Cell, size: u32) -> Self {
        Self {
            origin,
            size: size.max(1),
        }
    }

    /// Single-cell footprint.
    #[must_use]
    pub fn cell(origin: Cell) -> Self {
        Self::new(origin, 1)
    }

    /// The same footprint moved to a new anchor.
    #[must_use]
    pub fn at(&self, origin: Cell) -> Self {
        Self::new(origin, self.size)
    }

    /// Bottom-right (maximum) cell, inclusive.
    #[must_use]
    pub fn far_corner(&self) -> Cell {
        let extent = i32::try_from(self.size).unwrap_or(i32::MAX) - 1;
        self.origin + Cell::splat(extent)
    }

    /// Returns true if the cell lies inside the footprint.
    #[must_use]
    pub fn covers(&self, cell: Cell) -> bool {
        let far = self.far_corner();
        cell.x >= self.origin.x && cell.x <= far.x && cell.y >= self.origin.y && cell.y <= far.y
    }

    /// Returns true if the two footprints share at least one cell.
    #[must_use]
    pub fn overlaps(&self, other: &Footprint) -> bool {
        self.distance(other) == 0
    }

    /// Manhattan distance between the closest cells of two footprints.
    ///
    /// Overlapping footprints are at distance 0; edge-adjacent footprints are
    /// at distance 1. Diagonal contact is distance 2.
    #[must_use]
    pub fn distance(&self, other: &Footprint) -> u32 {
        let (a_far, b_far) = (self.far_corner(), other.far_corner());
        axis_distance(self.origin.x, a_far.x, other.origin.x, b_far.x)
            + axis_distance(self.origin.y, a_far.y, other.origin.y, b_far.y)
    }

    /// Returns true if the footprints touch edge to edge.
    #[must_use]
    pub fn is_adjacent(&self, other: &Footprint) -> bool {
        self.distance(other) == 1
    }

    /// Iterates over every covered cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let size = i32::try_from(self.size).unwrap_or(i32::MAX);
        let origin = self.origin;
        (0..size).flat_map(move |dy| (0..size).map(move |dx| origin + Cell::new(dx, dy)))
    }
}

/// Distance between two closed intervals on one axis; 0 when they intersect.
fn axis_distance(a_min: i32, a_max: i32, b_min: i32, b_max: i32) -> u32 {
    if b_min > a_max {
        (b_min - a_max).unsigned_abs()
    } else if a_min > b_max {
        (a_min - b_max).unsigned_abs()
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manhattan;
    use proptest::prelude::*;

    #[test]
    fn single_cells_match_manhattan() {
        let a = Footprint::cell(Cell::new(0, 0));
        let b = Footprint::cell(Cell::new(0, 1));
        let c = Footprint::cell(Cell::new(2, 3));
        assert_eq!(a.distance(&b), 1);
        assert_eq!(a.distance(&c), 5);
        assert!(a.is_adjacent(&b));
        assert!(!a.is_adjacent(&c));
    }

    #[test]
    fn large_footprint_adjacency() {
        let big = Footprint::new(Cell::new(2, 2), 2);
        assert!(big.is_adjacent(&Footprint::cell(Cell::new(4, 3))));
        assert!(big.is_adjacent(&Footprint::cell(Cell::new(2, 1))));
        // Diagonal corner contact is not adjacency.
        assert_eq!(big.distance(&Footprint::cell(Cell::new(4, 4))), 2);
    }

    #[test]
    fn overlap_and_cover() {
        let big = Footprint::new(Cell::new(1, 1), 3);
        assert!(big.covers(Cell::new(3, 3)));
        assert!(!big.covers(Cell::new(4, 3)));
        assert!(big.overlaps(&Footprint::cell(Cell::new(2, 2))));
        assert_eq!(big.distance(&Footprint::cell(Cell::new(2, 2))), 0);
        assert_eq!(big.cells().count(), 9);
    }

    #[test]
    fn zero_size_is_one() {
        assert_eq!(Footprint::new(Cell::ZERO, 0).size, 1);
    }

    proptest! {
        #[test]
        fn unit_footprint_distance_is_manhattan(
            ax in -20i32..20, ay in -20i32..20, bx in -20i32..20, by in -20i32..20
        ) {
            let a = Cell::new(ax, ay);
            let b = Cell::new(bx, by);
            prop_assert_eq!(Footprint::cell(a).distance(&Footprint::cell(b)), manhattan(a, b));
        }
    }
}
