//! Orthogonal L-shaped routes.
//!
//! Movement between two cells follows one of two routes: all horizontal steps
//! then all vertical steps, or the reverse. A move is legal when at least one
//! route has every *intermediate* cell clear. The origin and destination are
//! never part of the intermediate set; destination occupancy is the caller's
//! concern.

use serde::{Deserialize, Serialize};

use crate::Cell;

/// Which leg of the L is walked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteShape {
    /// Walk along x, then along y.
    HorizontalFirst,
    /// Walk along y, then along x.
    VerticalFirst,
}

impl RouteShape {
    /// Both shapes, in the order they are tried.
    pub const ALL: [RouteShape; 2] = [RouteShape::HorizontalFirst, RouteShape::VerticalFirst];

    /// Cells strictly between `from` and `to` along this route.
    ///
    /// For a straight-line move both shapes produce the same cells.
    #[must_use]
    pub fn intermediate_cells(self, from: Cell, to: Cell) -> Vec<Cell> {
        let corner = match self {
            RouteShape::HorizontalFirst => Cell::new(to.x, from.y),
            RouteShape::VerticalFirst => Cell::new(from.x, to.y),
        };
        let mut cells = Vec::new();
        walk(from, corner, &mut cells);
        walk(corner, to, &mut cells);
        // `walk` pushes every cell after its start, so the destination is last.
        cells.pop();
        cells
    }
}

/// Pushes every cell after `from` up to and including `to` along one axis.
fn walk(from: Cell, to: Cell, out: &mut Vec<Cell>) {
    let step = (to - from).signum();
    let mut current = from;
    while current != to {
        current += step;
        out.push(current);
    }
}

/// Returns the first route whose intermediate cells are all clear.
///
/// `is_blocked` is asked about every intermediate cell; shapes are tried in
/// [`RouteShape::ALL`] order.
pub fn first_clear_route(
    from: Cell,
    to: Cell,
    mut is_blocked: impl FnMut(Cell) -> bool,
) -> Option<RouteShape> {
    RouteShape::ALL.into_iter().find(|shape| {
        shape
            .intermediate_cells(from, to)
            .into_iter()
            .all(|cell| !is_blocked(cell))
    })
}
