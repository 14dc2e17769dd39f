//! # Skirmish Grid
//!
//! Grid substrate for the Skirmish battle engine.
//!
//! The battle map is a rectangular grid of integer cells. This crate owns the
//! purely spatial questions the rules engine asks:
//!
//! - **Bounds**: is a cell (or a whole unit footprint) on the map?
//! - **Footprints**: which cells does an N×N unit cover, and how far apart are
//!   two footprints?
//! - **Obstacles**: the layout supplied by the map generator, and which cells
//!   it currently blocks.
//! - **Routes**: the two orthogonal L-shaped routes between two cells.
//! - **Vision**: whether a cell lies inside a viewer's vision radius.
//!
//! Nothing here knows about units, owners or turns.
//!
//! ## Quick Start
//!
//! ```
//! use skirmish_grid::{manhattan, Cell, GridBounds, RouteShape};
//!
//! let bounds = GridBounds::new(8, 8);
//! let from = Cell::new(0, 0);
//! let to = Cell::new(3, 2);
//!
//! assert!(bounds.contains(to));
//! assert_eq!(manhattan(from, to), 5);
//!
//! // Intermediate cells of the horizontal-first route
//! let cells = RouteShape::HorizontalFirst.intermediate_cells(from, to);
//! assert_eq!(cells.len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bounds;
pub mod footprint;
pub mod obstacle;
pub mod route;
pub mod vision;

pub use bounds::GridBounds;
pub use footprint::Footprint;
pub use obstacle::{Obstacle, ObstacleError, ObstacleId, ObstacleLayout, StrikeOutcome};
pub use route::{first_clear_route, RouteShape};
pub use vision::in_vision;

/// A single grid cell. `x` grows to the right, `y` grows downwards.
pub type Cell = glam::IVec2;

/// Manhattan (taxicab) distance between two cells.
///
/// # Example
///
/// ```
/// use skirmish_grid::{manhattan, Cell};
///
/// assert_eq!(manhattan(Cell::new(1, 1), Cell::new(4, -1)), 5);
/// ```
#[must_use]
pub fn manhattan(a: Cell, b: Cell) -> u32 {
    let d = (a - b).abs();
    d.x.unsigned_abs() + d.y.unsigned_abs()
}

/// The four orthogonal neighbours of a cell, in a fixed order (E, W, S, N).
#[must_use]
pub fn neighbors(cell: Cell) -> [Cell; 4] {
    [
        cell + Cell::new(1, 0),
        cell + Cell::new(-1, 0),
        cell + Cell::new(0, 1),
        cell + Cell::new(0, -1),
    ]
}
