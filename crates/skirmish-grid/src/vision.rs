//! Vision radius checks.
//!
//! Vision uses the same taxicab metric as movement, measured between
//! footprints so large units see from their whole edge.

use crate::footprint::Footprint;

/// Returns true if `target` is within `radius` steps of `viewer`.
#[must_use]
pub fn in_vision(viewer: &Footprint, radius: u32, target: &Footprint) -> bool {
    viewer.distance(target) <= radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cell;

    #[test]
    fn radius_is_inclusive() {
        let viewer = Footprint::cell(Cell::new(0, 0));
        assert!(in_vision(&viewer, 3, &Footprint::cell(Cell::new(2, 1))));
        assert!(!in_vision(&viewer, 3, &Footprint::cell(Cell::new(2, 2))));
    }

    #[test]
    fn large_viewer_sees_from_edge() {
        let viewer = Footprint::new(Cell::new(0, 0), 3);
        assert!(in_vision(&viewer, 1, &Footprint::cell(Cell::new(3, 2))));
    }
}
