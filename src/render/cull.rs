//! Visible window computation.

use crate::geom::{Xy, XyMinMax};

/// Cells to render around `center`.
///
/// The window reaches `half_extent` cells each way and is clamped to
/// `[0, size - 2]`: the last row and column are never drawn because each tile
/// also covers the cell to its right and below.
pub fn visible_window(center: Xy, half_extent: Xy, map_size: Xy) -> XyMinMax {
    XyMinMax {
        min: Xy::new(
            (center.x - half_extent.x).max(0),
            (center.y - half_extent.y).max(0),
        ),
        max: Xy::new(
            (center.x + half_extent.x).min(map_size.x - 2),
            (center.y + half_extent.y).min(map_size.y - 2),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_clamped_to_map() {
        let w = visible_window(Xy::new(3, 50), Xy::new(19, 10), Xy::new(100, 55));
        assert_eq!(w.min, Xy::new(0, 40));
        assert_eq!(w.max, Xy::new(22, 53));
    }

    #[test]
    fn window_inside_map_is_symmetric() {
        let w = visible_window(Xy::new(50, 50), Xy::new(19, 10), Xy::new(512, 512));
        assert_eq!(w.min, Xy::new(31, 40));
        assert_eq!(w.max, Xy::new(69, 60));
        assert_eq!(w.cells().count(), 39 * 21);
    }

    #[test]
    fn tiny_map_gives_empty_window() {
        let w = visible_window(Xy::new(0, 0), Xy::new(19, 10), Xy::new(1, 1));
        assert_eq!(w.cells().count(), 0);
    }
}
