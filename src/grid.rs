//! Row-major cell storage.

use crate::geom::Xy;

/// Dense row-major 2D grid with bounds-checked access.
///
/// Every lookup goes through [`Grid::index`], so callers never do
/// `x + y * width` arithmetic themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Grid of `size` filled with `fill`. Non-positive sizes give an empty grid.
    pub fn new(size: Xy, fill: T) -> Self {
        let width = size.x.max(0) as usize;
        let height = size.y.max(0) as usize;
        Grid {
            width,
            height,
            data: vec![fill; width * height],
        }
    }

    /// Sets every cell to `value`
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> Grid<T> {
    /// Wraps an existing row-major buffer. `None` when the length does not match.
    pub fn from_vec(size: Xy, data: Vec<T>) -> Option<Self> {
        if size.x < 0 || size.y < 0 || data.len() != size.area() {
            return None;
        }
        Some(Grid {
            width: size.x as usize,
            height: size.y as usize,
            data,
        })
    }

    /// Width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Size as a coordinate
    pub fn size(&self) -> Xy {
        Xy::new(self.width as i32, self.height as i32)
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the grid has no cells
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when `(x, y)` is a cell of this grid
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Flat index of `(x, y)`
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.contains(x, y)
            .then(|| x as usize + y as usize * self.width)
    }

    /// Cell value
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        self.index(x, y).map(|i| &self.data[i])
    }

    /// Writes a cell. Returns false, without writing, when out of range.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: T) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    /// Row-major view of the cells
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable row-major view of the cells
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the grid, returning the row-major buffer
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Copy + Default> Grid<T> {
    /// Cell value, or `T::default()` out of range
    #[inline]
    pub fn value(&self, x: i32, y: i32) -> T {
        self.get(x, y).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_access_is_rejected() {
        let mut g = Grid::new(Xy::new(3, 2), 0u8);
        assert_eq!(g.len(), 6);
        assert!(g.set(2, 1, 7));
        assert_eq!(g.as_slice()[5], 7);
        assert!(!g.set(3, 0, 1));
        assert!(!g.set(-1, 0, 1));
        assert_eq!(g.get(0, 2), None);
        assert_eq!(g.value(10, 10), 0);
    }

    #[test]
    fn negative_size_gives_empty_grid() {
        let g = Grid::new(Xy::new(-5, 10), 1u8);
        assert!(g.is_empty());
        assert_eq!(g.width(), 0);
        assert_eq!(g.height(), 10);
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Grid::from_vec(Xy::new(2, 2), vec![0u8; 3]).is_none());
        let g = Grid::from_vec(Xy::new(2, 2), vec![0u8, 1, 0, 1]).unwrap();
        assert_eq!(g.value(1, 1), 1);
    }
}
