//! Integer cell coordinates.

use macroquad::math::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Integer coordinate, used for map cells and sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Xy {
    /// Horizontal
    pub x: i32,
    /// Vertical
    pub y: i32,
}

impl Xy {
    /// `(0, 0)`
    pub const ZERO: Xy = Xy { x: 0, y: 0 };

    /// New coordinate
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Xy { x, y }
    }

    /// Coordinate moved by `(dx, dy)`
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Xy {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Number of cells covered when used as a size; negative sizes count as 0.
    #[inline]
    pub fn area(self) -> usize {
        self.x.max(0) as usize * self.y.max(0) as usize
    }

    /// As a float vector
    #[inline]
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

impl From<IVec2> for Xy {
    fn from(v: IVec2) -> Self {
        Xy::new(v.x, v.y)
    }
}

impl From<Xy> for IVec2 {
    fn from(v: Xy) -> Self {
        IVec2::new(v.x, v.y)
    }
}

impl Add for Xy {
    type Output = Xy;
    fn add(self, rhs: Xy) -> Xy {
        self.offset(rhs.x, rhs.y)
    }
}

impl Sub for Xy {
    type Output = Xy;
    fn sub(self, rhs: Xy) -> Xy {
        Xy {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
        }
    }
}

/// Inclusive rectangle of map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XyMinMax {
    /// Top left (inclusive)
    pub min: Xy,
    /// Bottom right (inclusive)
    pub max: Xy,
}

impl XyMinMax {
    /// True when `c` lies inside the rectangle
    #[inline]
    pub fn contains(&self, c: Xy) -> bool {
        c.x >= self.min.x && c.x <= self.max.x && c.y >= self.min.y && c.y <= self.max.y
    }

    /// Row-major iterator over every coordinate in the rectangle
    pub fn cells(&self) -> impl Iterator<Item = Xy> + '_ {
        (self.min.y..=self.max.y)
            .flat_map(move |y| (self.min.x..=self.max.x).map(move |x| Xy::new(x, y)))
    }
}
