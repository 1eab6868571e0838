//! Dual-grid autotile addressing.
//!
//! Each displayed tile straddles a 2×2 block of map cells. Which of those four
//! cells are occupied is packed into a [`NeighborCode`], and the code picks the
//! tile out of a 16 entry atlas.

use macroquad::math::Rect;
use std::fmt;

const TL: u8 = 0b1000;
const TR: u8 = 0b0100;
const BL: u8 = 0b0010;
const BR: u8 = 0b0001;

/// Occupancy of the 2×2 block under a tile.
///
/// The string form is `TL TR BL BR`, i.e. `occ(x,y) occ(x+1,y) occ(x,y+1) occ(x+1,y+1)`,
/// and the numeric value is that string read as binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NeighborCode(u8);

impl NeighborCode {
    /// `0000`, nothing to draw
    pub const EMPTY: NeighborCode = NeighborCode(0);
    /// `1111`, fully solid
    pub const SOLID: NeighborCode = NeighborCode(0b1111);

    /// Code from the four corner occupancies
    #[inline]
    pub const fn from_corners(tl: bool, tr: bool, bl: bool, br: bool) -> Self {
        NeighborCode((tl as u8) << 3 | (tr as u8) << 2 | (bl as u8) << 1 | br as u8)
    }

    /// Code from its numeric value; bits above the low four are dropped
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        NeighborCode(bits & 0b1111)
    }

    /// Numeric value, `0..=15`
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True for `0000`
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True for `1111`
    #[inline]
    pub const fn is_solid(self) -> bool {
        self.0 == 0b1111
    }

    /// Parses a 4 character `0`/`1` string
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 4 || !s.bytes().all(|b| b == b'0' || b == b'1') {
            return None;
        }
        u8::from_str_radix(s, 2).ok().map(NeighborCode)
    }

    /// Position of this code in [`TILE_INDEX`]
    pub fn atlas_index(self) -> usize {
        TILE_INDEX
            .iter()
            .position(|c| *c == self)
            .unwrap_or(EMPTY_ATLAS_SLOT)
    }

    /// `(column, row)` of this code on a sheet [`ATLAS_COLUMNS`] tiles wide
    pub fn atlas_cell(self) -> (u32, u32) {
        let i = self.atlas_index() as u32;
        (i % ATLAS_COLUMNS, i / ATLAS_COLUMNS)
    }

    #[inline]
    fn has(self, corner: u8) -> bool {
        self.0 & corner != 0
    }
}

impl fmt::Display for NeighborCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04b}", self.0)
    }
}

/// Tiles per row in a dual-grid sheet
pub const ATLAS_COLUMNS: u32 = 4;

const EMPTY_ATLAS_SLOT: usize = 12;

/// Order of the tiles in a dual-grid atlas, read row-major from a 4×4 sheet.
pub const TILE_INDEX: [NeighborCode; 16] = [
    NeighborCode(0b0010),
    NeighborCode(0b0101),
    NeighborCode(0b1011),
    NeighborCode(0b0011),
    NeighborCode(0b1001),
    NeighborCode(0b0111),
    NeighborCode(0b1111),
    NeighborCode(0b1110),
    NeighborCode(0b0100),
    NeighborCode(0b1100),
    NeighborCode(0b1101),
    NeighborCode(0b1010),
    NeighborCode(0b0000),
    NeighborCode(0b0001),
    NeighborCode(0b0110),
    NeighborCode(0b1000),
];

/// Style class of a vector shape, resolved against the layer colors at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillClass {
    /// Layer color
    Base,
    /// 10% darker
    Shade1,
    /// 20% darker
    Shade2,
    /// Layer color at 50% opacity
    Half,
}

/// Filled rectangle in unit tile coordinates (`0..1` on both axes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorShape {
    /// Area covered
    pub rect: Rect,
    /// Fill
    pub fill: FillClass,
}

const EDGE: f32 = 0.08;

/// Shapes making up the vector tile for `code`.
///
/// Occupied quarters are filled with the base color. With `edged`, borders
/// between occupied and empty quarters get a darker rim and the quarter below
/// an occupied one gets a translucent shadow.
pub fn vector_shapes(code: NeighborCode, edged: bool) -> Vec<VectorShape> {
    let quarters = [
        (TL, 0.0, 0.0),
        (TR, 0.5, 0.0),
        (BL, 0.0, 0.5),
        (BR, 0.5, 0.5),
    ];
    let mut shapes = Vec::new();

    for &(corner, qx, qy) in &quarters {
        if code.has(corner) {
            shapes.push(VectorShape {
                rect: Rect::new(qx, qy, 0.5, 0.5),
                fill: FillClass::Base,
            });
        }
    }

    if !edged {
        return shapes;
    }

    for &(corner, qx, qy) in &quarters {
        if !code.has(corner) {
            continue;
        }
        let (beside, below) = match corner {
            TL => (TR, BL),
            TR => (TL, BR),
            BL => (BR, TL),
            _ => (BL, TR),
        };
        if !code.has(beside) {
            let x = if qx == 0.0 { 0.5 - EDGE } else { 0.5 };
            shapes.push(VectorShape {
                rect: Rect::new(x, qy, EDGE, 0.5),
                fill: FillClass::Shade2,
            });
        }
        if !code.has(below) {
            // top quarters have their open side at the bottom and vice versa
            if qy == 0.0 {
                shapes.push(VectorShape {
                    rect: Rect::new(qx, 0.5 - EDGE, 0.5, EDGE),
                    fill: FillClass::Shade1,
                });
                shapes.push(VectorShape {
                    rect: Rect::new(qx, 0.5, 0.5, EDGE * 2.0),
                    fill: FillClass::Half,
                });
            } else {
                shapes.push(VectorShape {
                    rect: Rect::new(qx, 0.5, 0.5, EDGE),
                    fill: FillClass::Shade1,
                });
            }
        }
    }

    shapes
}
