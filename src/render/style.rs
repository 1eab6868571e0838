//! Per-layer fill colors for vector tiles.

use crate::autotile::FillClass;
use crate::color::{level, parse_hex};
use macroquad::color::Color;

const FALLBACK: &str = "#ff00ff";

/// Fill colors derived from a layer color
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStyle {
    /// `#rrggbb` the style was built from
    pub hex: String,
    /// Layer color
    pub base: Color,
    /// 10% darker
    pub shade1: Color,
    /// 20% darker
    pub shade2: Color,
    /// Layer color at half opacity
    pub half: Color,
}

impl LayerStyle {
    /// Style for `hex`; unparsable colors show up magenta
    pub fn from_hex(hex: &str) -> Self {
        let hex = if parse_hex(hex).is_some() { hex } else { FALLBACK };
        let to_color = |h: &str| parse_hex(h).map_or(Color::from_rgba(255, 0, 255, 255), |c| c.to_color());
        let base = to_color(hex);
        LayerStyle {
            hex: hex.to_string(),
            base,
            shade1: to_color(&level(hex, -10)),
            shade2: to_color(&level(hex, -20)),
            half: Color { a: 0.5, ..base },
        }
    }

    /// Color for a shape class
    pub fn fill(&self, class: FillClass) -> Color {
        match class {
            FillClass::Base => self.base,
            FillClass::Shade1 => self.shade1,
            FillClass::Shade2 => self.shade2,
            FillClass::Half => self.half,
        }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        LayerStyle::from_hex(FALLBACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shades_get_darker() {
        let style = LayerStyle::from_hex("#804020");
        assert!(style.shade1.r < style.base.r);
        assert!(style.shade2.r < style.shade1.r);
        assert_eq!(style.half.a, 0.5);
        assert_eq!(style.fill(FillClass::Base), style.base);
    }

    #[test]
    fn bad_hex_falls_back() {
        assert_eq!(LayerStyle::from_hex("green").hex, FALLBACK);
    }
}
