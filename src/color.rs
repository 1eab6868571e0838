//! Hex / RGBA / HSLA helpers used for layer styles and raster recoloring.

use macroquad::color::Color;
use macroquad::texture::Image;

/// 8-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

/// Hue in degrees `[0, 360)`, saturation, lightness and alpha in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsla {
    /// Hue
    pub h: f32,
    /// Saturation
    pub s: f32,
    /// Lightness
    pub l: f32,
    /// Alpha
    pub a: f32,
}

/// Parses `#rrggbb` (leading `#` optional). Alpha is 255.
pub fn parse_hex(hex: &str) -> Option<Rgba> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Rgba {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
        a: 255,
    })
}

/// Multiplies each channel by `(100 + percent) / 100`, floored and clamped to
/// `[0, 255]`. Input that is not a hex color is returned unchanged.
pub fn level(hex: &str, percent: i32) -> String {
    let Some(c) = parse_hex(hex) else {
        return hex.to_string();
    };
    let adjust = |v: u8| -> u8 {
        let scaled = (f64::from(v) * f64::from(100 + percent) / 100.0).floor();
        scaled.clamp(0.0, 255.0).round() as u8
    };
    Rgba {
        r: adjust(c.r),
        g: adjust(c.g),
        b: adjust(c.b),
        a: c.a,
    }
    .to_hex()
}

/// Black or white, whichever reads better on top of `hex`
pub fn contrast(hex: &str) -> &'static str {
    parse_hex(hex).map(|c| c.contrast()).unwrap_or("#ffffff")
}

impl Rgba {
    /// Opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 255 }
    }

    /// `#rrggbb`, lowercase
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `#000000` on light colors, `#ffffff` on dark ones
    pub fn contrast(&self) -> &'static str {
        let sum = ((u32::from(self.r) * 299 + u32::from(self.g) * 587 + u32::from(self.b) * 114)
            as f64
            / 1000.0)
            .round();
        if sum > 128.0 {
            "#000000"
        } else {
            "#ffffff"
        }
    }

    /// Macroquad color
    pub fn to_color(&self) -> Color {
        Color::from_rgba(self.r, self.g, self.b, self.a)
    }

    /// HSLA equivalent
    pub fn to_hsla(&self) -> Hsla {
        let r = f32::from(self.r) / 255.0;
        let g = f32::from(self.g) / 255.0;
        let b = f32::from(self.b) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let a = f32::from(self.a) / 255.0;

        if max == min {
            return Hsla { h: 0.0, s: 0.0, l, a };
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        Hsla { h: h * 60.0, s, l, a }
    }
}

impl Hsla {
    /// RGBA equivalent
    pub fn to_rgba(&self) -> Rgba {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let a = to_u8(self.a);

        if self.s == 0.0 {
            let v = to_u8(self.l);
            return Rgba { r: v, g: v, b: v, a };
        }

        let l = self.l.clamp(0.0, 1.0);
        let s = self.s.clamp(0.0, 1.0);
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let h = self.h.rem_euclid(360.0) / 360.0;

        Rgba {
            r: to_u8(hue_to_rgb(p, q, h + 1.0 / 3.0)),
            g: to_u8(hue_to_rgb(p, q, h)),
            b: to_u8(hue_to_rgb(p, q, h - 1.0 / 3.0)),
            a,
        }
    }
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Tints `pixel` toward `target`: hue and saturation come from the target,
/// lightness is the pixel's shifted by `target.l - 0.5`, alpha is kept.
pub fn target_hsla(pixel: Rgba, target: Hsla) -> Rgba {
    let source = pixel.to_hsla();
    let mut out = Hsla {
        h: target.h,
        s: target.s,
        l: (source.l + (target.l - 0.5)).clamp(0.0, 1.0),
        a: source.a,
    }
    .to_rgba();
    out.a = pixel.a;
    out
}

/// Recolors every non-transparent pixel of an RGBA8 image in place
pub fn recolor_image(image: &mut Image, target: Hsla) {
    for px in image.bytes.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        let out = target_hsla(
            Rgba {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            },
            target,
        );
        px[0] = out.r;
        px[1] = out.g;
        px[2] = out.b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_halves_each_channel() {
        assert_eq!(level("#804020", -50), "#402010");
    }

    #[test]
    fn level_clamps_to_white() {
        assert_eq!(level("#f0f0f0", 50), "#ffffff");
        assert_eq!(level("#102030", -200), "#000000");
        assert_eq!(level("not a color", 10), "not a color");
    }

    #[test]
    fn contrast_picks_readable_text() {
        assert_eq!(contrast("#FFFFFF"), "#000000");
        assert_eq!(contrast("#000000"), "#ffffff");
    }

    #[test]
    fn hsla_conversion_is_reversible() {
        for hex in ["#e6bd28", "#24a326", "#72787e", "#000000", "#ffffff", "#023e58"] {
            let rgba = parse_hex(hex).unwrap();
            let back = rgba.to_hsla().to_rgba();
            for (a, b) in [(back.r, rgba.r), (back.g, rgba.g), (back.b, rgba.b)] {
                assert!(a.abs_diff(b) <= 1, "{hex}: {back:?}");
            }
        }
    }

    #[test]
    fn recolor_skips_transparent_pixels() {
        let mut image = Image {
            bytes: vec![128, 128, 128, 255, 10, 20, 30, 0],
            width: 2,
            height: 1,
        };
        let target = parse_hex("#24a326").unwrap().to_hsla();
        recolor_image(&mut image, target);
        assert_eq!(&image.bytes[4..8], &[10, 20, 30, 0]);
        let tinted = Rgba {
            r: image.bytes[0],
            g: image.bytes[1],
            b: image.bytes[2],
            a: image.bytes[3],
        };
        assert!(tinted.g > tinted.r && tinted.g > tinted.b);
        assert_eq!(tinted.a, 255);
    }
}
