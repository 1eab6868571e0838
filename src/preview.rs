//! Low resolution preview of a generation request.

use crate::color::parse_hex;
use crate::geom::Xy;
use crate::map::GenerationRequest;
use crate::noise_gen::NoiseGenerator;
use macroquad::math::Vec2;
use macroquad::texture::Image;

/// Color of cells no tile layer claims
pub const WATER: &str = "#023e58";

/// Placement of an image of one size inside a box of another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleToFit {
    /// Aspect ratio of the longer side over the shorter, 1 on the other axis
    pub ratio: Vec2,
    /// Per-axis display scale of the image
    pub scale: Vec2,
    /// Image size in pixels
    pub size: Xy,
    /// Offset that centers the scaled image
    pub margin: Vec2,
}

/// Fits `input` into `target` without distorting it.
///
/// Sides that fit are kept and shrunk by the tighter of the two cross ratios;
/// sides that overflow are clamped to the target and the shorter one is
/// scaled by its aspect ratio.
pub fn scale_to_fit(input: Xy, target: Xy) -> ScaleToFit {
    if input.x <= 0 || input.y <= 0 {
        return ScaleToFit {
            ratio: Vec2::ONE,
            scale: Vec2::ZERO,
            size: Xy::ZERO,
            margin: target.as_vec2() / 2.0,
        };
    }

    let input_f = input.as_vec2();
    let target_f = target.as_vec2();
    let aspect = Vec2::new(input_f.x / input_f.y, input_f.y / input_f.x);
    let scale_min = f32::min(target_f.x / input_f.y, target_f.y / input_f.x);

    let mut size = target;
    let mut scale = Vec2::ONE;

    if input.x <= target.x {
        size.x = input.x;
        scale.x = scale_min;
    } else if input.x <= input.y {
        scale.x = aspect.x;
    }

    if input.y <= target.y {
        size.y = input.y;
        scale.y = scale_min;
    } else if input.y <= input.x {
        scale.y = aspect.y;
    }

    let ratio = Vec2::new(
        if aspect.x > aspect.y { aspect.x } else { 1.0 },
        if aspect.y > aspect.x { aspect.y } else { 1.0 },
    );
    let margin = (target_f - scale * size.as_vec2()) / 2.0;

    ScaleToFit {
        ratio,
        scale,
        size,
        margin,
    }
}

/// Renders one pixel per preview cell with the same noise evaluation as
/// generation. Noise layers without a fixed seed are skipped.
pub fn render_preview(request: &GenerationRequest, preview_size: Xy, noise: &mut NoiseGenerator) -> Image {
    let fit = scale_to_fit(request.size, preview_size);
    let width = fit.size.x.clamp(0, i32::from(u16::MAX)) as u16;
    let height = fit.size.y.clamp(0, i32::from(u16::MAX)) as u16;
    let water = hex_bytes(WATER);
    let mut image = Image {
        bytes: water.repeat(usize::from(width) * usize::from(height)),
        width,
        height,
    };

    for noise_layer in &request.noise_layers {
        if noise_layer.seed == 0 {
            continue;
        }
        noise.seed(noise_layer.seed);

        let colors: Vec<[u8; 4]> = noise_layer
            .tile_layers
            .iter()
            .map(|t| hex_bytes(&t.color))
            .collect();

        for y in 0..height {
            for x in 0..width {
                let value = noise.sample_2d_octaves(
                    f64::from(x) / f64::from(width) * noise_layer.zoom,
                    f64::from(y) / f64::from(height) * noise_layer.zoom,
                    noise_layer.octaves,
                    noise_layer.persistence,
                );
                // topmost layer in range wins
                let hit = noise_layer
                    .tile_layers
                    .iter()
                    .rposition(|t| t.contains(value));
                if let Some(i) = hit {
                    let cell = (y as usize * width as usize + x as usize) * 4;
                    image.bytes[cell..cell + 4].copy_from_slice(&colors[i]);
                }
            }
        }
    }
    image
}

fn hex_bytes(hex: &str) -> [u8; 4] {
    parse_hex(hex).map_or([0, 0, 0, 255], |c| [c.r, c.g, c.b, c.a])
}

/// Position of the start marker inside the preview box
pub fn start_to_preview(start: Xy, map_size: Xy, fit: &ScaleToFit) -> Vec2 {
    if map_size.x <= 0 || map_size.y <= 0 {
        return fit.margin;
    }
    start.as_vec2() * fit.scale * (fit.size.as_vec2() / map_size.as_vec2()) + fit.margin
}

/// Map cell under a point of the preview box, `None` outside the image
pub fn preview_to_start(point: Vec2, map_size: Xy, preview_size: Xy, fit: &ScaleToFit) -> Option<Xy> {
    let target = preview_size.as_vec2();
    let inside = point.x > fit.margin.x
        && point.x < target.x - fit.margin.x
        && point.y > fit.margin.y
        && point.y < target.y - fit.margin.y;
    if !inside || fit.size.x <= 0 || fit.size.y <= 0 || fit.scale.x <= 0.0 || fit.scale.y <= 0.0 {
        return None;
    }
    let cell = (point - fit.margin) * (map_size.as_vec2() / fit.size.as_vec2()) / fit.scale;
    Some(Xy::new(cell.x.floor() as i32, cell.y.floor() as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{NoiseLayer, TileLayerSpec};

    #[test]
    fn wide_input_is_letterboxed() {
        let fit = scale_to_fit(Xy::new(1024, 512), Xy::new(256, 256));
        assert_eq!(fit.scale, Vec2::new(1.0, 0.5));
        assert_eq!(fit.size, Xy::new(256, 256));
        assert_eq!(fit.margin, Vec2::new(0.0, 64.0));
        assert_eq!(fit.ratio, Vec2::new(2.0, 1.0));

        // equal bands above and below, no stretching
        let shown = fit.scale * fit.size.as_vec2();
        assert_eq!(fit.margin.y * 2.0 + shown.y, 256.0);
        assert_eq!(shown.x / shown.y, 2.0);
    }

    #[test]
    fn square_input_fills_target() {
        let fit = scale_to_fit(Xy::new(512, 512), Xy::new(256, 256));
        assert_eq!(fit.scale, Vec2::ONE);
        assert_eq!(fit.margin, Vec2::ZERO);
    }

    #[test]
    fn degenerate_input_is_empty() {
        let fit = scale_to_fit(Xy::new(0, 10), Xy::new(256, 256));
        assert_eq!(fit.size, Xy::ZERO);
        assert_eq!(preview_to_start(Vec2::new(128.0, 128.0), Xy::new(0, 10), Xy::new(256, 256), &fit), None);
    }

    #[test]
    fn start_marker_round_trips() {
        let map = Xy::new(1024, 512);
        let target = Xy::new(256, 256);
        let fit = scale_to_fit(map, target);
        let start = Xy::new(160, 201);
        let p = start_to_preview(start, map, &fit);
        let back = preview_to_start(p + Vec2::splat(0.01), map, target, &fit).unwrap();
        assert_eq!(back, start);
        assert_eq!(preview_to_start(Vec2::new(10.0, 10.0), map, target, &fit), None);
    }

    #[test]
    fn unclaimed_pixels_are_water() {
        let request = GenerationRequest {
            size: Xy::new(64, 64),
            start: Xy::ZERO,
            noise_layers: vec![NoiseLayer {
                seed: 7,
                tile_layers: vec![TileLayerSpec {
                    cutoff: 2.0,
                    cutoff_cap: 3.0,
                    ..Default::default()
                }],
                ..Default::default()
            }],
        };
        let image = render_preview(&request, Xy::new(256, 256), &mut NoiseGenerator::new(1));
        assert_eq!((image.width, image.height), (64, 64));
        assert!(image.bytes.chunks_exact(4).all(|px| px == [2, 62, 88, 255]));
    }

    #[test]
    fn full_range_layer_covers_everything() {
        let request = GenerationRequest {
            size: Xy::new(32, 32),
            start: Xy::ZERO,
            noise_layers: vec![NoiseLayer {
                seed: 7,
                tile_layers: vec![TileLayerSpec {
                    color: "#ff0000".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            }],
        };
        let image = render_preview(&request, Xy::new(256, 256), &mut NoiseGenerator::new(1));
        assert!(image.bytes.chunks_exact(4).all(|px| px == [255, 0, 0, 255]));
    }
}
