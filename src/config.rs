//! Editor configuration and generation defaults.

use crate::geom::Xy;
use crate::layer::{NoiseLayer, TileLayerModifier, TileLayerSpec};
use crate::map::GenerationRequest;
use crate::tileset::{default_tilesets, Tileset};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Viewport geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ViewportConfig {
    /// Size of one tile in container pixels
    pub tile_pixel_size: Xy,
    /// Half extent of the rendered window, in tiles
    pub max_render_area_size: Xy,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        ViewportConfig {
            tile_pixel_size: Xy::new(64, 64),
            max_render_area_size: Xy::new(19, 10),
        }
    }
}

/// Everything the editor reads at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EditorConfig {
    /// Viewport geometry
    pub viewport: ViewportConfig,
    /// Map generated on startup and on `G`
    pub generation: GenerationRequest,
    /// Preview image size
    pub preview_size: Xy,
    /// Folder holding tileset images
    pub tiles_dir: PathBuf,
    /// Tileset registry
    pub tilesets: Vec<Tileset>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            viewport: ViewportConfig::default(),
            generation: random_map_request(),
            preview_size: Xy::new(256, 256),
            tiles_dir: PathBuf::from("assets/tiles"),
            tilesets: default_tilesets(),
        }
    }
}

impl EditorConfig {
    /// Reads a JSON config; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path)
            .with_context(|| format!("Reading config {}", path.display()))?;
        let config = serde_json::from_str(&txt)
            .with_context(|| format!("Parsing config {}", path.display()))?;
        Ok(config)
    }
}

fn terrain(tileset: &str, color: &str, cutoff: f64, cutoff_cap: f64, can_walk: bool) -> TileLayerSpec {
    TileLayerSpec {
        tileset: tileset.to_string(),
        cutoff,
        cutoff_cap,
        can_walk,
        color: color.to_string(),
        ..TileLayerSpec::default()
    }
}

/// Beach, grass, brick and rock bands
pub fn default_tile_layers() -> Vec<TileLayerSpec> {
    vec![
        terrain("Rough-Md-Edge", "#e6bd28", -0.05, 0.1, true),
        terrain("Sand-Md-Rough", "#e9bb16", -0.02, 0.1, true),
        terrain("Grass-Md-Rough", "#24a326", 0.02, 0.1, true),
        terrain("Grass-Md-Rough", "#49722c", 0.08, 0.18, true),
        terrain("Grass-Md-Rough", "#294c2c", 0.11, 0.14, true),
        terrain("Brick-Md-Smooth", "#72787E", 0.17, 1.0, true),
        terrain("Rock-Wall-Md-Rough", "#949494", 0.16, 1.0, false),
    ]
}

/// 512×512 map, random seed
pub fn random_map_request() -> GenerationRequest {
    GenerationRequest {
        size: Xy::new(512, 512),
        start: Xy::ZERO,
        noise_layers: vec![NoiseLayer {
            seed: 0,
            zoom: 2.0,
            octaves: 8,
            persistence: 0.5,
            tile_layers: default_tile_layers(),
        }],
    }
}

/// Starting values of the generation form: seed 3 and a thinned rock layer
pub fn default_form_request() -> GenerationRequest {
    let mut tile_layers = default_tile_layers();
    if let Some(rock) = tile_layers.last_mut() {
        rock.modifier_name = TileLayerModifier::RandomRemove;
    }
    GenerationRequest {
        size: Xy::new(512, 512),
        start: Xy::new(160, 201),
        noise_layers: vec![NoiseLayer {
            seed: 3,
            zoom: 2.0,
            octaves: 8,
            persistence: 0.5,
            tile_layers,
        }],
    }
}
