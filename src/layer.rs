//! Noise layers, tile layers and their modifiers.

use crate::grid::Grid;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize};

/// Fewest tile layers a map may have
pub const MIN_LAYERS: usize = 1;
/// Most tile layers a map may have
pub const MAX_LAYERS: usize = 8;

fn default_cutoff() -> f64 {
    -1.0
}
fn default_cutoff_cap() -> f64 {
    1.0
}
fn default_zoom() -> f64 {
    1.0
}
fn default_octaves() -> i32 {
    1
}
fn default_persistence() -> f64 {
    0.5
}
fn default_modifier_rate() -> f64 {
    0.8
}
fn default_color() -> String {
    "#ffffff".to_string()
}

/// Any JSON number is a seed. Fractions in (0, 1) are scaled to 16 bits,
/// others are floored. Negatives wrap.
fn seed_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let mut value = f64::deserialize(deserializer)?;
    if value > 0.0 && value < 1.0 {
        value *= 65536.0;
    }
    Ok(value.floor() as i64 as u32)
}

/// One noise field and the tile layers classified from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NoiseLayer {
    /// Noise seed, 0 means "pick one"
    #[serde(default, deserialize_with = "seed_from_number")]
    pub seed: u32,
    /// Sampling scale across the whole map
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    /// Octave count
    #[serde(default = "default_octaves")]
    pub octaves: i32,
    /// Amplitude falloff per octave
    #[serde(default = "default_persistence")]
    pub persistence: f64,
    /// Layers fed by this field, bottom to top
    #[serde(default)]
    pub tile_layers: Vec<TileLayerSpec>,
}

impl Default for NoiseLayer {
    fn default() -> Self {
        NoiseLayer {
            seed: 0,
            zoom: default_zoom(),
            octaves: default_octaves(),
            persistence: default_persistence(),
            tile_layers: Vec::new(),
        }
    }
}

/// Recipe for a generated tile layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TileLayerSpec {
    /// Tileset name
    #[serde(default)]
    pub tileset: String,
    /// Exclusive lower bound of the noise range
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
    /// Inclusive upper bound of the noise range
    #[serde(default = "default_cutoff_cap")]
    pub cutoff_cap: f64,
    /// Whether the start location may sit on this layer
    #[serde(default)]
    pub can_walk: bool,
    /// `#rrggbb` layer color
    #[serde(default = "default_color")]
    pub color: String,
    /// Post-classification pass
    #[serde(default)]
    pub modifier_name: TileLayerModifier,
    /// Parameter for `modifier_name`
    #[serde(default = "default_modifier_rate")]
    pub modifier_rate: f64,
}

impl Default for TileLayerSpec {
    fn default() -> Self {
        TileLayerSpec {
            tileset: String::new(),
            cutoff: default_cutoff(),
            cutoff_cap: default_cutoff_cap(),
            can_walk: false,
            color: default_color(),
            modifier_name: TileLayerModifier::None,
            modifier_rate: default_modifier_rate(),
        }
    }
}

impl TileLayerSpec {
    /// `cutoff < value <= cutoff_cap`
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.cutoff < value && value <= self.cutoff_cap
    }
}

/// Pass applied to a layer's occupancy after classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileLayerModifier {
    /// Leave the layer as classified
    #[default]
    None,
    /// Drop occupied cells at random, keeping each with probability `rate`
    #[serde(rename = "Random Remove")]
    RandomRemove,
}

impl TileLayerModifier {
    /// Folds a rate outside `[0, 1]` back into range with `|sin(rate)|`
    pub fn constrain_rate(rate: f64) -> f64 {
        if (0.0..=1.0).contains(&rate) {
            rate
        } else {
            rate.sin().abs()
        }
    }

    /// Applies the modifier in place. `seed` makes the result repeatable.
    pub fn apply(self, rate: f64, map: &mut Grid<u8>, seed: u64) {
        match self {
            TileLayerModifier::None => {}
            TileLayerModifier::RandomRemove => {
                let rate = Self::constrain_rate(rate);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                for cell in map.as_mut_slice() {
                    if *cell != 0 && rng.gen::<f64>() > rate {
                        *cell = 0;
                    }
                }
            }
        }
    }
}

/// A live tile layer of a map
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    /// Tileset name
    pub tileset: String,
    /// Whether the start location may sit on this layer
    pub can_walk: bool,
    /// `#rrggbb` layer color
    pub color: String,
    /// Occupancy, 0 or 1 per cell
    pub map: Grid<u8>,
}

impl TileLayer {
    /// Layer of `spec`'s look with every cell set to `fill`
    pub fn from_spec(spec: &TileLayerSpec, size: crate::geom::Xy, fill: u8) -> Self {
        TileLayer {
            tileset: spec.tileset.clone(),
            can_walk: spec.can_walk,
            color: spec.color.clone(),
            map: Grid::new(size, fill),
        }
    }
}

/// Answer of a topmost-layer query at a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileData {
    /// Layer index, -1 when no layer is occupied
    pub layer: i32,
    /// Tileset of that layer
    pub tileset: Option<String>,
    /// Whether that layer is walkable
    pub can_walk: bool,
}

impl TileData {
    /// Nothing at this cell
    pub fn empty() -> Self {
        TileData {
            layer: -1,
            tileset: None,
            can_walk: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Xy;

    #[test]
    fn range_is_open_below_closed_above() {
        let spec = TileLayerSpec {
            cutoff: 0.0,
            cutoff_cap: 0.5,
            ..Default::default()
        };
        assert!(!spec.contains(0.0));
        assert!(spec.contains(0.5));
        assert!(!spec.contains(0.51));
    }

    #[test]
    fn spec_defaults_cover_full_range() {
        let spec: TileLayerSpec = serde_json::from_str(r#"{"Tileset":"Grass"}"#).unwrap();
        assert_eq!(spec.cutoff, -1.0);
        assert_eq!(spec.cutoff_cap, 1.0);
        assert_eq!(spec.modifier_name, TileLayerModifier::None);
        assert!(spec.contains(-0.999) && spec.contains(1.0));
    }

    #[test]
    fn any_number_is_a_seed() {
        let seed = |txt: &str| serde_json::from_str::<NoiseLayer>(txt).unwrap().seed;
        assert_eq!(seed(r#"{"Seed":42}"#), 42);
        assert_eq!(seed(r#"{"Seed":3.7}"#), 3);
        assert_eq!(seed(r#"{"Seed":0.5}"#), 32768);
        assert_eq!(seed(r#"{"Seed":-5}"#), 4_294_967_291);
        assert_eq!(seed(r#"{"Zoom":2}"#), 0);
        assert!(serde_json::from_str::<NoiseLayer>(r#"{"Seed":"x"}"#).is_err());
    }

    #[test]
    fn modifier_name_uses_display_string() {
        let spec: TileLayerSpec =
            serde_json::from_str(r#"{"Tileset":"Rock","ModifierName":"Random Remove"}"#).unwrap();
        assert_eq!(spec.modifier_name, TileLayerModifier::RandomRemove);
    }

    #[test]
    fn random_remove_is_seeded() {
        let mut a = Grid::new(Xy::new(32, 32), 1u8);
        let mut b = a.clone();
        TileLayerModifier::RandomRemove.apply(0.5, &mut a, 9);
        TileLayerModifier::RandomRemove.apply(0.5, &mut b, 9);
        assert_eq!(a, b);
        let kept = a.as_slice().iter().filter(|v| **v == 1).count();
        assert!(kept > 0 && kept < a.len());
    }

    #[test]
    fn out_of_range_rate_is_folded() {
        assert_eq!(TileLayerModifier::constrain_rate(0.3), 0.3);
        let folded = TileLayerModifier::constrain_rate(4.0);
        assert!((0.0..=1.0).contains(&folded));
        assert_eq!(folded, 4.0f64.sin().abs());
    }
}
